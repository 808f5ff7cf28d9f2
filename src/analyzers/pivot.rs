//! Two-axis projection of a value field.

use std::collections::BTreeMap;

use crate::record::Scored;

/// A sparse row-key × column-key matrix of aggregated values.
///
/// Missing cells mean "no contributing record" and are distinct from zero:
/// [`PivotTable::get`] returns `None` for them. Axis keys are held in
/// ascending order unless a restriction imposes an explicit order.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable<R, C> {
    row_keys: Vec<R>,
    col_keys: Vec<C>,
    cells: BTreeMap<(R, C), f64>,
}

impl<R, C> Default for PivotTable<R, C>
where
    R: Ord + Clone,
    C: Ord + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<R, C> PivotTable<R, C>
where
    R: Ord + Clone,
    C: Ord + Clone,
{
    pub fn new() -> Self {
        PivotTable {
            row_keys: Vec::new(),
            col_keys: Vec::new(),
            cells: BTreeMap::new(),
        }
    }

    /// Sets a cell, registering its axis keys in sorted position.
    pub fn set(&mut self, row: R, col: C, value: f64) {
        if let Err(pos) = self.row_keys.binary_search(&row) {
            self.row_keys.insert(pos, row.clone());
        }
        if let Err(pos) = self.col_keys.binary_search(&col) {
            self.col_keys.insert(pos, col.clone());
        }
        self.cells.insert((row, col), value);
    }

    /// Cell value, or `None` when no record contributed to it.
    pub fn get(&self, row: &R, col: &C) -> Option<f64> {
        self.cells.get(&(row.clone(), col.clone())).copied()
    }

    pub fn row_keys(&self) -> &[R] {
        &self.row_keys
    }

    pub fn col_keys(&self) -> &[C] {
        &self.col_keys
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Narrows the table to an explicit column list, preserving the
    /// caller-supplied order exactly rather than natural sort order.
    ///
    /// Named columns with no data are kept as empty columns.
    pub fn restrict_columns(&self, cols: &[C]) -> PivotTable<R, C> {
        let cells = self
            .cells
            .iter()
            .filter(|((_, c), _)| cols.contains(c))
            .map(|(k, v)| (k.clone(), *v))
            .collect();

        PivotTable {
            row_keys: self.row_keys.clone(),
            col_keys: cols.to_vec(),
            cells,
        }
    }

    /// Present cells as `(row, col, value)` triples in row-major axis order.
    /// Flattening recovers exactly the aggregated values that were set.
    pub fn flatten(&self) -> Vec<(R, C, f64)> {
        let mut out = Vec::new();
        for row in &self.row_keys {
            for col in &self.col_keys {
                if let Some(value) = self.get(row, col) {
                    out.push((row.clone(), col.clone(), value));
                }
            }
        }
        out
    }

    /// Divides every cell by its column total. Columns whose total is zero
    /// are left untouched rather than filled with NaN.
    pub fn normalize_columns(&self) -> PivotTable<R, C> {
        let mut totals: BTreeMap<&C, f64> = BTreeMap::new();
        for ((_, col), value) in &self.cells {
            *totals.entry(col).or_default() += value;
        }

        let cells = self
            .cells
            .iter()
            .map(|((row, col), value)| {
                let total = totals[col];
                let scaled = if total == 0.0 { *value } else { value / total };
                ((row.clone(), col.clone()), scaled)
            })
            .collect();

        PivotTable {
            row_keys: self.row_keys.clone(),
            col_keys: self.col_keys.clone(),
            cells,
        }
    }

    /// Divides every cell by its row total. Rows whose total is zero are
    /// left untouched.
    pub fn normalize_rows(&self) -> PivotTable<R, C> {
        let mut totals: BTreeMap<&R, f64> = BTreeMap::new();
        for ((row, _), value) in &self.cells {
            *totals.entry(row).or_default() += value;
        }

        let cells = self
            .cells
            .iter()
            .map(|((row, col), value)| {
                let total = totals[row];
                let scaled = if total == 0.0 { *value } else { value / total };
                ((row.clone(), col.clone()), scaled)
            })
            .collect();

        PivotTable {
            row_keys: self.row_keys.clone(),
            col_keys: self.col_keys.clone(),
            cells,
        }
    }
}

/// Pivots rows into a two-axis table, resolving multiple contributors per
/// cell with `agg_fn`.
pub fn pivot<T, R, C>(
    rows: &[T],
    row_key_fn: impl Fn(&T) -> R,
    col_key_fn: impl Fn(&T) -> C,
    value_fn: impl Fn(&T) -> f64,
    agg_fn: impl Fn(&[f64]) -> f64,
) -> PivotTable<R, C>
where
    R: Ord + Clone,
    C: Ord + Clone,
{
    let mut contributions: BTreeMap<(R, C), Vec<f64>> = BTreeMap::new();
    for row in rows {
        contributions
            .entry((row_key_fn(row), col_key_fn(row)))
            .or_default()
            .push(value_fn(row));
    }

    let mut table = PivotTable::new();
    for ((row, col), values) in contributions {
        table.set(row, col, agg_fn(&values));
    }
    table
}

/// [`pivot`] with sum aggregation, the common case.
pub fn pivot_sum<T, R, C>(
    rows: &[T],
    row_key_fn: impl Fn(&T) -> R,
    col_key_fn: impl Fn(&T) -> C,
    value_fn: impl Fn(&T) -> f64,
) -> PivotTable<R, C>
where
    R: Ord + Clone,
    C: Ord + Clone,
{
    pivot(rows, row_key_fn, col_key_fn, value_fn, |values| {
        values.iter().sum()
    })
}

/// Sums a value field of scored entries by period × entity name.
pub fn pivot_values_by_period_name(entries: &[Scored]) -> PivotTable<i32, String> {
    pivot_sum(
        entries,
        |s| s.record.period,
        |s| s.record.name.clone(),
        |s| s.record.value,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    fn sample() -> Vec<Record> {
        vec![
            Record::new("Tom", "M", 2020, 10.0),
            Record::new("Tom", "M", 2020, 2.0),
            Record::new("Jim", "M", 2020, 5.0),
            Record::new("Ann", "F", 2021, 7.0),
        ]
    }

    fn births_by_period_group(records: &[Record]) -> PivotTable<i32, String> {
        pivot_sum(
            records,
            |r| r.period,
            |r| r.group.clone(),
            |r| r.value,
        )
    }

    #[test]
    fn test_pivot_sums_contributors_per_cell() {
        let table = births_by_period_group(&sample());

        assert_eq!(table.get(&2020, &"M".to_string()), Some(17.0));
        assert_eq!(table.get(&2021, &"F".to_string()), Some(7.0));
    }

    #[test]
    fn test_missing_cell_is_absent_not_zero() {
        let table = births_by_period_group(&sample());
        assert_eq!(table.get(&2020, &"F".to_string()), None);
        assert_eq!(table.get(&2021, &"M".to_string()), None);
    }

    #[test]
    fn test_axis_keys_sorted_ascending() {
        let table = births_by_period_group(&sample());
        assert_eq!(table.row_keys(), &[2020, 2021]);
        assert_eq!(table.col_keys(), &["F".to_string(), "M".to_string()]);
    }

    #[test]
    fn test_restrict_columns_keeps_caller_order() {
        let table = pivot_sum(
            &sample(),
            |r| r.group.clone(),
            |r| r.period,
            |r| r.value,
        );

        let restricted = table.restrict_columns(&[2021, 2020]);
        assert_eq!(restricted.col_keys(), &[2021, 2020]);
        assert_eq!(restricted.get(&"M".to_string(), &2020), Some(17.0));
    }

    #[test]
    fn test_restricted_missing_column_stays_empty() {
        let table = births_by_period_group(&sample());
        let restricted = table.restrict_columns(&["X".to_string(), "M".to_string()]);

        assert_eq!(restricted.col_keys().len(), 2);
        assert_eq!(restricted.get(&2020, &"X".to_string()), None);
    }

    #[test]
    fn test_flatten_round_trip() {
        let table = births_by_period_group(&sample());
        let flat = table.flatten();

        let mut rebuilt = PivotTable::new();
        for (row, col, value) in flat {
            rebuilt.set(row, col, value);
        }
        assert_eq!(rebuilt, table);
    }

    #[test]
    fn test_normalize_columns() {
        let mut table = PivotTable::new();
        table.set('a', "M", 30.0);
        table.set('b', "M", 10.0);
        table.set('a', "F", 5.0);

        let norm = table.normalize_columns();
        assert_eq!(norm.get(&'a', &"M"), Some(0.75));
        assert_eq!(norm.get(&'b', &"M"), Some(0.25));
        assert_eq!(norm.get(&'a', &"F"), Some(1.0));
    }

    #[test]
    fn test_normalize_rows() {
        let mut table = PivotTable::new();
        table.set(2020, "M", 30.0);
        table.set(2020, "F", 10.0);

        let norm = table.normalize_rows();
        assert_eq!(norm.get(&2020, &"M"), Some(0.75));
        assert_eq!(norm.get(&2020, &"F"), Some(0.25));
    }
}
