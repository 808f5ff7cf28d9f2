//! Output formatting and persistence for analysis tables.
//!
//! The core pipeline only produces in-memory tables; this module is the
//! presentation sink that serializes them to CSV and JSON. Supports
//! pretty-printing, JSON documents, and CSV append.

use std::fmt::Display;
use std::fs::OpenOptions;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::analyzers::pivot::PivotTable;
use csv::WriterBuilder;

/// Logs a serializable value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes a serializable value to `path` as pretty-printed JSON.
pub fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let body = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, body)?;
    debug!(path = %path.display(), "JSON document written");
    Ok(())
}

/// Appends a serializable record as a row to a CSV file, used for the
/// cumulative run logs that grow across invocations.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &Path, record: &impl Serialize) -> Result<()> {
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    // The header may only be written when the file is created, otherwise
    // every append would repeat it.
    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    writer.serialize(record)?;
    writer.flush()?;

    Ok(())
}

/// Writes a full set of serializable rows to a fresh CSV file with headers.
pub fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    debug!(path = %path.display(), rows = rows.len(), "CSV rows written");
    Ok(())
}

/// Writes a pivot table as CSV: one header of column keys under `row_label`,
/// one line per row key. Absent cells become empty fields, never zeros.
pub fn write_pivot_csv<R, C>(path: &Path, table: &PivotTable<R, C>, row_label: &str) -> Result<()>
where
    R: Ord + Clone + Display,
    C: Ord + Clone + Display,
{
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec![row_label.to_string()];
    header.extend(table.col_keys().iter().map(|c| c.to_string()));
    writer.write_record(&header)?;

    for row in table.row_keys() {
        let mut line = vec![row.to_string()];
        for col in table.col_keys() {
            line.push(
                table
                    .get(row, col)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            );
        }
        writer.write_record(&line)?;
    }
    writer.flush()?;

    debug!(path = %path.display(), "Pivot table written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use std::path::PathBuf;

    #[derive(Serialize)]
    struct Row {
        period: i32,
        count: usize,
    }

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&Row { period: 2020, count: 3 }).unwrap();
    }

    #[test]
    fn test_append_record_writes_header_once() {
        let path = temp_path("tabtrend_output_header.csv");
        let _ = fs::remove_file(&path);

        let row = Row { period: 2020, count: 3 };
        append_record(&path, &row).unwrap();
        append_record(&path, &row).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.contains("period")).count();
        assert_eq!(header_count, 1);
        assert_eq!(content.lines().count(), 3);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_rows_fresh_file() {
        let path = temp_path("tabtrend_output_rows.csv");

        let rows = vec![
            Row { period: 2020, count: 1 },
            Row { period: 2021, count: 2 },
        ];
        write_rows(&path, &rows).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);
        assert!(content.starts_with("period,count"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_pivot_csv_empty_cells() {
        let path = temp_path("tabtrend_output_pivot.csv");

        let mut table = PivotTable::new();
        table.set(2020, "M".to_string(), 17.0);
        table.set(2021, "F".to_string(), 7.0);

        write_pivot_csv(&path, &table, "period").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "period,F,M");
        assert_eq!(lines[1], "2020,,17");
        assert_eq!(lines[2], "2021,7,");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_json_round_trip() {
        let path = temp_path("tabtrend_output_report.json");

        write_json(&path, &Row { period: 2020, count: 3 }).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["period"], 2020);

        fs::remove_file(&path).unwrap();
    }
}
