//! Popularity concentration via coverage counts.
//!
//! The coverage count of a group is the minimum number of its top entries
//! (by proportion) whose cumulative share meets a threshold. Few entries
//! covering half the mass means a concentrated group, many means a diverse
//! one.

use std::collections::BTreeMap;

use tracing::debug;

use crate::analyzers::pivot::PivotTable;
use crate::error::PipelineError;
use crate::record::{Group, Scored};

/// Minimum 1-based prefix length of the descending-by-proportion ordering
/// whose cumulative proportion reaches `threshold`.
///
/// An empty entry set yields 0. When floating-point truncation keeps the
/// running sum just short of the threshold at the last entry, the last
/// entry's index is returned rather than "not found".
///
/// # Errors
///
/// Returns [`PipelineError::InvalidThreshold`] when `threshold` is outside
/// (0, 1].
pub fn coverage_count_of(entries: &[Scored], threshold: f64) -> Result<usize, PipelineError> {
    if !(threshold > 0.0 && threshold <= 1.0) {
        return Err(PipelineError::InvalidThreshold { threshold });
    }

    if entries.is_empty() {
        return Ok(0);
    }

    let mut proportions: Vec<f64> = entries.iter().map(|s| s.proportion).collect();
    proportions.sort_by(|a, b| b.total_cmp(a));

    let mut cumulative = 0.0;
    for (i, p) in proportions.iter().enumerate() {
        cumulative += p;
        if cumulative >= threshold {
            return Ok(i + 1);
        }
    }

    Ok(proportions.len())
}

/// [`coverage_count_of`] over a whole aggregated group.
pub fn coverage_count(group: &Group, threshold: f64) -> Result<usize, PipelineError> {
    coverage_count_of(&group.entries, threshold)
}

/// Coverage counts per `(period, group)`, reshaped into a period-indexed
/// table with one column per group key: the "diversity over time" series.
///
/// Takes flat scored entries (typically a truncated top-N set) and groups
/// them by the identity carried on each record, keeping the proportions the
/// entries were scored with.
pub fn diversity_table(
    entries: &[Scored],
    threshold: f64,
) -> Result<PivotTable<i32, String>, PipelineError> {
    let mut by_key: BTreeMap<(i32, String), Vec<Scored>> = BTreeMap::new();
    for entry in entries {
        by_key
            .entry(entry.record.period_group())
            .or_default()
            .push(entry.clone());
    }

    let mut table = PivotTable::new();
    for ((period, group), members) in &by_key {
        let count = coverage_count_of(members, threshold)?;
        table.set(*period, group.clone(), count as f64);
    }

    debug!(groups = by_key.len(), threshold, "Diversity table built");
    Ok(table)
}
