//! Grouping and proportion computation.

use std::collections::BTreeMap;
use std::fmt::Debug;

use tracing::debug;

use crate::error::PipelineError;
use crate::record::{Group, Record, Scored};

/// Groups records by `key_fn` and attaches each record's share of its
/// group total.
///
/// Input records are never mutated; every group is a fresh structure. For
/// every non-empty group the entry proportions sum to 1.0 within 1e-9.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyGroup`] when a group's value sum is zero:
/// proportions would be undefined, and letting NaN through would corrupt
/// ranking and coverage downstream.
pub fn aggregate<K, F>(records: &[Record], key_fn: F) -> Result<BTreeMap<K, Group>, PipelineError>
where
    K: Ord + Debug,
    F: Fn(&Record) -> K,
{
    let mut buckets: BTreeMap<K, Vec<Record>> = BTreeMap::new();
    for record in records {
        buckets.entry(key_fn(record)).or_default().push(record.clone());
    }

    let mut groups = BTreeMap::new();

    for (key, members) in buckets {
        let total: f64 = members.iter().map(|r| r.value).sum();

        if total == 0.0 {
            return Err(PipelineError::EmptyGroup {
                key: format!("{key:?}"),
            });
        }

        let entries = members
            .into_iter()
            .map(|record| {
                let proportion = record.value / total;
                Scored { record, proportion }
            })
            .collect();

        groups.insert(key, Group { entries, total });
    }

    debug!(groups = groups.len(), rows = records.len(), "Aggregated");
    Ok(groups)
}

/// Standard aggregation by the `(period, group)` composite key.
pub fn aggregate_by_period_group(
    records: &[Record],
) -> Result<BTreeMap<(i32, String), Group>, PipelineError> {
    aggregate(records, Record::period_group)
}
