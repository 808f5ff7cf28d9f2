//! Per-group top-N selection.

use std::collections::BTreeMap;

use crate::record::{Group, Scored};

/// Field a group is ranked by. Within one group the two orderings agree
/// (proportion is value over a shared total), but callers ranking merged or
/// truncated entry sets need the distinction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankBy {
    Value,
    Proportion,
}

/// Returns the group's top `n` entries, sorted descending by `by`.
///
/// The sort is stable, so ties keep their original input order and the
/// result is deterministic. At most `n` entries are returned, fewer when the
/// group is smaller. Re-selecting from the result with the same `n` returns
/// the same sequence.
pub fn select_top_n(group: &Group, n: usize, by: RankBy) -> Vec<Scored> {
    rank_entries(group.entries.clone(), n, by)
}

/// Applies [`select_top_n`] to every group and flattens the results back
/// into one truncated entry set.
///
/// Each entry keeps the record it was scored from, so group identity
/// (period, group) survives the truncation and is never re-derived.
pub fn top_n_per_group<K: Ord>(groups: &BTreeMap<K, Group>, n: usize, by: RankBy) -> Vec<Scored> {
    groups
        .values()
        .flat_map(|group| select_top_n(group, n, by))
        .collect()
}

fn rank_entries(mut entries: Vec<Scored>, n: usize, by: RankBy) -> Vec<Scored> {
    entries.sort_by(|a, b| match by {
        RankBy::Value => b.record.value.total_cmp(&a.record.value),
        RankBy::Proportion => b.proportion.total_cmp(&a.proportion),
    });
    entries.truncate(n);
    entries
}
