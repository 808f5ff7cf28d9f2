//! Name-trend analyses over per-period record files.
//!
//! Composes the loader and the aggregation pipeline into the analyses the
//! birth-name dataset calls for: per-group top-N truncation, popularity
//! concentration over time, trend pivots for a fixed name list, last-letter
//! distributions, and substring name search.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::analyzers::aggregate::aggregate_by_period_group;
use crate::analyzers::coverage::diversity_table;
use crate::analyzers::pivot::{PivotTable, pivot_sum, pivot_values_by_period_name};
use crate::analyzers::rank::{RankBy, top_n_per_group};
use crate::error::PipelineError;
use crate::loader::load_periods;
use crate::record::{Record, Scored};

/// Builds `(period, dir/yob{period}.txt)` source pairs for an inclusive
/// period range, the layout the per-year name files ship in.
pub fn year_sources(dir: &Path, periods: RangeInclusive<i32>) -> Vec<(i32, PathBuf)> {
    periods
        .map(|period| (period, dir.join(format!("yob{period}.txt"))))
        .collect()
}

/// Total value per period × group, the headline "births by year and sex"
/// table.
pub fn totals_by_period_group(records: &[Record]) -> PivotTable<i32, String> {
    pivot_sum(records, |r| r.period, |r| r.group.clone(), |r| r.value)
}

/// Sum of the truncated set's proportions per period × group. A falling
/// column means the top names account for a shrinking share of the total.
pub fn top_share_table(entries: &[Scored]) -> PivotTable<i32, String> {
    pivot_sum(
        entries,
        |s| s.record.period,
        |s| s.record.group.clone(),
        |s| s.proportion,
    )
}

/// Value trend per period for an explicit, caller-ordered name list.
pub fn name_trend(entries: &[Scored], names: &[String]) -> PivotTable<i32, String> {
    pivot_values_by_period_name(entries).restrict_columns(names)
}

/// Last-letter value distribution with one `group/period` column per
/// combination, narrowed to the given periods in caller order and normalized
/// so each column sums to 1.
pub fn letter_shares(records: &[Record], periods: &[i32]) -> PivotTable<char, String> {
    let named: Vec<&Record> = records.iter().filter(|r| !r.name.is_empty()).collect();

    let table = pivot_sum(
        &named,
        |r| r.last_letter().unwrap_or_default(),
        |r| format!("{}/{}", r.group, r.period),
        |r| r.value,
    );

    let groups: BTreeSet<&String> = named.iter().map(|r| &r.group).collect();
    let cols: Vec<String> = groups
        .iter()
        .flat_map(|g| periods.iter().map(move |p| format!("{g}/{p}")))
        .collect();

    table.restrict_columns(&cols).normalize_columns()
}

/// Share of one group's per-period total ending in each of the given
/// letters, as a long-run time series.
pub fn letter_trend(records: &[Record], group: &str, letters: &[char]) -> PivotTable<i32, char> {
    let in_group: Vec<&Record> = records
        .iter()
        .filter(|r| r.group == group && !r.name.is_empty())
        .collect();

    pivot_sum(
        &in_group,
        |r| r.period,
        |r| r.last_letter().unwrap_or_default(),
        |r| r.value,
    )
    .normalize_rows()
    .restrict_columns(letters)
}

/// Unique names in the entry set containing `pattern` case-insensitively.
pub fn find_names(entries: &[Scored], pattern: &str) -> Vec<String> {
    let needle = pattern.to_lowercase();
    let matches: BTreeSet<String> = entries
        .iter()
        .filter(|s| s.record.name.to_lowercase().contains(&needle))
        .map(|s| s.record.name.clone())
        .collect();
    matches.into_iter().collect()
}

/// Per-period share of each group within the given names' combined value,
/// showing how a name's usage splits across groups over time.
pub fn name_share_by_group(records: &[Record], names: &[String]) -> PivotTable<i32, String> {
    let chosen: Vec<&Record> = records.iter().filter(|r| names.contains(&r.name)).collect();

    pivot_sum(
        &chosen,
        |r| r.period,
        |r| r.group.clone(),
        |r| r.value,
    )
    .normalize_rows()
}

/// Summary document written alongside the analysis tables.
#[derive(Debug, Serialize)]
pub struct NamesReport {
    pub generated_at: DateTime<Utc>,
    pub first_period: i32,
    pub last_period: i32,
    pub total_records: usize,
    pub top_n: usize,
    pub diversity_threshold: f64,
    /// Coverage count per group key in the latest period.
    pub latest_diversity: BTreeMap<String, usize>,
}

/// Flat per-run row appended to the cumulative run log; the nested
/// diversity map stays in the JSON report.
#[derive(Debug, Serialize)]
pub struct NamesRunRow {
    pub generated_at: DateTime<Utc>,
    pub first_period: i32,
    pub last_period: i32,
    pub total_records: usize,
    pub top_n: usize,
    pub diversity_threshold: f64,
}

impl NamesReport {
    pub fn run_row(&self) -> NamesRunRow {
        NamesRunRow {
            generated_at: self.generated_at,
            first_period: self.first_period,
            last_period: self.last_period,
            total_records: self.total_records,
            top_n: self.top_n,
            diversity_threshold: self.diversity_threshold,
        }
    }
}

/// Full name-trend analysis bundle.
pub struct NamesAnalysis {
    pub records: Vec<Record>,
    pub top: Vec<Scored>,
    pub totals: PivotTable<i32, String>,
    pub top_share: PivotTable<i32, String>,
    pub diversity: PivotTable<i32, String>,
    pub report: NamesReport,
}

/// Loads every period file in `dir`, aggregates by (period, group), keeps
/// the top `top_n` names per group, and derives the share and diversity
/// tables.
///
/// # Errors
///
/// Propagates loader, aggregation, and threshold errors unchanged; nothing
/// is skipped silently.
pub fn analyze_names(
    dir: &Path,
    periods: RangeInclusive<i32>,
    top_n: usize,
    threshold: f64,
) -> Result<NamesAnalysis, PipelineError> {
    let first_period = *periods.start();
    let last_period = *periods.end();

    let sources = year_sources(dir, periods);
    let records = load_periods(&sources)?;
    info!(rows = records.len(), sources = sources.len(), "Records loaded");

    let groups = aggregate_by_period_group(&records)?;
    let top = top_n_per_group(&groups, top_n, RankBy::Value);

    let totals = totals_by_period_group(&records);
    let top_share = top_share_table(&top);
    let diversity = diversity_table(&top, threshold)?;

    let latest_diversity = diversity
        .row_keys()
        .last()
        .map(|latest| {
            diversity
                .col_keys()
                .iter()
                .filter_map(|g| diversity.get(latest, g).map(|c| (g.clone(), c as usize)))
                .collect()
        })
        .unwrap_or_default();

    let report = NamesReport {
        generated_at: Utc::now(),
        first_period,
        last_period,
        total_records: records.len(),
        top_n,
        diversity_threshold: threshold,
        latest_diversity,
    };

    info!(
        groups = groups.len(),
        top_rows = top.len(),
        "Name-trend analysis complete"
    );

    Ok(NamesAnalysis {
        records,
        top,
        totals,
        top_share,
        diversity,
        report,
    })
}
