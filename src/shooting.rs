//! Shooting-statistics analyses.
//!
//! Loads a spreadsheet export whose first header row is a category banner
//! (the real column names sit on the second row), filters by player
//! position, folds duplicate player rows together, and derives the
//! over-/under-performance columns and regression fits the scatter plots
//! overlay.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::analyzers::derive::{column_mean, derive_column, difference};
use crate::analyzers::utility::{LinearFit, linear_fit, mean, stddev};
use crate::error::PipelineError;

/// One player row after header flattening and numeric coercion.
///
/// `goals` is required; the remaining measures stay optional because the
/// source sheet leaves them blank for some players.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShootingRecord {
    pub player: String,
    pub position: String,
    pub shots: Option<f64>,
    pub shots_on_target: Option<f64>,
    pub goals: f64,
    pub xg: Option<f64>,
}

const REQUIRED_COLUMNS: [&str; 6] = ["Player", "Pos", "Sh", "SoT", "Gls", "xG"];

/// Loads the shooting sheet at `path`.
///
/// The first row is discarded as a banner and the second row becomes the
/// header. Numeric fields that fail to parse are coerced to missing; rows
/// whose `Gls` value is missing are dropped with a warning. This mirrors the
/// source sheets, where stray footnote rows are expected; the period loader
/// fails fast instead.
///
/// # Errors
///
/// Returns [`PipelineError::SourceUnavailable`] when the file cannot be
/// opened and [`PipelineError::Parse`] when a required column is absent from
/// the flattened header.
pub fn load_shooting(path: &Path) -> Result<Vec<ShootingRecord>, PipelineError> {
    let path_display = path.display().to_string();

    let file = File::open(path).map_err(|e| PipelineError::SourceUnavailable {
        path: path_display.clone(),
        source: e,
    })?;

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut rows = rdr.records();

    // Banner row, then the real header.
    let read_header = |row: Option<Result<csv::StringRecord, csv::Error>>, line: u64| {
        row.ok_or_else(|| PipelineError::Parse {
            path: path_display.clone(),
            line,
            reason: "missing header row".to_string(),
        })?
        .map_err(|e| PipelineError::Parse {
            path: path_display.clone(),
            line,
            reason: e.to_string(),
        })
    };
    let _banner = read_header(rows.next(), 1)?;
    let header = read_header(rows.next(), 2)?;

    let column = |name: &str| -> Result<usize, PipelineError> {
        header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| PipelineError::Parse {
                path: path_display.clone(),
                line: 2,
                reason: format!("missing column {name:?}"),
            })
    };

    let [player_i, pos_i, sh_i, sot_i, gls_i, xg_i] = {
        let mut idx = [0usize; 6];
        for (slot, name) in idx.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = column(name)?;
        }
        idx
    };

    let mut records = Vec::new();

    for result in rows {
        let row = result.map_err(|e| PipelineError::Parse {
            path: path_display.clone(),
            line: e.position().map(|p| p.line()).unwrap_or(0),
            reason: e.to_string(),
        })?;

        let line = row.position().map(|p| p.line()).unwrap_or(0);
        let field = |i: usize| row.get(i).unwrap_or("");

        let goals = match opt_f64(field(gls_i)) {
            Some(goals) => goals,
            None => {
                warn!(path = %path_display, line, "Dropping row with missing goals value");
                continue;
            }
        };

        records.push(ShootingRecord {
            player: field(player_i).to_string(),
            position: field(pos_i).to_string(),
            shots: opt_f64(field(sh_i)),
            shots_on_target: opt_f64(field(sot_i)),
            goals,
            xg: opt_f64(field(xg_i)),
        });
    }

    info!(path = %path_display, rows = records.len(), "Shooting sheet loaded");
    Ok(records)
}

fn opt_f64(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        trimmed.parse().ok()
    }
}

/// Keeps rows whose position is in the given membership list.
pub fn filter_positions(rows: &[ShootingRecord], positions: &[String]) -> Vec<ShootingRecord> {
    rows.iter()
        .filter(|r| positions.contains(&r.position))
        .cloned()
        .collect()
}

/// Folds duplicate player rows (transfers show up twice) into one row per
/// player by summing the numeric measures. The first row's position wins.
pub fn sum_by_player(rows: &[ShootingRecord]) -> Vec<ShootingRecord> {
    let mut by_player: std::collections::BTreeMap<String, ShootingRecord> =
        std::collections::BTreeMap::new();

    for row in rows {
        by_player
            .entry(row.player.clone())
            .and_modify(|acc| {
                acc.shots = add_opt(acc.shots, row.shots);
                acc.shots_on_target = add_opt(acc.shots_on_target, row.shots_on_target);
                acc.goals += row.goals;
                acc.xg = add_opt(acc.xg, row.xg);
            })
            .or_insert_with(|| row.clone());
    }

    by_player.into_values().collect()
}

fn add_opt(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (None, None) => None,
        _ => Some(a.unwrap_or(0.0) + b.unwrap_or(0.0)),
    }
}

/// One unit-width histogram bin: how many players scored exactly this many
/// goals (fractional totals land in the bin below them).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalsBin {
    pub goals: u32,
    pub players: usize,
}

/// Unit-bin histogram of goals from 0 through the maximum observed total.
pub fn goals_histogram(rows: &[ShootingRecord]) -> Vec<GoalsBin> {
    let max = rows
        .iter()
        .map(|r| r.goals.floor() as u32)
        .max()
        .unwrap_or(0);

    (0..=max)
        .map(|goals| GoalsBin {
            goals,
            players: rows
                .iter()
                .filter(|r| r.goals.floor() as u32 == goals)
                .count(),
        })
        .collect()
}

/// Top `n` players by goals, descending, ties in input order.
pub fn top_scorers(rows: &[ShootingRecord], n: usize) -> Vec<ShootingRecord> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| b.goals.total_cmp(&a.goals));
    sorted.truncate(n);
    sorted
}

/// Summary document written alongside the analysis tables.
#[derive(Debug, Serialize)]
pub struct ShootingReport {
    pub generated_at: DateTime<Utc>,
    pub players: usize,
    pub top_scorer: Option<String>,
    /// Population standard deviation of per-player goal totals, a spread
    /// measure for the histogram.
    pub goals_stddev: f64,
    /// Mean of `goals - xG`: above zero means the cohort finished above
    /// expectation.
    pub xg_delta_mean: Option<f64>,
    /// Mean of `shots on target - shots`, always at or below zero.
    pub on_target_delta_mean: Option<f64>,
    /// Least-squares fit of goals on xG.
    pub goals_on_xg: Option<LinearFit>,
    /// Least-squares fit of shots on target on shots.
    pub on_target_on_shots: Option<LinearFit>,
}

/// Flat per-run row appended to the cumulative run log; the fits stay in
/// the JSON report.
#[derive(Debug, Serialize)]
pub struct ShootingRunRow {
    pub generated_at: DateTime<Utc>,
    pub players: usize,
    pub top_scorer: Option<String>,
    pub goals_stddev: f64,
    pub xg_delta_mean: Option<f64>,
    pub on_target_delta_mean: Option<f64>,
}

impl ShootingReport {
    pub fn run_row(&self) -> ShootingRunRow {
        ShootingRunRow {
            generated_at: self.generated_at,
            players: self.players,
            top_scorer: self.top_scorer.clone(),
            goals_stddev: self.goals_stddev,
            xg_delta_mean: self.xg_delta_mean,
            on_target_delta_mean: self.on_target_delta_mean,
        }
    }
}

/// Full shooting analysis bundle.
pub struct ShootingAnalysis {
    pub players: Vec<ShootingRecord>,
    pub histogram: Vec<GoalsBin>,
    pub xg_delta: Vec<Option<f64>>,
    pub on_target_delta: Vec<Option<f64>>,
    pub report: ShootingReport,
}

/// Loads the sheet, filters to `positions`, folds duplicate players, and
/// derives the histogram, delta columns, and regression fits.
pub fn analyze_shooting(
    path: &Path,
    positions: &[String],
) -> Result<ShootingAnalysis, PipelineError> {
    let rows = load_shooting(path)?;
    let filtered = filter_positions(&rows, positions);
    let players = sum_by_player(&filtered);

    info!(
        loaded = rows.len(),
        kept = filtered.len(),
        players = players.len(),
        "Shooting rows filtered and folded"
    );

    let histogram = goals_histogram(&players);

    let xg_delta = derive_column(&players, |r| difference(Some(r.goals), r.xg));
    let on_target_delta = derive_column(&players, |r| difference(r.shots_on_target, r.shots));

    let xg_points: Vec<(f64, f64)> = players
        .iter()
        .filter_map(|r| r.xg.map(|xg| (xg, r.goals)))
        .collect();
    let shot_points: Vec<(f64, f64)> = players
        .iter()
        .filter_map(|r| r.shots.zip(r.shots_on_target))
        .collect();

    let goal_totals: Vec<f64> = players.iter().map(|r| r.goals).collect();

    let report = ShootingReport {
        generated_at: Utc::now(),
        players: players.len(),
        top_scorer: top_scorers(&players, 1).first().map(|r| r.player.clone()),
        goals_stddev: stddev(&goal_totals, mean(&goal_totals)),
        xg_delta_mean: column_mean(&xg_delta),
        on_target_delta_mean: column_mean(&on_target_delta),
        goals_on_xg: linear_fit(&xg_points),
        on_target_on_shots: linear_fit(&shot_points),
    };

    Ok(ShootingAnalysis {
        players,
        histogram,
        xg_delta,
        on_target_delta,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use std::path::PathBuf;

    const SHEET: &str = "\
Standard,Standard,Standard,Standard,Standard,Expected
Player,Pos,Sh,SoT,Gls,xG
Kane,FW,100,50,30,25.5
Salah,FW,90,40,19,21.0
Rashford,\"FW,MF\",60,30,17,14.2
Rodri,MF,40,15,5,4.0
Ramsdale,GK,0,0,0,0.1
Injured,FW,,,,
";

    fn temp_sheet(name: &str) -> PathBuf {
        let path = env::temp_dir().join(name);
        fs::write(&path, SHEET).unwrap();
        path
    }

    fn forwards() -> Vec<String> {
        vec!["FW".to_string(), "FW,MF".to_string(), "MF,FW".to_string()]
    }

    #[test]
    fn test_load_flattens_two_row_header() {
        let path = temp_sheet("tabtrend_shooting_load.csv");
        let rows = load_shooting(&path).unwrap();

        // The banner row is gone and the missing-goals row is dropped.
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].player, "Kane");
        assert_eq!(rows[0].goals, 30.0);
        assert_eq!(rows[0].xg, Some(25.5));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_column_fails() {
        let path = env::temp_dir().join("tabtrend_shooting_badheader.csv");
        fs::write(&path, "A,B\nPlayer,Pos\nKane,FW\n").unwrap();

        let err = load_shooting(&path).unwrap_err();
        assert!(matches!(err, PipelineError::Parse { line: 2, .. }));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_filter_positions_membership() {
        let path = temp_sheet("tabtrend_shooting_filter.csv");
        let rows = load_shooting(&path).unwrap();

        let kept = filter_positions(&rows, &forwards());
        assert_eq!(kept.len(), 3);
        assert!(kept.iter().all(|r| r.position != "GK"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_sum_by_player_folds_duplicates() {
        let rows = vec![
            ShootingRecord {
                player: "Kane".to_string(),
                position: "FW".to_string(),
                shots: Some(60.0),
                shots_on_target: Some(30.0),
                goals: 18.0,
                xg: Some(15.0),
            },
            ShootingRecord {
                player: "Kane".to_string(),
                position: "FW".to_string(),
                shots: Some(40.0),
                shots_on_target: None,
                goals: 12.0,
                xg: Some(10.5),
            },
        ];

        let folded = sum_by_player(&rows);
        assert_eq!(folded.len(), 1);
        assert_eq!(folded[0].goals, 30.0);
        assert_eq!(folded[0].shots, Some(100.0));
        // missing + present sums as present
        assert_eq!(folded[0].shots_on_target, Some(30.0));
        assert_eq!(folded[0].xg, Some(25.5));
    }

    #[test]
    fn test_goals_histogram_unit_bins() {
        let rows = vec![
            record("A", 0.0),
            record("B", 2.0),
            record("C", 2.0),
            record("D", 3.0),
        ];

        let bins = goals_histogram(&rows);
        assert_eq!(bins.len(), 4);
        assert_eq!(bins[0], GoalsBin { goals: 0, players: 1 });
        assert_eq!(bins[1], GoalsBin { goals: 1, players: 0 });
        assert_eq!(bins[2], GoalsBin { goals: 2, players: 2 });
        assert_eq!(bins[3], GoalsBin { goals: 3, players: 1 });
    }

    #[test]
    fn test_analyze_shooting_report() {
        let path = temp_sheet("tabtrend_shooting_analyze.csv");

        let analysis = analyze_shooting(&path, &forwards()).unwrap();

        assert_eq!(analysis.players.len(), 3);
        assert_eq!(analysis.report.top_scorer.as_deref(), Some("Kane"));

        // deltas: Kane 4.5, Rashford 2.8, Salah -2.0 (players sorted by name)
        let mean = analysis.report.xg_delta_mean.unwrap();
        assert!((mean - (4.5 + 2.8 - 2.0) / 3.0).abs() < 1e-9);

        // on-target delta is never positive
        for delta in analysis.on_target_delta.iter().flatten() {
            assert!(*delta <= 0.0);
        }

        // goals 30, 17, 19: mean 22, variance (64 + 25 + 9) / 3
        let expected_spread = (98.0f64 / 3.0).sqrt();
        assert!((analysis.report.goals_stddev - expected_spread).abs() < 1e-9);

        assert!(analysis.report.goals_on_xg.is_some());
        assert_eq!(analysis.histogram.len(), 31);

        // the run-log row mirrors the report's flat fields
        let row = analysis.report.run_row();
        assert_eq!(row.players, 3);
        assert_eq!(row.top_scorer.as_deref(), Some("Kane"));
        assert_eq!(row.xg_delta_mean, analysis.report.xg_delta_mean);

        fs::remove_file(&path).unwrap();
    }

    fn record(player: &str, goals: f64) -> ShootingRecord {
        ShootingRecord {
            player: player.to_string(),
            position: "FW".to_string(),
            shots: None,
            shots_on_target: None,
            goals,
            xg: None,
        }
    }
}
