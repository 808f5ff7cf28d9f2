//! Per-period CSV ingestion.
//!
//! Each source file is a headerless delimited file of `(name, group, value)`
//! rows. The loader stamps every row with its period and concatenates all
//! sources into one record set, period ascending, original row order within
//! a source.
//!
//! This loader fails fast: a malformed row aborts the batch with
//! [`PipelineError::Parse`] rather than being skipped, since silently dropped
//! rows would shift every proportion computed downstream.

use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::PipelineError;
use crate::record::Record;

/// Parses one source file into records stamped with `period`.
///
/// # Errors
///
/// Returns [`PipelineError::SourceUnavailable`] when the file cannot be
/// opened and [`PipelineError::Parse`] on the first row with a wrong field
/// count or a non-numeric value.
pub fn load_period(path: &Path, period: i32) -> Result<Vec<Record>, PipelineError> {
    let path_display = path.display().to_string();

    let file = File::open(path).map_err(|e| PipelineError::SourceUnavailable {
        path: path_display.clone(),
        source: e,
    })?;

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut records = Vec::new();

    for result in rdr.records() {
        let row = result.map_err(|e| PipelineError::Parse {
            path: path_display.clone(),
            line: e.position().map(|p| p.line()).unwrap_or(0),
            reason: e.to_string(),
        })?;

        let line = row.position().map(|p| p.line()).unwrap_or(0);

        if row.len() != 3 {
            return Err(PipelineError::Parse {
                path: path_display,
                line,
                reason: format!("expected 3 fields, got {}", row.len()),
            });
        }

        let value: f64 = row[2].parse().map_err(|_| PipelineError::Parse {
            path: path_display.clone(),
            line,
            reason: format!("non-numeric value {:?}", &row[2]),
        })?;

        records.push(Record {
            name: row[0].to_string(),
            group: row[1].to_string(),
            period,
            value,
        });
    }

    debug!(path = %path_display, period, rows = records.len(), "Source loaded");
    Ok(records)
}

/// Loads every `(period, path)` source and concatenates the results.
///
/// Source ordering is preserved: callers pass sources period ascending and
/// the output keeps that order, with original row order within each source.
pub fn load_periods(sources: &[(i32, PathBuf)]) -> Result<Vec<Record>, PipelineError> {
    let mut records = Vec::new();

    for (period, path) in sources {
        records.extend(load_period(path, *period)?);
    }

    debug!(
        sources = sources.len(),
        rows = records.len(),
        "All sources loaded"
    );
    Ok(records)
}
