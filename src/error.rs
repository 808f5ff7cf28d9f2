//! Error taxonomy for the analysis pipeline.
//!
//! Every stage surfaces its failures to the caller; no stage substitutes a
//! default silently, since a dropped row or a NaN proportion corrupts the
//! ranking and coverage results downstream.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// An input source could not be opened.
    #[error("source {path} unavailable: {source}")]
    SourceUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A row could not be decoded into the required fields.
    #[error("parse failure in {path} at line {line}: {reason}")]
    Parse {
        path: String,
        line: u64,
        reason: String,
    },

    /// A group's value sum is zero, so proportions are undefined.
    #[error("group {key} has a zero value total")]
    EmptyGroup { key: String },

    /// A coverage threshold outside the valid (0, 1] range.
    #[error("coverage threshold {threshold} is outside (0, 1]")]
    InvalidThreshold { threshold: f64 },
}
