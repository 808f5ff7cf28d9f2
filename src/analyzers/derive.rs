//! Derived per-row columns.
//!
//! A derived column is a pure function of existing fields, attached as a new
//! parallel column without mutating the source rows. Missing inputs
//! propagate as missing rather than failing the batch; column summaries skip
//! missing values.

use crate::analyzers::utility::mean;

/// Computes a derived column over `rows`, one output slot per input row.
pub fn derive_column<T>(rows: &[T], f: impl Fn(&T) -> Option<f64>) -> Vec<Option<f64>> {
    rows.iter().map(f).collect()
}

/// `a - b`, missing when either operand is missing.
pub fn difference(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some(a? - b?)
}

/// `a / b`, missing when either operand is missing or the divisor is zero.
pub fn ratio(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    let b = b?;
    if b == 0.0 { None } else { Some(a? / b) }
}

/// Arithmetic mean over the present values of a column. `None` when the
/// column has no present value at all.
pub fn column_mean(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        None
    } else {
        Some(mean(&present))
    }
}
