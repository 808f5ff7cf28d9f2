//! Aggregation and ranking pipeline.
//!
//! This module groups records by composite keys, computes group-relative
//! proportions, selects per-group top-N subsets, measures popularity
//! concentration via coverage counts, and reshapes flat record sets into
//! two-axis pivot tables.

pub mod aggregate;
pub mod coverage;
pub mod derive;
pub mod pivot;
pub mod rank;
pub mod utility;
