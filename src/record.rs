//! Core data types shared across the pipeline stages.

use serde::Serialize;

/// A single period-stamped observation: an entity name, the group it belongs
/// to, and a non-negative numeric measure.
///
/// Records are created once at load time and never mutated; derived values
/// (proportions, coverage counts) live in separate structures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub name: String,
    pub group: String,
    pub period: i32,
    pub value: f64,
}

impl Record {
    pub fn new(name: &str, group: &str, period: i32, value: f64) -> Self {
        Record {
            name: name.to_string(),
            group: group.to_string(),
            period,
            value,
        }
    }

    /// Composite key used by the standard (period, group) aggregation.
    pub fn period_group(&self) -> (i32, String) {
        (self.period, self.group.clone())
    }

    /// Last letter of the entity name, if the name is non-empty.
    pub fn last_letter(&self) -> Option<char> {
        self.name.chars().next_back()
    }
}

/// A record paired with its share of the group's value total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scored {
    pub record: Record,
    pub proportion: f64,
}

/// All records sharing one grouping key, with proportions attached.
#[derive(Debug, Clone, Serialize)]
pub struct Group {
    pub entries: Vec<Scored>,
    pub total: f64,
}

impl Group {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of the entry proportions. 1.0 within tolerance for any group
    /// produced by the aggregator.
    pub fn proportion_sum(&self) -> f64 {
        self.entries.iter().map(|s| s.proportion).sum()
    }
}
