//! Linear scan: trim each line and compare.
//!
//! Baseline strategy, O(total chars). Every other strategy is checked
//! against this one.

use crate::dataset::snapshot::Snapshot;
use crate::matching::{contains_sequence, LineMatcher, Query};

#[derive(Debug, Default, Clone, Copy)]
pub struct LinearScan;

impl LineMatcher for LinearScan {
    fn contains(&self, query: &Query<'_>, snapshot: &Snapshot) -> bool {
        match query {
            Query::Line(needle) => snapshot.lines().any(|line| line.trim() == *needle),
            Query::Lines(pattern) => contains_sequence(snapshot, pattern),
        }
    }
}
