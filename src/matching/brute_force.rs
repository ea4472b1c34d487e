//! Brute force: byte-by-byte equality against every line.
//!
//! Degenerate baseline; same result as the linear scan, with no help from
//! the standard library's slice comparison.

use crate::dataset::snapshot::Snapshot;
use crate::matching::{trimmed_lines, LineMatcher, Query};

#[derive(Debug, Default, Clone, Copy)]
pub struct BruteForce;

impl LineMatcher for BruteForce {
    fn contains(&self, query: &Query<'_>, snapshot: &Snapshot) -> bool {
        match query {
            Query::Line(needle) => {
                // A needle longer than the whole text cannot be a line of it.
                if needle.len() > snapshot.text().len() {
                    return false;
                }
                snapshot
                    .lines()
                    .any(|line| bytes_equal(line.trim().as_bytes(), needle.as_bytes()))
            }
            Query::Lines(pattern) => {
                let lines = trimmed_lines(snapshot);
                let m = pattern.len();
                let mut start = 0;
                while start + m <= lines.len() {
                    let mut k = 0;
                    while k < m && bytes_equal(lines[start + k].as_bytes(), pattern[k].as_bytes()) {
                        k += 1;
                    }
                    if k == m {
                        return true;
                    }
                    start += 1;
                }
                false
            }
        }
    }
}

fn bytes_equal(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}
