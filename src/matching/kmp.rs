//! Knuth–Morris–Pratt scan over the concatenated dataset text.
//!
//! The failure function lets the scan resume without re-reading matched
//! prefixes. Each occurrence is then widened to its line and accepted only
//! if the whole trimmed line equals the query.

use crate::dataset::snapshot::Snapshot;
use crate::matching::{contains_sequence, has_blank_line, is_whole_line, LineMatcher, Query};

#[derive(Debug, Default, Clone, Copy)]
pub struct KnuthMorrisPratt;

impl LineMatcher for KnuthMorrisPratt {
    fn contains(&self, query: &Query<'_>, snapshot: &Snapshot) -> bool {
        match query {
            Query::Line(needle) if needle.is_empty() => has_blank_line(snapshot),
            Query::Line(needle) => search(snapshot.text(), needle),
            Query::Lines(pattern) => contains_sequence(snapshot, pattern),
        }
    }
}

/// Longest proper prefix of `pattern[..=i]` that is also a suffix, per `i`.
pub fn failure_function(pattern: &[u8]) -> Vec<usize> {
    let mut pi = vec![0; pattern.len()];
    let mut k = 0;
    for q in 1..pattern.len() {
        while k > 0 && pattern[k] != pattern[q] {
            k = pi[k - 1];
        }
        if pattern[k] == pattern[q] {
            k += 1;
        }
        pi[q] = k;
    }
    pi
}

fn search(text: &str, needle: &str) -> bool {
    let haystack = text.as_bytes();
    let pattern = needle.as_bytes();
    if pattern.len() > haystack.len() {
        return false;
    }

    let pi = failure_function(pattern);
    let mut k = 0;
    for (i, &byte) in haystack.iter().enumerate() {
        while k > 0 && pattern[k] != byte {
            k = pi[k - 1];
        }
        if pattern[k] == byte {
            k += 1;
        }
        if k == pattern.len() {
            let start = i + 1 - k;
            if is_whole_line(text, start, k, needle) {
                return true;
            }
            // Keep scanning for overlapping occurrences.
            k = pi[k - 1];
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_function() {
        assert_eq!(failure_function(b"ababaca"), vec![0, 0, 1, 2, 3, 0, 1]);
        assert_eq!(failure_function(b"aaaa"), vec![0, 1, 2, 3]);
        assert!(failure_function(b"").is_empty());
    }

    #[test]
    fn test_rejects_partial_line_hit() {
        // First occurrence sits inside a longer line; the second is whole.
        assert!(search("xabc\nabc", "abc"));
        assert!(!search("xabc\nabcx", "abc"));
    }

    #[test]
    fn test_overlapping_occurrences() {
        assert!(search("aaab\naa", "aa"));
    }
}
