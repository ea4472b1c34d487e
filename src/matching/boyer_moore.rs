//! Boyer–Moore style search with whole lines as the comparison unit.
//!
//! The skip table maps a line of the pattern to its distance from the
//! pattern's last line. On mismatch the window jumps by the entry for the
//! dataset line under the window's end, or by the full pattern length when
//! that line does not occur in the pattern (Horspool rule). Multi-line
//! queries get sub-linear line skips.

use std::collections::HashMap;

use crate::dataset::snapshot::Snapshot;
use crate::matching::{trimmed_lines, LineMatcher, Query};

#[derive(Debug, Default, Clone, Copy)]
pub struct BoyerMooreLines;

impl LineMatcher for BoyerMooreLines {
    fn contains(&self, query: &Query<'_>, snapshot: &Snapshot) -> bool {
        find(&trimmed_lines(snapshot), query.lines()).is_some()
    }
}

/// Build the line skip table for a pattern.
pub fn skip_table<'a>(pattern: &[&'a str]) -> HashMap<&'a str, usize> {
    let m = pattern.len();
    let mut skip = HashMap::with_capacity(m);
    if m == 0 {
        return skip;
    }
    // Later entries overwrite earlier ones, keeping the rightmost occurrence.
    for (i, line) in pattern[..m - 1].iter().enumerate() {
        skip.insert(*line, m - 1 - i);
    }
    skip
}

/// Index of the first line of the first occurrence of `pattern` in `lines`.
pub fn find(lines: &[&str], pattern: &[&str]) -> Option<usize> {
    let m = pattern.len();
    let n = lines.len();
    if m == 0 || m > n {
        return None;
    }

    let skip = skip_table(pattern);
    let mut end = m - 1;
    while end < n {
        let mut k = 0;
        while k < m && lines[end - k] == pattern[m - 1 - k] {
            k += 1;
        }
        if k == m {
            return Some(end + 1 - m);
        }
        end += skip.get(lines[end]).copied().unwrap_or(m);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_table() {
        let skip = skip_table(&["a", "b", "a", "c"]);
        assert_eq!(skip.get("a"), Some(&1));
        assert_eq!(skip.get("b"), Some(&2));
        assert_eq!(skip.get("c"), None);
    }

    #[test]
    fn test_find_multi_line() {
        let lines = ["x", "a", "b", "y", "a", "b", "c"];
        assert_eq!(find(&lines, &["a", "b", "c"]), Some(4));
        assert_eq!(find(&lines, &["a", "b"]), Some(1));
        assert_eq!(find(&lines, &["b", "a"]), None);
    }

    #[test]
    fn test_find_single_line() {
        let lines = ["Line 1", "Line 2"];
        assert_eq!(find(&lines, &["Line 2"]), Some(1));
        assert_eq!(find(&lines, &["Line 3"]), None);
        assert_eq!(find(&[], &["Line 1"]), None);
    }
}
