//! Skip-table search: character-level bad-character shifts for single-line
//! queries, line-granularity comparison for multi-line queries.

use crate::dataset::snapshot::Snapshot;
use crate::matching::{contains_sequence, has_blank_line, is_whole_line, LineMatcher, Query};

#[derive(Debug, Default, Clone, Copy)]
pub struct TwoWaySkip;

impl LineMatcher for TwoWaySkip {
    fn contains(&self, query: &Query<'_>, snapshot: &Snapshot) -> bool {
        match query {
            Query::Line(needle) if needle.is_empty() => has_blank_line(snapshot),
            Query::Line(needle) => search(snapshot.text(), needle),
            Query::Lines(pattern) => contains_sequence(snapshot, pattern),
        }
    }
}

/// Shift distance for each byte value, keyed on the window's last byte.
pub fn bad_character_table(pattern: &[u8]) -> [usize; 256] {
    let m = pattern.len();
    let mut table = [m.max(1); 256];
    if m > 1 {
        for (i, &byte) in pattern[..m - 1].iter().enumerate() {
            table[byte as usize] = m - 1 - i;
        }
    }
    table
}

fn search(text: &str, needle: &str) -> bool {
    let haystack = text.as_bytes();
    let pattern = needle.as_bytes();
    let m = pattern.len();
    let n = haystack.len();
    if m == 0 || m > n {
        return false;
    }

    let table = bad_character_table(pattern);
    let mut pos = 0;
    while pos + m <= n {
        let last = haystack[pos + m - 1];
        if last == pattern[m - 1]
            && &haystack[pos..pos + m] == pattern
            && is_whole_line(text, pos, m, needle)
        {
            return true;
        }
        pos += table[last as usize];
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_character_table() {
        let table = bad_character_table(b"abcab");
        assert_eq!(table[b'a' as usize], 1);
        assert_eq!(table[b'b' as usize], 3);
        assert_eq!(table[b'c' as usize], 2);
        assert_eq!(table[b'z' as usize], 5);
    }

    #[test]
    fn test_search() {
        assert!(search("Line 1\nLine 2", "Line 2"));
        assert!(!search("Line 1\nLine 22", "Line 2"));
        assert!(search("zzabcab\nabcab", "abcab"));
    }
}
