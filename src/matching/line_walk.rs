//! Line walk: iterate the raw text from one line break to the next.
//!
//! Works on the unindexed text rather than the snapshot's line spans, so it
//! re-derives boundaries itself (`\r\n` counts as one break). Iterative, so
//! stack depth stays constant regardless of dataset size.

use crate::dataset::snapshot::{is_line_break, Snapshot};
use crate::matching::{contains_sequence, LineMatcher, Query};

#[derive(Debug, Default, Clone, Copy)]
pub struct LineWalk;

impl LineMatcher for LineWalk {
    fn contains(&self, query: &Query<'_>, snapshot: &Snapshot) -> bool {
        match query {
            Query::Line(needle) => walk(snapshot.text(), needle),
            Query::Lines(pattern) => contains_sequence(snapshot, pattern),
        }
    }
}

fn walk(text: &str, needle: &str) -> bool {
    let bytes = text.as_bytes();
    let mut start = 0;

    while start < bytes.len() {
        let end = bytes[start..]
            .iter()
            .position(|&b| is_line_break(b))
            .map_or(bytes.len(), |offset| start + offset);

        if text[start..end].trim() == needle {
            return true;
        }

        let mut next = end + 1;
        if end < bytes.len() && bytes[end] == b'\r' && next < bytes.len() && bytes[next] == b'\n' {
            next += 1;
        }
        start = next;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk() {
        assert!(walk("a\nb\nc", "c"));
        assert!(walk("a\r\n\r\nb", ""));
        assert!(!walk("a\r\nb", ""));
        assert!(!walk("", ""));
    }

    #[test]
    fn test_large_dataset_does_not_recurse() {
        let text = "x\n".repeat(200_000) + "needle";
        let snapshot = Snapshot::new(text, "large");
        assert!(LineWalk.contains(&Query::parse("needle"), &snapshot));
    }
}
