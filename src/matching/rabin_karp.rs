//! Rabin–Karp rolling hash.
//!
//! A single-line query is hashed over a sliding byte window of the same
//! length; the window hash updates in O(1) per shift and bytes are compared
//! only on a hash hit. Multi-line queries roll the same hash over per-line
//! hashes instead of bytes.

use crate::dataset::snapshot::Snapshot;
use crate::matching::{has_blank_line, is_whole_line, trimmed_lines, LineMatcher, Query};

const BYTE_BASE: u64 = 256;
const LINE_BASE: u64 = 1_000_003;
const PRIME: u64 = 1_000_000_007;

#[derive(Debug, Default, Clone, Copy)]
pub struct RabinKarp;

impl LineMatcher for RabinKarp {
    fn contains(&self, query: &Query<'_>, snapshot: &Snapshot) -> bool {
        match query {
            Query::Line(needle) if needle.is_empty() => has_blank_line(snapshot),
            Query::Line(needle) => search_bytes(snapshot.text(), needle),
            Query::Lines(pattern) => search_lines(&trimmed_lines(snapshot), pattern),
        }
    }
}

fn pow_mod(base: u64, exp: usize) -> u64 {
    let mut result = 1;
    for _ in 0..exp {
        result = result * base % PRIME;
    }
    result
}

fn hash<I: IntoIterator<Item = u64>>(items: I, base: u64) -> u64 {
    items
        .into_iter()
        .fold(0, |acc, item| (acc * base + item % PRIME) % PRIME)
}

/// Drop `outgoing` from the front of the window and append `incoming`.
fn roll(hash: u64, outgoing: u64, incoming: u64, high: u64, base: u64) -> u64 {
    let without = (hash + PRIME - (outgoing % PRIME) * high % PRIME) % PRIME;
    (without * base + incoming % PRIME) % PRIME
}

fn search_bytes(text: &str, needle: &str) -> bool {
    let haystack = text.as_bytes();
    let pattern = needle.as_bytes();
    let m = pattern.len();
    let n = haystack.len();
    if m > n {
        return false;
    }

    let high = pow_mod(BYTE_BASE, m - 1);
    let target = hash(pattern.iter().map(|&b| b as u64), BYTE_BASE);
    let mut window = hash(haystack[..m].iter().map(|&b| b as u64), BYTE_BASE);

    for i in 0..=n - m {
        if window == target && &haystack[i..i + m] == pattern && is_whole_line(text, i, m, needle) {
            return true;
        }
        if i + m < n {
            window = roll(window, haystack[i] as u64, haystack[i + m] as u64, high, BYTE_BASE);
        }
    }
    false
}

fn line_hash(line: &str) -> u64 {
    hash(line.bytes().map(u64::from), BYTE_BASE)
}

fn search_lines(lines: &[&str], pattern: &[&str]) -> bool {
    let m = pattern.len();
    let n = lines.len();
    if m == 0 || m > n {
        return false;
    }

    let hashes: Vec<u64> = lines.iter().map(|line| line_hash(line)).collect();
    let high = pow_mod(LINE_BASE, m - 1);
    let target = hash(pattern.iter().map(|line| line_hash(line)), LINE_BASE);
    let mut window = hash(hashes[..m].iter().copied(), LINE_BASE);

    for i in 0..=n - m {
        if window == target && &lines[i..i + m] == pattern {
            return true;
        }
        if i + m < n {
            window = roll(window, hashes[i], hashes[i + m], high, LINE_BASE);
        }
    }
    false
}
