//! Matching engine subsystem.
//!
//! # Data Flow
//! ```text
//! raw query string
//!     → Query::parse (trim, split into lines if it spans several)
//!     → Strategy (closed set, selected by config)
//!     → LineMatcher impl:
//!         - linear.rs       (trim + compare per line)
//!         - kmp.rs          (failure function over the text, whole-line check)
//!         - rabin_karp.rs   (rolling hash window, compare on hash hit)
//!         - boyer_moore.rs  (line-granularity skip table)
//!         - two_way.rs      (bad-character table + line fallback)
//!         - brute_force.rs  (byte-by-byte equality)
//!         - line_walk.rs    (iterative newline-to-newline walk)
//!     → Verdict (Found / NotFound), timed by MatchEngine
//! ```
//!
//! # Contract
//! A query matches when, after trimming surrounding whitespace, it equals a
//! trimmed dataset line. A query spanning several lines matches when its
//! trimmed lines appear as consecutive trimmed dataset lines. Every strategy
//! returns the same verdict for the same input; they differ only in cost.
//!
//! Substring containment is never a match: `"bet"` does not match `"beta"`.

pub mod boyer_moore;
pub mod brute_force;
pub mod kmp;
pub mod line_walk;
pub mod linear;
pub mod rabin_karp;
pub mod two_way;

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::dataset::snapshot::{is_line_break, split_lines, Snapshot};

/// Result of a membership test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Found,
    NotFound,
}

impl Verdict {
    pub fn is_found(&self) -> bool {
        matches!(self, Verdict::Found)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Found => "found",
            Verdict::NotFound => "not_found",
        }
    }
}

impl From<bool> for Verdict {
    fn from(found: bool) -> Self {
        if found {
            Verdict::Found
        } else {
            Verdict::NotFound
        }
    }
}

/// A query normalized for matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query<'a> {
    /// Single trimmed line (possibly empty).
    Line(&'a str),
    /// Two or more trimmed lines that must appear consecutively.
    Lines(Vec<&'a str>),
}

impl<'a> Query<'a> {
    /// Trim the raw query and split it on line breaks.
    pub fn parse(raw: &'a str) -> Self {
        let trimmed = raw.trim();
        if trimmed.bytes().any(is_line_break) {
            Query::Lines(split_lines(trimmed).map(str::trim).collect())
        } else {
            Query::Line(trimmed)
        }
    }

    /// The query as a sequence of lines.
    pub fn lines(&self) -> &[&'a str] {
        match self {
            Query::Line(line) => std::slice::from_ref(line),
            Query::Lines(lines) => lines,
        }
    }
}

/// Exact line membership test.
pub trait LineMatcher: Send + Sync + fmt::Debug {
    /// Returns true if the query occurs as a whole line (or run of lines).
    fn contains(&self, query: &Query<'_>, snapshot: &Snapshot) -> bool;
}

/// The closed set of matching algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    #[default]
    Linear,
    Kmp,
    RabinKarp,
    BoyerMoore,
    TwoWay,
    BruteForce,
    LineWalk,
}

impl Strategy {
    /// Every strategy, in a stable order.
    pub const ALL: [Strategy; 7] = [
        Strategy::Linear,
        Strategy::Kmp,
        Strategy::RabinKarp,
        Strategy::BoyerMoore,
        Strategy::TwoWay,
        Strategy::BruteForce,
        Strategy::LineWalk,
    ];

    /// The implementation behind this strategy.
    pub fn matcher(&self) -> &'static dyn LineMatcher {
        match self {
            Strategy::Linear => &linear::LinearScan,
            Strategy::Kmp => &kmp::KnuthMorrisPratt,
            Strategy::RabinKarp => &rabin_karp::RabinKarp,
            Strategy::BoyerMoore => &boyer_moore::BoyerMooreLines,
            Strategy::TwoWay => &two_way::TwoWaySkip,
            Strategy::BruteForce => &brute_force::BruteForce,
            Strategy::LineWalk => &line_walk::LineWalk,
        }
    }

    /// Run the membership test for a raw query.
    pub fn find(&self, query: &str, snapshot: &Snapshot) -> Verdict {
        let query = Query::parse(query);
        self.matcher().contains(&query, snapshot).into()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Linear => "linear",
            Strategy::Kmp => "kmp",
            Strategy::RabinKarp => "rabin-karp",
            Strategy::BoyerMoore => "boyer-moore",
            Strategy::TwoWay => "two-way",
            Strategy::BruteForce => "brute-force",
            Strategy::LineWalk => "line-walk",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == normalized)
            .ok_or_else(|| format!("unknown strategy '{}'", s))
    }
}

/// Verdict plus the diagnostics attached to it.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub verdict: Verdict,
    /// Time spent in the scan itself.
    pub elapsed: Duration,
    /// Wall-clock time the scan finished.
    pub timestamp: DateTime<Local>,
}

impl MatchOutcome {
    /// Elapsed time in milliseconds below one second, seconds above.
    pub fn elapsed_display(&self) -> String {
        if self.elapsed < Duration::from_secs(1) {
            format!("{:.3} ms", self.elapsed.as_secs_f64() * 1000.0)
        } else {
            format!("{:.3} s", self.elapsed.as_secs_f64())
        }
    }

    pub fn timestamp_display(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Runs the configured strategy and times it.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchEngine {
    strategy: Strategy,
}

impl MatchEngine {
    pub fn new(strategy: Strategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn run(&self, query: &str, snapshot: &Snapshot) -> MatchOutcome {
        let start = Instant::now();
        let verdict = self.strategy.find(query, snapshot);
        MatchOutcome {
            verdict,
            elapsed: start.elapsed(),
            timestamp: Local::now(),
        }
    }
}

/// True if any line is empty after trimming.
pub(crate) fn has_blank_line(snapshot: &Snapshot) -> bool {
    snapshot.lines().any(|line| line.trim().is_empty())
}

/// Trimmed dataset lines, for line-granularity strategies.
pub(crate) fn trimmed_lines(snapshot: &Snapshot) -> Vec<&str> {
    snapshot.lines().map(str::trim).collect()
}

/// Plain window comparison of a line sequence.
pub(crate) fn contains_sequence(snapshot: &Snapshot, pattern: &[&str]) -> bool {
    let lines = trimmed_lines(snapshot);
    if pattern.is_empty() || pattern.len() > lines.len() {
        return false;
    }
    lines.windows(pattern.len()).any(|window| window == pattern)
}

/// Check that `needle`, found at byte offset `start` of `text`, is a whole line.
///
/// Expands the hit to the surrounding line breaks and compares the trimmed
/// line for equality, so an occurrence inside a longer line is rejected.
pub(crate) fn is_whole_line(text: &str, start: usize, len: usize, needle: &str) -> bool {
    let bytes = text.as_bytes();
    let line_start = bytes[..start]
        .iter()
        .rposition(|&b| is_line_break(b))
        .map_or(0, |pos| pos + 1);
    let line_end = bytes[start + len..]
        .iter()
        .position(|&b| is_line_break(b))
        .map_or(bytes.len(), |pos| start + len + pos);

    text[line_start..line_end].trim() == needle
}
