//! Immutable point-in-time copy of the reference text.
//!
//! # Responsibilities
//! - Own the raw text loaded from the source
//! - Decompose it into an ordered sequence of lines once, at load time
//! - Never change after construction; refresh builds a new snapshot
//!
//! Line boundaries are `\n`, `\r\n` and a lone `\r`. A trailing line break
//! does not produce a trailing empty line.

use std::ops::Range;
use std::time::Instant;

/// Immutable dataset text plus its line decomposition.
#[derive(Debug)]
pub struct Snapshot {
    text: String,
    /// Byte spans of each line within `text`, excluding the line break.
    spans: Vec<Range<usize>>,
    origin: String,
    loaded_at: Instant,
}

impl Snapshot {
    /// Build a snapshot from raw text.
    pub fn new(text: String, origin: impl Into<String>) -> Self {
        let spans = line_spans(&text);
        Self {
            text,
            spans,
            origin: origin.into(),
            loaded_at: Instant::now(),
        }
    }

    /// Convenience constructor for in-memory data.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let text = lines
            .into_iter()
            .map(|l| l.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        Self::new(text, "memory")
    }

    /// The raw text exactly as loaded.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Iterate the lines in order (untrimmed).
    pub fn lines(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.spans.iter().map(move |span| &self.text[span.clone()])
    }

    /// Get a single line by index.
    pub fn line(&self, index: usize) -> Option<&str> {
        self.spans.get(index).map(|span| &self.text[span.clone()])
    }

    pub fn line_count(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Where this snapshot was loaded from.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn loaded_at(&self) -> Instant {
        self.loaded_at
    }
}

/// Returns true for the bytes that terminate a line.
#[inline]
pub fn is_line_break(byte: u8) -> bool {
    byte == b'\n' || byte == b'\r'
}

/// Split text into line spans using the snapshot's boundary rules.
pub fn line_spans(text: &str) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                spans.push(start..i);
                i += 1;
                start = i;
            }
            b'\r' => {
                spans.push(start..i);
                i += 1;
                if i < bytes.len() && bytes[i] == b'\n' {
                    i += 1;
                }
                start = i;
            }
            _ => i += 1,
        }
    }

    if start < bytes.len() {
        spans.push(start..bytes.len());
    }
    spans
}

/// Split text into line slices using the snapshot's boundary rules.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> + '_ {
    line_spans(text).into_iter().map(move |span| &text[span])
}
