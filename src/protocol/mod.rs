//! Wire protocol subsystem.
//!
//! # Data Flow
//! ```text
//! Request:  client → frame(query text) → server
//! Response: server → frame(verdict token) → client
//!
//! frame.rs: fixed-width decimal header + exact payload
//! mod.rs:   verdict tokens and protocol errors
//! ```
//!
//! # Design Decisions
//! - No delimiter inside payloads; the header carries the exact length
//! - One request, one response, strictly in order per connection
//! - Protocol errors close only the connection that produced them

pub mod frame;

pub use frame::{FrameCodec, DEFAULT_MAX_PAYLOAD, HEADER_WIDTH, MAX_PAYLOAD_LIMIT};

use thiserror::Error;

use crate::matching::Verdict;

/// Response token for a found line.
pub const FOUND_TOKEN: &str = "STRING EXISTS\n";

/// Response token for an absent line.
pub const NOT_FOUND_TOKEN: &str = "STRING NOT FOUND\n";

/// Errors raised while reading or writing frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Stream closed part-way through a header.
    #[error("Connection closed mid-header after {received} bytes")]
    TruncatedHeader { received: usize },

    /// Header was not a decimal byte count.
    #[error("Invalid frame header: {preview:?}")]
    InvalidHeader { preview: String },

    /// Declared payload exceeds the configured maximum.
    #[error("Payload of {declared} bytes exceeds maximum of {max} bytes")]
    PayloadTooLarge { declared: usize, max: usize },

    /// Stream closed before the declared payload arrived.
    #[error("Connection closed after {received} of {declared} payload bytes")]
    TruncatedPayload { declared: usize, received: usize },

    /// Payload was not valid UTF-8.
    #[error("Payload is not valid UTF-8")]
    InvalidEncoding,

    /// Underlying socket error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// Whether the connection may continue with the next frame.
    ///
    /// Only a malformed header qualifies: the full header width has been
    /// consumed, so the stream is still aligned on a frame boundary.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ProtocolError::InvalidHeader { .. })
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProtocolError::TruncatedHeader { .. } => "truncated_header",
            ProtocolError::InvalidHeader { .. } => "invalid_header",
            ProtocolError::PayloadTooLarge { .. } => "payload_too_large",
            ProtocolError::TruncatedPayload { .. } => "truncated_payload",
            ProtocolError::InvalidEncoding => "invalid_encoding",
            ProtocolError::Io(_) => "io",
        }
    }
}

/// Wire token for a verdict.
pub fn verdict_token(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Found => FOUND_TOKEN,
        Verdict::NotFound => NOT_FOUND_TOKEN,
    }
}

/// Parse a response payload back into a verdict.
pub fn parse_verdict(token: &str) -> Option<Verdict> {
    match token.trim_end() {
        t if t == FOUND_TOKEN.trim_end() => Some(Verdict::Found),
        t if t == NOT_FOUND_TOKEN.trim_end() => Some(Verdict::NotFound),
        _ => None,
    }
}
