//! Length-prefixed frame codec.
//!
//! # Wire Format
//! ```text
//! +----------------------------------+---------------------+
//! | header: HEADER_WIDTH bytes       | payload: N bytes    |
//! | decimal ASCII N, '\n' pad-filled | raw UTF-8 text      |
//! +----------------------------------+---------------------+
//! ```
//!
//! # Design Decisions
//! - Header is read in full before parsing; a bad header never leaves the
//!   reader waiting on a payload that will not arrive
//! - Zero bytes at a frame boundary is a clean disconnect, not an error
//! - Payload size is checked before any payload allocation

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::protocol::ProtocolError;

/// Fixed header width shared by both peers.
pub const HEADER_WIDTH: usize = 1024;

/// Default ceiling on payload size.
pub const DEFAULT_MAX_PAYLOAD: usize = 64 * 1024;

/// Hard ceiling any configuration may raise the payload limit to.
pub const MAX_PAYLOAD_LIMIT: usize = 16 * 1024 * 1024;

/// Byte used to fill the header after the digits.
const PAD: u8 = b'\n';

/// Render the header for a payload of `len` bytes.
pub fn encode_header(len: usize) -> [u8; HEADER_WIDTH] {
    let mut header = [PAD; HEADER_WIDTH];
    let digits = len.to_string();
    header[..digits.len()].copy_from_slice(digits.as_bytes());
    header
}

/// Parse a header into the declared payload length.
///
/// Surrounding ASCII whitespace and NUL padding are ignored, so peers that
/// pad with spaces or left-pad are accepted too.
pub fn parse_header(header: &[u8]) -> Result<usize, ProtocolError> {
    let invalid = || ProtocolError::InvalidHeader {
        preview: String::from_utf8_lossy(&header[..header.len().min(32)])
            .trim()
            .to_string(),
    };

    let digits = std::str::from_utf8(header)
        .map_err(|_| invalid())?
        .trim_matches(|c: char| c.is_ascii_whitespace() || c == '\0');

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    digits.parse::<usize>().map_err(|_| invalid())
}

/// Build a complete frame (header + payload) in one buffer.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(HEADER_WIDTH + payload.len());
    frame.extend_from_slice(&encode_header(payload.len()));
    frame.extend_from_slice(payload);
    frame
}

/// Reads and writes frames with a payload size limit.
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    max_payload: usize,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAYLOAD)
    }
}

impl FrameCodec {
    pub fn new(max_payload: usize) -> Self {
        Self {
            max_payload: max_payload.min(MAX_PAYLOAD_LIMIT),
        }
    }

    pub fn max_payload(&self) -> usize {
        self.max_payload
    }

    /// Read one frame's payload.
    ///
    /// Returns `Ok(None)` when the peer closed the stream at a frame boundary.
    pub async fn read_frame<R>(&self, reader: &mut R) -> Result<Option<Vec<u8>>, ProtocolError>
    where
        R: AsyncRead + Unpin,
    {
        let mut header = [0u8; HEADER_WIDTH];
        let mut filled = 0;
        while filled < HEADER_WIDTH {
            let n = reader.read(&mut header[filled..]).await?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(ProtocolError::TruncatedHeader { received: filled });
            }
            filled += n;
        }

        let declared = parse_header(&header)?;
        if declared > self.max_payload {
            return Err(ProtocolError::PayloadTooLarge {
                declared,
                max: self.max_payload,
            });
        }

        let mut payload = vec![0u8; declared];
        let mut received = 0;
        while received < declared {
            let n = reader.read(&mut payload[received..]).await?;
            if n == 0 {
                return Err(ProtocolError::TruncatedPayload { declared, received });
            }
            received += n;
        }
        Ok(Some(payload))
    }

    /// Read one frame and decode its payload as UTF-8 text.
    pub async fn read_text<R>(&self, reader: &mut R) -> Result<Option<String>, ProtocolError>
    where
        R: AsyncRead + Unpin,
    {
        match self.read_frame(reader).await? {
            Some(payload) => String::from_utf8(payload)
                .map(Some)
                .map_err(|_| ProtocolError::InvalidEncoding),
            None => Ok(None),
        }
    }

    /// Write one frame and flush it.
    pub async fn write_frame<W>(&self, writer: &mut W, payload: &[u8]) -> Result<(), ProtocolError>
    where
        W: AsyncWrite + Unpin,
    {
        if payload.len() > self.max_payload {
            return Err(ProtocolError::PayloadTooLarge {
                declared: payload.len(),
                max: self.max_payload,
            });
        }
        writer.write_all(&encode_frame(payload)).await?;
        writer.flush().await?;
        Ok(())
    }
}
