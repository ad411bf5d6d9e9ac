//! Codec for encoding and decoding Beam frames.
//!
//! The transport carries UTF-8 text frames, one JSON document per WebSocket
//! message, so encoding is plain serde_json with a size ceiling.

use thiserror::Error;

use crate::frames::{ClientFrame, ServerFrame};

/// Maximum accepted frame size (64 KiB).
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Protocol errors that can occur during encoding/decoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame exceeds maximum size.
    #[error("Frame size {0} exceeds maximum {MAX_FRAME_SIZE}")]
    FrameTooLarge(usize),

    /// JSON encoding error.
    #[error("Encoding error: {0}")]
    Encode(serde_json::Error),

    /// Unparseable or structurally invalid inbound payload.
    #[error("Malformed frame: {0}")]
    Malformed(serde_json::Error),
}

/// Encode an outbound frame to a JSON text frame.
///
/// # Errors
///
/// Returns an error if the frame is too large or serialization fails.
pub fn encode(frame: &ServerFrame) -> Result<String, ProtocolError> {
    let text = serde_json::to_string(frame).map_err(ProtocolError::Encode)?;

    if text.len() > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge(text.len()));
    }

    Ok(text)
}

/// Decode an inbound text frame.
///
/// # Errors
///
/// Returns an error if the text is oversized, unparseable, or missing
/// required fields. Callers log and drop such frames; the connection is
/// kept open.
pub fn decode(text: &str) -> Result<ClientFrame, ProtocolError> {
    if text.len() > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge(text.len()));
    }

    serde_json::from_str(text).map_err(ProtocolError::Malformed)
}
