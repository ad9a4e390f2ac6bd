//! Envelope handed to and received from the external peer transport
//!
//! Uses MessagePack for compact binary serialization. The transport itself
//! (relay, encryption) is not part of this crate; it moves framed bytes.

mod message;

pub use message::{FrameBody, PeerFrame};

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Envelope version for compatibility checking
pub const PROTOCOL_VERSION: u32 = 1;

/// Largest accepted frame payload (10 MB)
pub const MAX_MESSAGE_SIZE: u32 = 10 * 1024 * 1024;

/// Protocol-specific errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Protocol version mismatch: local={local}, remote={remote}")]
    VersionMismatch { local: u32, remote: u32 },

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: u32, max: u32 },
}

/// Serialize a value to MessagePack bytes
pub fn serialize<T: Serialize>(msg: &T) -> Result<Vec<u8>> {
    Ok(rmp_serde::to_vec_named(msg)?)
}

/// Deserialize a value from MessagePack bytes
pub fn deserialize<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T> {
    rmp_serde::from_slice(bytes).map_err(|e| {
        anyhow!(ProtocolError::MalformedMessage(format!(
            "Failed to deserialize: {}",
            e
        )))
    })
}

/// Prefix a payload with its length
///
/// Frame format: [4-byte length BE][payload]
pub fn frame_message(payload: &[u8]) -> Result<Vec<u8>> {
    let len = u32::try_from(payload.len())
        .ok()
        .filter(|len| *len <= MAX_MESSAGE_SIZE)
        .ok_or_else(|| {
            anyhow!(ProtocolError::MessageTooLarge {
                size: u32::try_from(payload.len()).unwrap_or(u32::MAX),
                max: MAX_MESSAGE_SIZE,
            })
        })?;

    let mut framed = Vec::with_capacity(4 + payload.len());
    framed.extend_from_slice(&len.to_be_bytes());
    framed.extend_from_slice(payload);
    Ok(framed)
}

/// Split one frame off the front of a buffer
///
/// Returns (payload, remaining_bytes), or None if the frame is incomplete
pub fn unframe_message(buffer: &[u8]) -> Result<Option<(Vec<u8>, &[u8])>> {
    if buffer.len() < 4 {
        return Ok(None);
    }

    let length_bytes: [u8; 4] = buffer[0..4]
        .try_into()
        .map_err(|_| anyhow!(ProtocolError::InvalidFrame("Invalid length prefix".into())))?;
    let message_length = u32::from_be_bytes(length_bytes);

    if message_length > MAX_MESSAGE_SIZE {
        bail!(ProtocolError::MessageTooLarge {
            size: message_length,
            max: MAX_MESSAGE_SIZE
        });
    }

    let total_length = 4 + message_length as usize;
    if buffer.len() < total_length {
        return Ok(None);
    }

    let payload = buffer[4..total_length].to_vec();
    let remaining = &buffer[total_length..];

    Ok(Some((payload, remaining)))
}

/// Check that a remote frame uses our envelope version
pub fn check_version_compatibility(local_version: u32, remote_version: u32) -> Result<()> {
    if local_version != remote_version {
        bail!(ProtocolError::VersionMismatch {
            local: local_version,
            remote: remote_version
        });
    }
    Ok(())
}

/// Encode a frame for the transport
pub fn encode_frame(frame: &PeerFrame) -> Result<Vec<u8>> {
    let payload = serialize(frame)?;
    frame_message(&payload)
}

/// Decode one frame from the front of a buffer
///
/// Returns the frame and the number of bytes consumed, or None if more bytes
/// are needed. Frames from another envelope version are rejected.
pub fn decode_frame(buffer: &[u8]) -> Result<Option<(PeerFrame, usize)>> {
    match unframe_message(buffer)? {
        Some((payload, remaining)) => {
            let frame: PeerFrame = deserialize(&payload)?;
            check_version_compatibility(PROTOCOL_VERSION, frame.protocol_version)?;
            let consumed = buffer.len() - remaining.len();
            Ok(Some((frame, consumed)))
        }
        None => Ok(None),
    }
}
