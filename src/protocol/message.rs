//! Frames exchanged with the transport carrying a session between peers

use serde::{Deserialize, Serialize};

use crate::session::{AttachmentDescriptor, SessionId};

use super::PROTOCOL_VERSION;

/// One unit of session traffic, addressed to a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerFrame {
    /// Envelope format version
    pub protocol_version: u32,

    /// Session the frame belongs to
    pub session_id: SessionId,

    /// Sender wall-clock time in milliseconds since the Unix epoch
    pub sent_at: i64,

    pub body: FrameBody,
}

/// Frame payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameBody {
    /// Text message
    Text { text: String },

    /// Attachment metadata; the bytes travel separately
    Attachment { descriptor: AttachmentDescriptor },

    /// The sender ended the session
    End,
}

impl PeerFrame {
    pub fn new(session_id: SessionId, body: FrameBody) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            session_id,
            sent_at: chrono::Utc::now().timestamp_millis(),
            body,
        }
    }

    pub fn text(session_id: SessionId, text: impl Into<String>) -> Self {
        Self::new(session_id, FrameBody::Text { text: text.into() })
    }

    pub fn attachment(session_id: SessionId, descriptor: AttachmentDescriptor) -> Self {
        Self::new(session_id, FrameBody::Attachment { descriptor })
    }

    pub fn end(session_id: SessionId) -> Self {
        Self::new(session_id, FrameBody::End)
    }
}
