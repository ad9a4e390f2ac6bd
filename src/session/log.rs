//! Append-only message log scoped to one session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::attachment::AttachmentDescriptor;
use super::error::{Result, SessionError};

/// Per-session message sequence number, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub u64);

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    /// The participant running this process
    Local,
    /// Someone on the other end of the session
    Peer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    Text,
    Attachment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageBody {
    Text(String),
    Attachment(AttachmentDescriptor),
}

/// A single log entry. Never changes once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    sender: Sender,
    created_at: DateTime<Utc>,
    body: MessageBody,
}

impl Message {
    pub fn text(
        id: MessageId,
        sender: Sender,
        created_at: DateTime<Utc>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id,
            sender,
            created_at,
            body: MessageBody::Text(text.into()),
        }
    }

    pub fn attachment(
        id: MessageId,
        sender: Sender,
        created_at: DateTime<Utc>,
        descriptor: AttachmentDescriptor,
    ) -> Self {
        Self {
            id,
            sender,
            created_at,
            body: MessageBody::Attachment(descriptor),
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn body(&self) -> &MessageBody {
        &self.body
    }

    pub fn kind(&self) -> MessageKind {
        match self.body {
            MessageBody::Text(_) => MessageKind::Text,
            MessageBody::Attachment(_) => MessageKind::Attachment,
        }
    }

    /// Text content, if this is a text message.
    pub fn as_text(&self) -> Option<&str> {
        match &self.body {
            MessageBody::Text(text) => Some(text),
            MessageBody::Attachment(_) => None,
        }
    }

    /// Attachment metadata, if this is an attachment message.
    pub fn as_attachment(&self) -> Option<&AttachmentDescriptor> {
        match &self.body {
            MessageBody::Attachment(descriptor) => Some(descriptor),
            MessageBody::Text(_) => None,
        }
    }
}

/// Ordered, append-only sequence of messages.
///
/// Insertion order is display order. For any two entries `a` before `b`,
/// `a.created_at() <= b.created_at()` and `a.id() < b.id()`.
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
    last_id: u64,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to the end of the log.
    pub fn append(&mut self, message: Message) -> Result<()> {
        if let MessageBody::Text(text) = &message.body {
            if text.trim().is_empty() {
                return Err(SessionError::InvalidMessage(
                    "text body is empty".to_string(),
                ));
            }
        }

        if message.id.0 <= self.last_id {
            return Err(SessionError::InvalidMessage(format!(
                "message id {} is not after {}",
                message.id.0, self.last_id
            )));
        }

        if let Some(last) = self.messages.last() {
            if message.created_at < last.created_at {
                return Err(SessionError::OutOfOrder);
            }
        }

        self.last_id = message.id.0;
        self.messages.push(message);
        Ok(())
    }

    /// Id for the next message to append.
    pub fn next_id(&self) -> MessageId {
        MessageId(self.last_id + 1)
    }

    /// Timestamp for the next message: `now`, or the last entry's timestamp if
    /// the wall clock went backwards.
    pub fn next_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.messages.last() {
            Some(last) if last.created_at > now => last.created_at,
            _ => now,
        }
    }

    /// Point-in-time copy of the log. Later appends or clears do not affect it.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// Drop every entry. Ids keep increasing afterwards.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
