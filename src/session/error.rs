//! Session error types.

use thiserror::Error;

use super::SessionStatus;

/// Errors that can occur during session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The randomness source could not produce an identifier.
    #[error("failed to generate session id: {0}")]
    Generation(String),

    /// A message failed validation before it reached the log.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Text was empty after trimming whitespace.
    #[error("message is empty")]
    EmptyMessage,

    /// Attachment byte size was negative.
    #[error("invalid attachment size: {0}")]
    InvalidSize(i64),

    /// An invitation reference did not contain a well-formed session id.
    #[error("invalid invitation reference: {0}")]
    InvalidReference(String),

    /// A session id was malformed or addressed to another session.
    #[error("invalid session id: {0}")]
    InvalidSessionId(String),

    /// Command issued after the session left the active state.
    #[error("session is closed ({status})")]
    SessionClosed { status: SessionStatus },

    /// The timer source driving the countdown stopped unexpectedly.
    #[error("session clock failed")]
    ClockFailure,

    /// A message would break the log's timestamp ordering.
    #[error("message timestamp precedes the last log entry")]
    OutOfOrder,

    /// The session actor has shut down.
    #[error("session actor has shut down")]
    ActorShutdown,
}

impl SessionError {
    /// Whether the error is a rejected command the caller can recover from.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            SessionError::Generation(_) | SessionError::ClockFailure | SessionError::ActorShutdown
        )
    }
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
