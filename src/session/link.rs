//! Invitation links: `<origin>/chat/<session id>`.

use std::sync::LazyLock;

use regex::Regex;

use super::error::{Result, SessionError};
use super::id::SessionId;

/// Path segment preceding the session id.
pub const CHAT_PATH: &str = "chat";

/// Matches `.../chat/<id>` with an optional trailing slash, query or fragment.
static CHAT_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|/)chat/([^/?#\s]+)/?(?:[?#]\S*)?$").expect("static pattern is valid")
});

/// Builds and parses shareable join references for one origin.
#[derive(Debug, Clone)]
pub struct InvitationLink {
    origin: String,
}

impl InvitationLink {
    pub fn new(origin: impl Into<String>) -> Self {
        let origin = origin.into();
        Self {
            origin: origin.trim_end_matches('/').to_string(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Canonical join reference for `id`.
    pub fn build(&self, id: &SessionId) -> String {
        format!("{}/{}/{}", self.origin, CHAT_PATH, id)
    }

    /// Extract and validate the session id from a join reference.
    ///
    /// Any origin is accepted; only the `/chat/<id>` path matters.
    pub fn parse(reference: &str) -> Result<SessionId> {
        let reference = reference.trim();
        let raw = CHAT_REFERENCE
            .captures(reference)
            .and_then(|caps| caps.get(1))
            .ok_or_else(|| SessionError::InvalidReference(reference.to_string()))?;

        SessionId::parse(raw.as_str())
            .map_err(|_| SessionError::InvalidReference(reference.to_string()))
    }

    /// Accept either a full reference or a bare id, as typed by a user.
    pub fn resolve(input: &str) -> Result<SessionId> {
        let input = input.trim();
        if input.contains('/') {
            Self::parse(input)
        } else {
            SessionId::parse(input)
        }
    }
}
