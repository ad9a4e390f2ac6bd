//! Session manager - registry of the sessions live in this process

use std::collections::HashMap;

use crate::config::SessionConfig;

use super::actor::{SessionActor, SessionHandle};
use super::controller::SessionController;
use super::error::{Result, SessionError};
use super::id::{IdentifierGenerator, SessionId};
use super::link::InvitationLink;

/// Creates, joins and tracks sessions. Sessions never share state.
pub struct SessionManager {
    /// Live sessions by id
    sessions: HashMap<SessionId, SessionHandle>,

    /// Source of ids for new sessions
    generator: IdentifierGenerator,

    /// Settings applied to every session
    config: SessionConfig,
}

impl SessionManager {
    /// Create a manager using OS randomness for ids
    pub fn new(config: SessionConfig) -> Self {
        Self::with_generator(config, IdentifierGenerator::new())
    }

    pub fn with_generator(config: SessionConfig, generator: IdentifierGenerator) -> Self {
        Self {
            sessions: HashMap::new(),
            generator,
            config,
        }
    }

    /// Start a new session and its countdown
    pub fn create(&mut self) -> Result<SessionHandle> {
        let controller = SessionController::create(&mut self.generator, &self.config)?;
        let handle = SessionActor::spawn(controller);
        self.sessions.insert(handle.id().clone(), handle.clone());
        Ok(handle)
    }

    /// Join a session by bare id or invitation link
    ///
    /// Joining a session that is already live here returns its handle.
    pub fn join(&mut self, reference: &str) -> Result<SessionHandle> {
        let id = InvitationLink::resolve(reference)
            .map_err(|_| SessionError::InvalidSessionId(reference.trim().to_string()))?;

        if let Some(existing) = self.sessions.get(&id) {
            if existing.status().is_active() {
                tracing::debug!("Session {} already live, reusing handle", id);
                return Ok(existing.clone());
            }
        }

        let controller = SessionController::join(id.as_str(), &self.config)?;
        self.generator.reserve(&id);
        let handle = SessionActor::spawn(controller);
        self.sessions.insert(id, handle.clone());
        Ok(handle)
    }

    /// Look up a live session
    pub fn get(&self, id: &SessionId) -> Option<&SessionHandle> {
        self.sessions.get(id)
    }

    /// End a session and forget it
    pub async fn end(&mut self, id: &SessionId) -> Result<()> {
        let handle = self
            .sessions
            .remove(id)
            .ok_or_else(|| SessionError::InvalidSessionId(id.to_string()))?;
        handle.end().await
    }

    /// Drop sessions that have expired or ended
    pub fn reap(&mut self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, handle| handle.status().is_active());
        let reaped = before - self.sessions.len();
        if reaped > 0 {
            tracing::debug!("Reaped {} closed session(s)", reaped);
        }
        reaped
    }

    /// List live session ids
    pub fn list_sessions(&self) -> Vec<SessionId> {
        self.sessions.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}
