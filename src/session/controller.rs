//! Session lifecycle state machine.
//!
//! `Active -> Expired` when the clock runs out, `Active -> Ended` on an
//! explicit end. Both are terminal and both clear the log. The controller is
//! synchronous; [`super::actor`] serializes access to it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::config::SessionConfig;
use crate::protocol::{FrameBody, PeerFrame, PROTOCOL_VERSION};

use super::attachment::AttachmentDescriptor;
use super::clock::{ClockTick, SessionClock};
use super::error::{Result, SessionError};
use super::id::{IdentifierGenerator, SessionId};
use super::link::InvitationLink;
use super::log::{Message, MessageLog, Sender};

/// Welcome entries seeded into a fresh log.
const WELCOME_MESSAGES: [&str; 2] = [
    "Welcome! This is a temporary session for messages and file sharing.",
    "Everything shared here is deleted automatically when the session ends.",
];

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Active,
    Expired,
    Ended,
}

impl SessionStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, SessionStatus::Active)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SessionStatus::Active => "active",
            SessionStatus::Expired => "expired",
            SessionStatus::Ended => "ended",
        };
        f.write_str(label)
    }
}

/// State changes reported to the presentation layer.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A message was added to the log
    MessageAppended(Message),
    /// One second elapsed
    Tick { remaining: u64 },
    /// Time was added to the session
    Extended { remaining: u64 },
    /// The countdown reached zero; the log has been cleared
    Expired,
    /// The session was ended by a participant; the log has been cleared
    Ended,
    /// The timer source stopped unexpectedly
    ClockFailure,
    /// A locally authored frame to hand to the peer transport
    Outbound(PeerFrame),
}

/// One ephemeral channel.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    created_at: DateTime<Utc>,
    status: SessionStatus,
    clock: SessionClock,
    log: MessageLog,
}

impl Session {
    fn new(id: SessionId, duration_seconds: u64) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            status: SessionStatus::Active,
            clock: SessionClock::start(duration_seconds),
            log: MessageLog::new(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.clock.remaining()
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }
}

/// Read-only copy of a session handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
    pub remaining_seconds: u64,
    pub status: SessionStatus,
    pub messages: Vec<Message>,
}

/// Buffered events per subscriber before it starts lagging.
const EVENT_CAPACITY: usize = 256;

/// Owns one session and applies commands and clock ticks to it.
pub struct SessionController {
    session: Session,
    max_duration_seconds: u64,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    /// Start a new session with a freshly generated id.
    pub fn create(generator: &mut IdentifierGenerator, config: &SessionConfig) -> Result<Self> {
        let id = generator.generate()?;
        tracing::info!("Created session {}", id);
        Ok(Self::open(id, config))
    }

    /// Join a session by id or invitation reference.
    pub fn join(reference: &str, config: &SessionConfig) -> Result<Self> {
        let id = InvitationLink::resolve(reference)
            .map_err(|_| SessionError::InvalidSessionId(reference.trim().to_string()))?;
        tracing::info!("Joined session {}", id);
        Ok(Self::open(id, config))
    }

    fn open(id: SessionId, config: &SessionConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let mut controller = Self {
            session: Session::new(id, config.duration_seconds),
            max_duration_seconds: config.max_duration_seconds,
            events,
        };

        if config.welcome_messages {
            for text in WELCOME_MESSAGES {
                if let Err(e) = controller.append_text(Sender::Peer, text) {
                    tracing::warn!("Failed to seed welcome message: {}", e);
                }
            }
        }

        controller
    }

    /// Receive events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<SessionEvent> {
        self.events.clone()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn id(&self) -> &SessionId {
        &self.session.id
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.session.id.clone(),
            created_at: self.session.created_at,
            remaining_seconds: self.session.clock.remaining(),
            status: self.session.status,
            messages: self.session.log.snapshot(),
        }
    }

    /// Append a text message authored locally.
    pub fn send_text(&mut self, text: &str) -> Result<Message> {
        self.ensure_active()?;
        if text.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        let message = self.append_text(Sender::Local, text)?;
        self.emit(SessionEvent::Outbound(PeerFrame::text(
            self.session.id.clone(),
            text,
        )));
        Ok(message)
    }

    /// Describe a file and append it as an attachment authored locally.
    pub fn attach_file(
        &mut self,
        file_name: &str,
        byte_size: i64,
        mime_type: &str,
    ) -> Result<Message> {
        self.ensure_active()?;
        let descriptor = AttachmentDescriptor::describe(file_name, byte_size, mime_type)?;
        tracing::debug!(
            "Attaching {} {:?} file to session {}",
            descriptor.human_size,
            descriptor.mime_category,
            self.session.id
        );

        let message = self.append_attachment(Sender::Local, descriptor.clone())?;
        self.emit(SessionEvent::Outbound(PeerFrame::attachment(
            self.session.id.clone(),
            descriptor,
        )));
        Ok(message)
    }

    /// Add time to the countdown, up to the configured maximum.
    pub fn extend(&mut self, seconds: u64) -> Result<u64> {
        self.ensure_active()?;
        if seconds == 0 {
            return Ok(self.session.clock.remaining());
        }

        let remaining = self
            .session
            .clock
            .extend(seconds, self.max_duration_seconds);
        tracing::info!(
            "Session {} extended, {}s remaining",
            self.session.id,
            remaining
        );
        self.emit(SessionEvent::Extended { remaining });
        Ok(remaining)
    }

    /// Apply a frame received from the peer transport.
    ///
    /// Returns the appended message, or `None` for an end frame. Attachment
    /// descriptors are rebuilt from the peer's name, size and MIME type.
    pub fn deliver_peer(&mut self, frame: PeerFrame) -> Result<Option<Message>> {
        if frame.protocol_version != PROTOCOL_VERSION {
            return Err(SessionError::InvalidMessage(format!(
                "unsupported protocol version {}",
                frame.protocol_version
            )));
        }
        if frame.session_id != self.session.id {
            return Err(SessionError::InvalidSessionId(frame.session_id.to_string()));
        }
        self.ensure_active()?;

        match frame.body {
            FrameBody::Text { text } => {
                if text.trim().is_empty() {
                    return Err(SessionError::EmptyMessage);
                }
                self.append_text(Sender::Peer, &text).map(Some)
            }
            FrameBody::Attachment { descriptor } => {
                if descriptor.file_name.trim().is_empty() {
                    return Err(SessionError::InvalidMessage(
                        "attachment has no file name".to_string(),
                    ));
                }
                let byte_size = i64::try_from(descriptor.byte_size).map_err(|_| {
                    SessionError::InvalidMessage(format!(
                        "attachment size {} out of range",
                        descriptor.byte_size
                    ))
                })?;
                let descriptor = AttachmentDescriptor::describe(
                    &descriptor.file_name,
                    byte_size,
                    &descriptor.mime_type,
                )?;
                self.append_attachment(Sender::Peer, descriptor).map(Some)
            }
            FrameBody::End => {
                if self.terminate(SessionStatus::Ended) {
                    tracing::info!("Session {} ended by peer", self.session.id);
                    self.emit(SessionEvent::Ended);
                }
                Ok(None)
            }
        }
    }

    /// End the session. Ending twice is a no-op.
    pub fn end(&mut self) {
        if self.terminate(SessionStatus::Ended) {
            tracing::info!("Session {} ended", self.session.id);
            self.emit(SessionEvent::Outbound(PeerFrame::end(self.session.id.clone())));
            self.emit(SessionEvent::Ended);
        }
    }

    /// Advance the countdown by one second.
    pub fn on_tick(&mut self) -> ClockTick {
        let tick = self.session.clock.tick();
        match tick {
            ClockTick::Running(remaining) => self.emit(SessionEvent::Tick { remaining }),
            ClockTick::Expired => {
                if self.terminate(SessionStatus::Expired) {
                    tracing::info!("Session {} expired", self.session.id);
                    self.emit(SessionEvent::Expired);
                }
            }
            ClockTick::Idle => {}
        }
        tick
    }

    /// The timer source died. Stop the clock without touching the remaining
    /// time, report it, and end the session so its data is not retained.
    pub fn on_clock_failure(&mut self) {
        if !self.session.status.is_active() {
            return;
        }

        tracing::error!(
            "Clock failed for session {} with {}s remaining",
            self.session.id,
            self.session.clock.remaining()
        );
        self.session.clock.stop();
        self.emit(SessionEvent::ClockFailure);
        if self.terminate(SessionStatus::Ended) {
            self.emit(SessionEvent::Ended);
        }
    }

    fn ensure_active(&self) -> Result<()> {
        if self.session.status.is_active() {
            Ok(())
        } else {
            Err(SessionError::SessionClosed {
                status: self.session.status,
            })
        }
    }

    fn append_text(&mut self, sender: Sender, text: &str) -> Result<Message> {
        let log = &self.session.log;
        let created_at = log.next_timestamp(Utc::now());
        let message = Message::text(log.next_id(), sender, created_at, text);
        self.append(message)
    }

    fn append_attachment(
        &mut self,
        sender: Sender,
        descriptor: AttachmentDescriptor,
    ) -> Result<Message> {
        let log = &self.session.log;
        let created_at = log.next_timestamp(Utc::now());
        let message = Message::attachment(log.next_id(), sender, created_at, descriptor);
        self.append(message)
    }

    fn append(&mut self, message: Message) -> Result<Message> {
        self.session.log.append(message.clone())?;
        tracing::debug!(
            "Appended message {} ({:?}) to session {}",
            message.id().0,
            message.kind(),
            self.session.id
        );
        self.emit(SessionEvent::MessageAppended(message.clone()));
        Ok(message)
    }

    /// Move to a terminal state. Returns false if already terminal.
    fn terminate(&mut self, status: SessionStatus) -> bool {
        if !self.session.status.is_active() {
            return false;
        }
        self.session.status = status;
        self.session.clock.stop();
        self.session.log.clear();
        true
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine; snapshots remain available.
        let _ = self.events.send(event);
    }
}
