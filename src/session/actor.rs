//! Per-session actor.
//!
//! Each live session runs one task that owns its [`SessionController`] and
//! receives both commands and clock ticks through channels. Every mutation
//! happens inside that task, one at a time, so appends and the expiry
//! transition are strictly ordered with respect to each other.

use tokio::sync::{broadcast, mpsc, oneshot, watch};

use crate::protocol::PeerFrame;

use super::clock::{ClockHandle, ClockTick, TICK_PERIOD};
use super::controller::{SessionController, SessionEvent, SessionSnapshot, SessionStatus};
use super::error::{Result, SessionError};
use super::id::SessionId;
use super::log::Message;

/// Channel capacity for commands.
const CHANNEL_CAPACITY: usize = 256;

/// Capacity of the tick queue. Ticks are tiny and drained every loop turn.
const TICK_CAPACITY: usize = 16;

/// Commands that can be sent to a session actor.
enum SessionCommand {
    SendText {
        text: String,
        reply: oneshot::Sender<Result<Message>>,
    },
    AttachFile {
        file_name: String,
        byte_size: i64,
        mime_type: String,
        reply: oneshot::Sender<Result<Message>>,
    },
    Extend {
        seconds: u64,
        reply: oneshot::Sender<Result<u64>>,
    },
    DeliverPeer {
        frame: PeerFrame,
        reply: oneshot::Sender<Result<Option<Message>>>,
    },
    End {
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

/// Cheap, cloneable handle to a running session actor.
#[derive(Clone)]
pub struct SessionHandle {
    id: SessionId,
    commands: mpsc::Sender<SessionCommand>,
    status: watch::Receiver<SessionStatus>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Latest known status, without a round trip to the actor.
    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    /// Receive events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn send_text(&self, text: impl Into<String>) -> Result<Message> {
        let text = text.into();
        self.request(|reply| SessionCommand::SendText { text, reply }).await?
    }

    pub async fn attach_file(
        &self,
        file_name: impl Into<String>,
        byte_size: i64,
        mime_type: impl Into<String>,
    ) -> Result<Message> {
        let file_name = file_name.into();
        let mime_type = mime_type.into();
        self.request(|reply| SessionCommand::AttachFile {
            file_name,
            byte_size,
            mime_type,
            reply,
        })
        .await?
    }

    pub async fn extend(&self, seconds: u64) -> Result<u64> {
        self.request(|reply| SessionCommand::Extend { seconds, reply }).await?
    }

    pub async fn deliver_peer(&self, frame: PeerFrame) -> Result<Option<Message>> {
        self.request(|reply| SessionCommand::DeliverPeer { frame, reply })
            .await?
    }

    /// End the session. Idempotent.
    pub async fn end(&self) -> Result<()> {
        self.request(|reply| SessionCommand::End { reply }).await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        self.request(|reply| SessionCommand::Snapshot { reply }).await
    }

    /// Wait until the session reaches a terminal state.
    pub async fn closed(&self) -> SessionStatus {
        let mut status = self.status.clone();
        if let Ok(s) = status.wait_for(|s| !s.is_active()).await {
            return *s;
        }
        // Actor gone without a terminal transition; report the last value.
        let last = *status.borrow();
        last
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| SessionError::ActorShutdown)?;
        rx.await.map_err(|_| SessionError::ActorShutdown)
    }
}

/// Task state for one session.
pub struct SessionActor {
    controller: SessionController,
    commands: mpsc::Receiver<SessionCommand>,
    ticks: mpsc::Receiver<()>,
    clock: Option<ClockHandle>,
    status: watch::Sender<SessionStatus>,
}

impl SessionActor {
    /// Spawn the actor with a real one-second ticker.
    pub fn spawn(controller: SessionController) -> SessionHandle {
        let (tick_tx, tick_rx) = mpsc::channel(TICK_CAPACITY);
        let clock = ClockHandle::spawn(TICK_PERIOD, tick_tx);
        Self::start(controller, tick_rx, Some(clock))
    }

    /// Spawn the actor driven by an external tick source.
    ///
    /// Every `()` received is one elapsed second. Closing the sender while the
    /// session is active counts as a clock failure.
    pub fn spawn_with_ticks(
        controller: SessionController,
        ticks: mpsc::Receiver<()>,
    ) -> SessionHandle {
        Self::start(controller, ticks, None)
    }

    fn start(
        controller: SessionController,
        ticks: mpsc::Receiver<()>,
        clock: Option<ClockHandle>,
    ) -> SessionHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (status_tx, status_rx) = watch::channel(controller.status());
        let id = controller.id().clone();
        let events = controller.event_sender();

        let actor = Self {
            controller,
            commands: cmd_rx,
            ticks,
            clock,
            status: status_tx,
        };
        tokio::spawn(actor.run());

        SessionHandle {
            id,
            commands: cmd_tx,
            status: status_rx,
            events,
        }
    }

    async fn run(mut self) {
        let mut ticking = self.controller.status().is_active();

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => break,
                },
                tick = self.ticks.recv(), if ticking => match tick {
                    Some(()) => {
                        if self.controller.on_tick() == ClockTick::Expired {
                            ticking = false;
                        }
                    }
                    None => {
                        ticking = false;
                        self.controller.on_clock_failure();
                    }
                },
            }

            if !self.controller.status().is_active() {
                ticking = false;
                self.stop_clock();
            }
            let current = self.controller.status();
            self.status.send_if_modified(|status| {
                let changed = *status != current;
                *status = current;
                changed
            });
        }

        // Last handle dropped. Clear anything still held.
        self.controller.end();
        self.stop_clock();
        tracing::debug!("Session actor {} finished", self.controller.id());
    }

    fn handle(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::SendText { text, reply } => {
                let _ = reply.send(self.controller.send_text(&text));
            }
            SessionCommand::AttachFile {
                file_name,
                byte_size,
                mime_type,
                reply,
            } => {
                let result = self
                    .controller
                    .attach_file(&file_name, byte_size, &mime_type);
                let _ = reply.send(result);
            }
            SessionCommand::Extend { seconds, reply } => {
                let _ = reply.send(self.controller.extend(seconds));
            }
            SessionCommand::DeliverPeer { frame, reply } => {
                let _ = reply.send(self.controller.deliver_peer(frame));
            }
            SessionCommand::End { reply } => {
                self.controller.end();
                let _ = reply.send(());
            }
            SessionCommand::Snapshot { reply } => {
                let _ = reply.send(self.controller.snapshot());
            }
        }
    }

    fn stop_clock(&mut self) {
        if let Some(clock) = self.clock.as_mut() {
            clock.stop();
        }
    }
}
