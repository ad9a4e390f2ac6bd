//! Session core - identifiers, countdown, message log, lifecycle

mod actor;
mod attachment;
mod clock;
mod controller;
mod error;
mod id;
mod link;
mod log;
mod manager;

pub use actor::{SessionActor, SessionHandle};
pub use attachment::{human_size, AttachmentDescriptor, MimeCategory};
pub use clock::{format_remaining, ClockHandle, ClockTick, SessionClock, TICK_PERIOD};
pub use controller::{Session, SessionController, SessionEvent, SessionSnapshot, SessionStatus};
pub use error::{Result, SessionError};
pub use id::{IdentifierGenerator, SessionId, MAX_SESSION_ID_LEN, SESSION_ID_LEN};
pub use link::{InvitationLink, CHAT_PATH};
pub use log::{Message, MessageBody, MessageId, MessageKind, MessageLog, Sender};
pub use manager::SessionManager;
