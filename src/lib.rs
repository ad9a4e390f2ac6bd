//! ephemera - temporary, session-scoped chat and file sharing
//!
//! This crate provides the core functionality for ephemera, including:
//! - Session lifecycle (countdown expiry, explicit end, cleanup)
//! - Append-only message log and attachment metadata
//! - Invitation links and session id generation
//! - Peer envelope encoding for an external transport
//! - Configuration and user preferences
//!
//! # Architecture
//!
//! Every live session is owned by one actor task. Commands from the
//! presentation layer and ticks from the session clock reach it through
//! channels, so all state changes for a session are applied one at a time.
//! State changes flow back out as [`session::SessionEvent`]s.

pub mod client;
pub mod config;
pub mod protocol;
pub mod session;
