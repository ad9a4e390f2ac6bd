//! Plain-text rendering of messages, events and snapshots

use chrono::Local;

use crate::protocol::encode_frame;
use crate::session::{
    format_remaining, AttachmentDescriptor, Message, MessageBody, Sender, SessionEvent,
    SessionSnapshot,
};

/// Remaining-time marks announced in the transcript
const COUNTDOWN_NOTICES: [u64; 3] = [5 * 60, 60, 10];

fn sender_label(sender: Sender) -> &'static str {
    match sender {
        Sender::Local => "you",
        Sender::Peer => "peer",
    }
}

fn describe_attachment(descriptor: &AttachmentDescriptor) -> String {
    format!(
        "shared {} ({}, {})",
        descriptor.file_name,
        descriptor.human_size,
        descriptor.mime_category.label()
    )
}

/// One transcript line for a message
pub fn render_message(message: &Message) -> String {
    let time = message.created_at().with_timezone(&Local).format("%H:%M");
    let who = sender_label(message.sender());

    match message.body() {
        MessageBody::Text(text) => format!("[{}] {}: {}", time, who, text),
        MessageBody::Attachment(descriptor) => {
            format!("[{}] {} {}", time, who, describe_attachment(descriptor))
        }
    }
}

/// Transcript line for an event, if it is worth showing
pub fn render_event(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::MessageAppended(message) => Some(render_message(message)),
        SessionEvent::Tick { remaining } if COUNTDOWN_NOTICES.contains(remaining) => Some(
            format!("-- session expires in {} --", format_remaining(*remaining)),
        ),
        SessionEvent::Tick { .. } => None,
        SessionEvent::Extended { remaining } => Some(format!(
            "-- session extended, expires in {} --",
            format_remaining(*remaining)
        )),
        SessionEvent::Expired => {
            Some("-- session expired. All messages have been deleted. --".to_string())
        }
        SessionEvent::Ended => {
            Some("-- session ended. All messages have been deleted. --".to_string())
        }
        SessionEvent::ClockFailure => {
            Some("-- session clock failed; closing the session --".to_string())
        }
        SessionEvent::Outbound(frame) => {
            match encode_frame(frame) {
                Ok(bytes) => tracing::debug!("Outbound frame ready: {} bytes", bytes.len()),
                Err(e) => tracing::warn!("Failed to encode outbound frame: {}", e),
            }
            None
        }
    }
}

/// Header shown when entering a session
pub fn render_header(snapshot: &SessionSnapshot, link: &str) -> String {
    format!(
        "Session {} ({})\nInvite: {}\nExpires in {}",
        snapshot.id,
        snapshot.status,
        link,
        format_remaining(snapshot.remaining_seconds)
    )
}

/// Full transcript of a snapshot
pub fn render_history(snapshot: &SessionSnapshot) -> Vec<String> {
    if snapshot.messages.is_empty() {
        return vec!["No messages yet.".to_string()];
    }
    snapshot.messages.iter().map(render_message).collect()
}
