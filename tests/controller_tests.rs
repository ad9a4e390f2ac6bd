//! Integration tests for the session state machine

use ephemera::config::SessionConfig;
use ephemera::protocol::{FrameBody, PeerFrame, PROTOCOL_VERSION};
use ephemera::session::{
    AttachmentDescriptor, ClockTick, IdentifierGenerator, MessageKind, MimeCategory, Sender,
    SessionController, SessionError, SessionEvent, SessionId, SessionStatus,
};
use tokio::sync::broadcast;

fn quiet_config(duration_seconds: u64) -> SessionConfig {
    SessionConfig {
        duration_seconds,
        max_duration_seconds: 3600,
        welcome_messages: false,
    }
}

fn new_controller(duration_seconds: u64) -> SessionController {
    let mut generator = IdentifierGenerator::new();
    SessionController::create(&mut generator, &quiet_config(duration_seconds))
        .expect("create failed")
}

fn drain(rx: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn count_terminal(events: &[SessionEvent]) -> (usize, usize) {
    let expired = events
        .iter()
        .filter(|e| matches!(e, SessionEvent::Expired))
        .count();
    let ended = events
        .iter()
        .filter(|e| matches!(e, SessionEvent::Ended))
        .count();
    (expired, ended)
}

#[test]
fn test_create_starts_active_with_full_countdown() {
    let controller = new_controller(1800);
    let snapshot = controller.snapshot();

    assert_eq!(snapshot.status, SessionStatus::Active);
    assert_eq!(snapshot.remaining_seconds, 1800);
    assert!(snapshot.messages.is_empty());
}

#[test]
fn test_create_seeds_welcome_messages() {
    let mut generator = IdentifierGenerator::new();
    let config = SessionConfig::default();
    let controller = SessionController::create(&mut generator, &config).unwrap();

    let messages = controller.snapshot().messages;
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| m.sender() == Sender::Peer));
    assert!(messages.iter().all(|m| m.kind() == MessageKind::Text));
}

#[test]
fn test_send_text_appends_in_call_order() {
    let mut controller = new_controller(1800);
    let texts = ["first", "  second  ", "third"];

    for text in texts {
        controller.send_text(text).unwrap();
    }

    let messages = controller.snapshot().messages;
    assert_eq!(messages.len(), texts.len());
    for (message, text) in messages.iter().zip(texts) {
        assert_eq!(message.as_text(), Some(text));
        assert_eq!(message.sender(), Sender::Local);
    }
}

#[test]
fn test_whitespace_only_text_is_rejected() {
    let mut controller = new_controller(1800);
    controller.send_text("hello").unwrap();

    let result = controller.send_text("   ");

    assert!(matches!(result, Err(SessionError::EmptyMessage)));
    assert_eq!(controller.snapshot().messages.len(), 1);
}

#[test]
fn test_send_text_emits_append_and_outbound() {
    let mut controller = new_controller(1800);
    let mut events = controller.subscribe();

    let message = controller.send_text("hi").unwrap();

    let events = drain(&mut events);
    assert!(matches!(&events[0], SessionEvent::MessageAppended(m) if *m == message));
    assert!(matches!(
        &events[1],
        SessionEvent::Outbound(PeerFrame { body: FrameBody::Text { text }, .. }) if text == "hi"
    ));
}

#[test]
fn test_attach_file_appends_descriptor() {
    let mut controller = new_controller(1800);

    let message = controller
        .attach_file("slides.pdf", 1_572_864, "application/pdf")
        .unwrap();

    let descriptor = message.as_attachment().expect("attachment message");
    assert_eq!(descriptor.human_size, "1.5 MB");
    assert_eq!(descriptor.mime_category, MimeCategory::Document);
    assert_eq!(controller.snapshot().messages.len(), 1);
}

#[test]
fn test_attach_file_negative_size_leaves_log_unchanged() {
    let mut controller = new_controller(1800);

    let result = controller.attach_file("broken", -5, "image/png");

    assert!(matches!(result, Err(SessionError::InvalidSize(-5))));
    assert!(controller.snapshot().messages.is_empty());
}

#[test]
fn test_expiry_clears_log_and_closes_session() {
    let mut controller = new_controller(3);
    let mut events = controller.subscribe();
    controller.send_text("soon gone").unwrap();

    assert_eq!(controller.on_tick(), ClockTick::Running(2));
    assert_eq!(controller.on_tick(), ClockTick::Running(1));
    assert_eq!(controller.on_tick(), ClockTick::Expired);
    assert_eq!(controller.on_tick(), ClockTick::Idle);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.status, SessionStatus::Expired);
    assert!(snapshot.messages.is_empty());
    assert_eq!(count_terminal(&drain(&mut events)), (1, 0));

    assert!(matches!(
        controller.send_text("too late"),
        Err(SessionError::SessionClosed {
            status: SessionStatus::Expired
        })
    ));
    assert!(matches!(
        controller.attach_file("a.png", 10, "image/png"),
        Err(SessionError::SessionClosed { .. })
    ));
}

#[test]
fn test_end_twice_emits_one_event() {
    let mut controller = new_controller(1800);
    let mut events = controller.subscribe();
    controller.send_text("bye").unwrap();

    controller.end();
    controller.end();

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.status, SessionStatus::Ended);
    assert!(snapshot.messages.is_empty());
    assert_eq!(count_terminal(&drain(&mut events)), (0, 1));
}

#[test]
fn test_end_stops_the_clock() {
    let mut controller = new_controller(5);
    controller.end();

    assert_eq!(controller.on_tick(), ClockTick::Idle);
    assert_eq!(controller.snapshot().remaining_seconds, 5);
    assert_eq!(controller.status(), SessionStatus::Ended);
}

#[test]
fn test_commands_after_end_fail_with_session_closed() {
    let mut controller = new_controller(1800);
    controller.end();

    assert!(matches!(
        controller.send_text("hello"),
        Err(SessionError::SessionClosed {
            status: SessionStatus::Ended
        })
    ));
    assert!(matches!(
        controller.extend(60),
        Err(SessionError::SessionClosed { .. })
    ));
}

#[test]
fn test_extend_adds_time_up_to_maximum() {
    let mut controller = new_controller(1800);

    assert_eq!(controller.extend(600).unwrap(), 2400);
    assert_eq!(controller.extend(0).unwrap(), 2400);
    assert_eq!(controller.extend(10_000).unwrap(), 3600);
}

#[test]
fn test_join_validates_reference() {
    let config = quiet_config(60);

    let joined = SessionController::join("https://chat.example.com/chat/Abc123", &config).unwrap();
    assert_eq!(joined.id().as_str(), "Abc123");

    let bare = SessionController::join("Abc123", &config).unwrap();
    assert_eq!(bare.id().as_str(), "Abc123");

    assert!(matches!(
        SessionController::join("not a valid id", &config),
        Err(SessionError::InvalidSessionId(_))
    ));
    assert!(matches!(
        SessionController::join("https://chat.example.com/lobby", &config),
        Err(SessionError::InvalidSessionId(_))
    ));
}

#[test]
fn test_peer_frames_are_appended_as_peer() {
    let mut controller = new_controller(1800);
    let id = controller.id().clone();

    controller
        .deliver_peer(PeerFrame::text(id.clone(), "hello from afar"))
        .unwrap();
    let descriptor = AttachmentDescriptor::describe("clip.mp4", 2048, "video/mp4").unwrap();
    controller
        .deliver_peer(PeerFrame::attachment(id, descriptor))
        .unwrap();

    let messages = controller.snapshot().messages;
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| m.sender() == Sender::Peer));
    assert_eq!(messages[1].kind(), MessageKind::Attachment);
}

#[test]
fn test_peer_end_frame_ends_session() {
    let mut controller = new_controller(1800);
    let mut events = controller.subscribe();
    let id = controller.id().clone();

    let result = controller.deliver_peer(PeerFrame::end(id)).unwrap();

    assert!(result.is_none());
    assert_eq!(controller.status(), SessionStatus::Ended);
    let events = drain(&mut events);
    assert_eq!(count_terminal(&events), (0, 1));
    assert!(!events
        .iter()
        .any(|e| matches!(e, SessionEvent::Outbound(_))));
}

#[test]
fn test_peer_attachment_descriptor_is_rederived() {
    let mut controller = new_controller(1800);
    let forged = AttachmentDescriptor {
        file_name: "setup.exe".to_string(),
        byte_size: 1536,
        human_size: "1 Bytes".to_string(),
        mime_type: "application/x-msdownload".to_string(),
        mime_category: MimeCategory::Image,
    };

    let id = controller.id().clone();

    let message = controller
        .deliver_peer(PeerFrame::attachment(id, forged))
        .unwrap()
        .expect("attachment message");

    let stored = message.as_attachment().expect("attachment body");
    assert_eq!(stored.byte_size, 1536);
    assert_eq!(stored.human_size, "1.5 KB");
    assert_eq!(stored.mime_category, MimeCategory::Other);
    assert_eq!(stored.file_name, "setup.exe");
}

#[test]
fn test_peer_attachment_without_name_is_rejected() {
    let mut controller = new_controller(1800);
    let mut descriptor = AttachmentDescriptor::describe("a.png", 10, "image/png").unwrap();
    descriptor.file_name = "  ".to_string();

    let id = controller.id().clone();

    let result = controller.deliver_peer(PeerFrame::attachment(id, descriptor));

    assert!(matches!(result, Err(SessionError::InvalidMessage(_))));
    assert!(controller.snapshot().messages.is_empty());
}

#[test]
fn test_peer_attachment_size_out_of_range_is_rejected() {
    let mut controller = new_controller(1800);
    let mut descriptor =
        AttachmentDescriptor::describe("big.bin", 10, "application/zip").unwrap();
    descriptor.byte_size = u64::MAX;

    let id = controller.id().clone();

    let result = controller.deliver_peer(PeerFrame::attachment(id, descriptor));

    assert!(matches!(result, Err(SessionError::InvalidMessage(_))));
    assert!(controller.snapshot().messages.is_empty());
}

#[test]
fn test_peer_frame_with_unknown_version_is_rejected() {
    let mut controller = new_controller(1800);
    let mut frame = PeerFrame::text(controller.id().clone(), "from the future");
    frame.protocol_version = PROTOCOL_VERSION + 7;

    let result = controller.deliver_peer(frame);

    assert!(matches!(result, Err(SessionError::InvalidMessage(_))));
    assert!(controller.snapshot().messages.is_empty());
    assert_eq!(controller.status(), SessionStatus::Active);
}

#[test]
fn test_peer_frame_for_other_session_is_rejected() {
    let mut controller = new_controller(1800);
    let other = SessionId::parse("SomeoneElse").unwrap();

    let result = controller.deliver_peer(PeerFrame::text(other, "wrong room"));

    assert!(matches!(result, Err(SessionError::InvalidSessionId(_))));
    assert!(controller.snapshot().messages.is_empty());
}

#[test]
fn test_clock_failure_keeps_remaining_and_closes() {
    let mut controller = new_controller(1800);
    let mut events = controller.subscribe();
    controller.on_tick();

    controller.on_clock_failure();
    controller.on_clock_failure();

    assert_eq!(controller.snapshot().remaining_seconds, 1799);
    assert_eq!(controller.status(), SessionStatus::Ended);
    let events = drain(&mut events);
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, SessionEvent::ClockFailure))
            .count(),
        1
    );
    assert_eq!(count_terminal(&events), (0, 1));
}
