//! Integration tests for peer frame encoding

use ephemera::protocol::{
    decode_frame, deserialize, encode_frame, frame_message, serialize, unframe_message,
    FrameBody, PeerFrame, MAX_MESSAGE_SIZE, PROTOCOL_VERSION,
};
use ephemera::session::{AttachmentDescriptor, SessionId};

fn session_id() -> SessionId {
    SessionId::parse("FrameTest01").unwrap()
}

#[test]
fn test_peer_frame_roundtrip() {
    let descriptor = AttachmentDescriptor::describe("notes.txt", 2048, "text/plain").unwrap();
    let frames = vec![
        PeerFrame::text(session_id(), "hello"),
        PeerFrame::attachment(session_id(), descriptor),
        PeerFrame::end(session_id()),
    ];

    for frame in frames {
        let encoded = serialize(&frame).expect("serialize failed");
        let decoded: PeerFrame = deserialize(&encoded).expect("deserialize failed");
        assert_eq!(frame, decoded);
    }
}

#[test]
fn test_decode_reports_consumed_bytes() {
    let first = encode_frame(&PeerFrame::text(session_id(), "one")).unwrap();
    let second = encode_frame(&PeerFrame::end(session_id())).unwrap();
    let mut buffer = first.clone();
    buffer.extend_from_slice(&second);

    let (frame, consumed) = decode_frame(&buffer).unwrap().expect("complete frame");
    assert_eq!(consumed, first.len());
    assert!(matches!(frame.body, FrameBody::Text { ref text } if text == "one"));

    let (frame, consumed) = decode_frame(&buffer[consumed..])
        .unwrap()
        .expect("complete frame");
    assert_eq!(consumed, second.len());
    assert_eq!(frame.body, FrameBody::End);
}

#[test]
fn test_partial_frame_needs_more_bytes() {
    let encoded = encode_frame(&PeerFrame::text(session_id(), "partial")).unwrap();

    assert!(decode_frame(&encoded[..3]).unwrap().is_none());
    assert!(decode_frame(&encoded[..encoded.len() - 1]).unwrap().is_none());
}

#[test]
fn test_oversized_length_prefix_is_rejected() {
    let mut buffer = (MAX_MESSAGE_SIZE + 1).to_be_bytes().to_vec();
    buffer.extend_from_slice(&[0u8; 16]);

    let err = unframe_message(&buffer).unwrap_err();
    assert!(err.to_string().contains("Message too large"));
}

#[test]
fn test_version_mismatch_is_rejected() {
    let mut frame = PeerFrame::text(session_id(), "from the future");
    frame.protocol_version = PROTOCOL_VERSION + 1;
    let encoded = frame_message(&serialize(&frame).unwrap()).unwrap();

    let err = decode_frame(&encoded).unwrap_err();
    assert!(err.to_string().contains("Protocol version mismatch"));
}

#[test]
fn test_malformed_session_id_fails_to_decode() {
    let frame = PeerFrame::end(session_id());
    let mut bytes = serialize(&frame).unwrap();
    // Corrupt the id in place; '-' is outside the id alphabet.
    let pos = bytes
        .windows(b"FrameTest01".len())
        .position(|w| w == b"FrameTest01")
        .expect("id present in payload");
    bytes[pos] = b'-';

    assert!(deserialize::<PeerFrame>(&bytes).is_err());
}
