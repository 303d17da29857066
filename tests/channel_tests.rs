// Tests for channel message shapes and the pre-open send queue.

use interview_live::audio::OutboundFrame;
use interview_live::channel::{PendingSends, ServerEvent};

fn frame(tag: u8) -> OutboundFrame {
    OutboundFrame {
        pcm: vec![tag; 4],
        sample_rate: 16000,
        channels: 1,
    }
}

#[test]
fn test_pending_sends_queue_then_flush_preserves_order() {
    let pending = PendingSends::new();

    assert!(pending.push(frame(1)));
    assert!(pending.push(frame(2)));
    assert!(pending.push(frame(3)));

    let flushed = pending.flush();
    let tags: Vec<u8> = flushed.iter().map(|f| f.pcm[0]).collect();
    assert_eq!(tags, vec![1, 2, 3]);
}

#[test]
fn test_pending_sends_bypass_after_flush() {
    let pending = PendingSends::new();

    pending.push(frame(1));
    assert_eq!(pending.flush().len(), 1);

    // Once flushed, frames go straight to the transport.
    assert!(!pending.push(frame(2)));
    assert!(pending.flush().is_empty());
}

#[test]
fn test_server_event_fields_all_default() {
    // The remote protocol sends sparse messages; every field is optional.
    let event: ServerEvent = serde_json::from_str("{}").expect("empty message parses");

    assert!(event.user_transcript.is_none());
    assert!(event.ai_transcript.is_none());
    assert!(event.audio.is_none());
    assert!(!event.turn_complete);
}

#[test]
fn test_server_event_combined_message() {
    let json = r#"{
        "ai_transcript": "And why this company?",
        "audio": "AAAA",
        "turn_complete": true
    }"#;

    let event: ServerEvent = serde_json::from_str(json).expect("parses");

    assert_eq!(event.ai_transcript.as_deref(), Some("And why this company?"));
    assert_eq!(event.audio.as_deref(), Some("AAAA"));
    assert!(event.turn_complete);
    assert!(event.user_transcript.is_none());
}
