//! Typed payload encoding and envelope views.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use aplink_core::protocol::{
    decode, encode, encode_message, MessageKind, RaiseHandMessage, TranslationAudioMessage,
};
use serde_json::json;

#[test]
fn encode_message_injects_type_and_camel_case_fields() {
    let msg = RaiseHandMessage {
        participant_identity: "alice".into(),
        participant_name: "Alice".into(),
        raised: true,
        timestamp: 42,
    };
    let bytes = encode_message(&msg).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(value["type"], "RAISE_HAND");
    assert_eq!(value["participantIdentity"], "alice");
    assert_eq!(value["participantName"], "Alice");
    assert_eq!(value["raised"], true);
    assert_eq!(value["timestamp"], 42);
}

#[test]
fn envelope_payload_reads_typed_view() {
    let bytes = encode(&json!({
        "type": "translation_audio",
        "audioBase64": "AAEC",
        "text": "hola",
        "originalText": "hello",
        "sourceLang": "en",
        "senderName": "Bob",
        "timestamp": 7,
        "extra": "ignored"
    }))
    .unwrap();

    let env = decode(&bytes).unwrap();
    assert_eq!(env.kind(), Some(&MessageKind::TranslationAudio));

    let msg: TranslationAudioMessage = env.payload().unwrap();
    assert_eq!(msg.text, "hola");
    assert_eq!(msg.original_text, "hello");
    assert_eq!(msg.sender_name, "Bob");
}

#[test]
fn payload_mismatch_is_bad_request() {
    let env = decode(br#"{"type":"RAISE_HAND","participantIdentity":5}"#).unwrap();
    let err = env.payload::<RaiseHandMessage>().expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_REQUEST");
}

#[test]
fn non_string_type_counts_as_absent() {
    let env = decode(br#"{"type":17,"x":1}"#).unwrap();
    assert!(env.kind().is_none());
    assert_eq!(env.get("x"), Some(&json!(1)));
}

#[test]
fn kind_round_trips_through_strings() {
    assert_eq!(MessageKind::from("chat_message"), MessageKind::ChatMessage);
    assert_eq!(MessageKind::from("TIMER_START").as_str(), "TIMER_START");
    assert!(!MessageKind::from("TIMER_START").is_known());
}
