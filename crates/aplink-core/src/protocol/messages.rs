//! Typed payloads for the message kinds APLink publishes.
//!
//! Field names follow the JSON wire format (camelCase). The `type` field is
//! not part of these structs; `codec::encode_message` injects it from
//! `TypedMessage::KIND`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::protocol::kind::MessageKind;

/// Payload with a fixed discriminator.
pub trait TypedMessage: Serialize + DeserializeOwned {
    /// Wire value of the `type` field.
    const KIND: &'static str;

    fn kind() -> MessageKind {
        MessageKind::from(Self::KIND)
    }
}

/// `RAISE_HAND` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaiseHandMessage {
    pub participant_identity: String,
    #[serde(default)]
    pub participant_name: String,
    pub raised: bool,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: u64,
}

impl TypedMessage for RaiseHandMessage {
    const KIND: &'static str = MessageKind::RAISE_HAND;
}

/// `translation_audio` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationAudioMessage {
    /// Base64 (standard alphabet, padded) audio bytes.
    pub audio_base64: String,
    pub text: String,
    #[serde(default)]
    pub original_text: String,
    #[serde(default)]
    pub source_lang: String,
    #[serde(default)]
    pub sender_name: String,
    #[serde(default)]
    pub timestamp: u64,
}

impl TypedMessage for TranslationAudioMessage {
    const KIND: &'static str = MessageKind::TRANSLATION_AUDIO;
}

/// `chat_message` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub participant_identity: String,
    #[serde(default)]
    pub participant_name: String,
    pub text: String,
    #[serde(default)]
    pub timestamp: u64,
}

impl TypedMessage for ChatMessage {
    const KIND: &'static str = MessageKind::CHAT_MESSAGE;
}
