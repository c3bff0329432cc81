//! Message discriminators carried in the envelope `type` field.

use std::fmt;

/// Known message kinds, plus a passthrough for kinds this build does not know.
///
/// Feature adapters are added over time, so an unrecognized `type` is never an
/// error: it decodes to `Other` and still reaches prefix and wildcard handlers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// `RAISE_HAND`: a participant raised or lowered their hand.
    RaiseHand,
    /// `translation_audio`: translated speech broadcast to the room.
    TranslationAudio,
    /// `chat_message`: in-call text chat.
    ChatMessage,
    /// Any other `type` value, kept verbatim.
    Other(String),
}

impl MessageKind {
    pub const RAISE_HAND: &'static str = "RAISE_HAND";
    pub const TRANSLATION_AUDIO: &'static str = "translation_audio";
    pub const CHAT_MESSAGE: &'static str = "chat_message";

    /// Wire string for this kind.
    pub fn as_str(&self) -> &str {
        match self {
            MessageKind::RaiseHand => Self::RAISE_HAND,
            MessageKind::TranslationAudio => Self::TRANSLATION_AUDIO,
            MessageKind::ChatMessage => Self::CHAT_MESSAGE,
            MessageKind::Other(s) => s,
        }
    }

    /// True for kinds this build has a typed payload for.
    pub fn is_known(&self) -> bool {
        !matches!(self, MessageKind::Other(_))
    }
}

impl From<&str> for MessageKind {
    fn from(s: &str) -> Self {
        match s {
            Self::RAISE_HAND => MessageKind::RaiseHand,
            Self::TRANSLATION_AUDIO => MessageKind::TranslationAudio,
            Self::CHAT_MESSAGE => MessageKind::ChatMessage,
            other => MessageKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
