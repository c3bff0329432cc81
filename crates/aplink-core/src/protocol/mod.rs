//! Data-channel protocol modules.
//!
//! - `kind`: the closed set of message discriminators (plus passthrough).
//! - `envelope`: a decoded frame, `type` plus arbitrary fields.
//! - `messages`: typed payloads for the kinds the app publishes.
//! - `codec`: UTF-8 JSON encode / decode-once with a "not ours" marker.
//!
//! Decoding never panics: frames that are not JSON objects are reported as
//! `DecodeFailure` so callers can drop media/control traffic silently.

pub mod codec;
pub mod envelope;
pub mod kind;
pub mod messages;

pub use codec::{decode, encode, encode_message, DecodeFailure};
pub use envelope::Envelope;
pub use kind::MessageKind;
pub use messages::{ChatMessage, RaiseHandMessage, TranslationAudioMessage, TypedMessage};
