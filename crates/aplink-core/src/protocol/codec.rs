//! Envelope codec: UTF-8 JSON text as bytes, no extra framing.
//!
//! Decoding is attempted once per frame. Anything that is not a JSON object
//! yields a `DecodeFailure` marker instead of an error: the data channel also
//! carries frames that belong to other layers, and those are simply not ours.

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;

use crate::error::{AplinkError, Result};
use crate::protocol::envelope::Envelope;
use crate::protocol::messages::TypedMessage;

/// Why a frame was not decoded into an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeFailure {
    /// Bytes are not valid UTF-8.
    NotUtf8,
    /// Text is not valid JSON.
    NotJson,
    /// Valid JSON, but not an object.
    NotObject,
}

impl DecodeFailure {
    /// Label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            DecodeFailure::NotUtf8 => "not_utf8",
            DecodeFailure::NotJson => "not_json",
            DecodeFailure::NotObject => "not_object",
        }
    }
}

/// Serialize any value to UTF-8 JSON bytes.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|e| AplinkError::Encode(format!("json encode failed: {e}")))
}

/// Serialize a typed payload, injecting its `type` discriminator.
pub fn encode_message<M: TypedMessage>(msg: &M) -> Result<Bytes> {
    let value = serde_json::to_value(msg)
        .map_err(|e| AplinkError::Encode(format!("json encode failed: {e}")))?;
    let Value::Object(mut fields) = value else {
        return Err(AplinkError::Encode(format!(
            "{} payload must serialize to an object",
            M::KIND
        )));
    };
    fields.insert("type".to_string(), Value::String(M::KIND.to_string()));
    encode(&Value::Object(fields))
}

/// Decode one frame.
pub fn decode(buf: &[u8]) -> std::result::Result<Envelope, DecodeFailure> {
    let text = std::str::from_utf8(buf).map_err(|_| DecodeFailure::NotUtf8)?;
    let value: Value = serde_json::from_str(text).map_err(|_| DecodeFailure::NotJson)?;
    match value {
        Value::Object(fields) => Ok(Envelope::from_object(fields)),
        _ => Err(DecodeFailure::NotObject),
    }
}
