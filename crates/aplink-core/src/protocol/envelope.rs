//! Decoded data-channel envelope.
//!
//! An envelope is a JSON object with a `type` discriminator and any number of
//! payload fields. It is decoded once per received frame and then shared by
//! reference with every handler; typed views are built from the already
//! parsed fields, never from the raw bytes again.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{AplinkError, Result};
use crate::protocol::kind::MessageKind;

/// Envelope (decoded frame).
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    kind: Option<MessageKind>,
    fields: Map<String, Value>,
}

impl Envelope {
    /// Build from a parsed JSON object. A non-string `type` counts as absent.
    pub fn from_object(fields: Map<String, Value>) -> Self {
        let kind = fields
            .get("type")
            .and_then(Value::as_str)
            .map(MessageKind::from);
        Self { kind, fields }
    }

    /// Message kind, if the envelope carries a string `type`.
    pub fn kind(&self) -> Option<&MessageKind> {
        self.kind.as_ref()
    }

    /// Raw `type` string.
    pub fn msg_type(&self) -> Option<&str> {
        self.kind.as_ref().map(MessageKind::as_str)
    }

    /// Single payload field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// String payload field.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// All fields, including `type`.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Typed view of the payload (unknown fields are ignored by the target).
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.fields.clone())).map_err(|e| {
            AplinkError::BadRequest(format!(
                "invalid {} payload: {e}",
                self.msg_type().unwrap_or("<untyped>")
            ))
        })
    }

    /// Consume into the underlying JSON object.
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}
