//! Shared error type across APLink crates.

use thiserror::Error;

/// Stable error codes (safe to surface in logs and UI toasts).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid input / malformed message.
    BadRequest,
    /// Envelope could not be serialized.
    EncodeFailed,
    /// Transport rejected or failed to send.
    PublishFailed,
    /// No Room/transport is attached.
    NoTransport,
    /// Audio resource could not be acquired or played.
    AudioUnavailable,
    /// Invalid configuration.
    BadConfig,
    /// Unsupported config/protocol version.
    UnsupportedVersion,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs and metrics labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::EncodeFailed => "ENCODE_FAILED",
            ErrorCode::PublishFailed => "PUBLISH_FAILED",
            ErrorCode::NoTransport => "NO_TRANSPORT",
            ErrorCode::AudioUnavailable => "AUDIO_UNAVAILABLE",
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, AplinkError>;

/// Unified error type used by core and bus.
#[derive(Debug, Error)]
pub enum AplinkError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("publish failed: {0}")]
    Publish(String),
    #[error("no transport available")]
    NoTransport,
    #[error("audio: {0}")]
    Audio(String),
    #[error("config: {0}")]
    Config(String),
    #[error("unsupported version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl AplinkError {
    /// Map an error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            AplinkError::BadRequest(_) => ErrorCode::BadRequest,
            AplinkError::Encode(_) => ErrorCode::EncodeFailed,
            AplinkError::Publish(_) => ErrorCode::PublishFailed,
            AplinkError::NoTransport => ErrorCode::NoTransport,
            AplinkError::Audio(_) => ErrorCode::AudioUnavailable,
            AplinkError::Config(_) => ErrorCode::BadConfig,
            AplinkError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            AplinkError::Internal(_) => ErrorCode::Internal,
        }
    }
}
