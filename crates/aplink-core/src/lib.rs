//! APLink core: transport-agnostic data-channel primitives and error types.
//!
//! This crate defines the envelope wire format exchanged over a call room's
//! data channel, the closed set of message kinds the app understands, and the
//! error surface shared by the bus and its feature adapters. It carries no
//! transport or runtime dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Malformed frames
//! surface as a `DecodeFailure` marker, everything else as `AplinkError`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{AplinkError, ErrorCode, Result};
