//! Transport boundary.
//!
//! `Room` is the contract the bus consumes from the real-time platform;
//! `loopback` is an in-memory implementation of it.

pub mod loopback;
pub mod room;

pub use loopback::{LoopbackHub, LoopbackRoom};
pub use room::{DataCallback, ListenerId, Participant, ParticipantCallback, PublishOptions, Room};
