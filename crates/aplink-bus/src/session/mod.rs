//! Active-call session state shared across UI boundaries.

pub mod call_session;

pub use call_session::{CallEvents, CallPhase, CallSessionStore, CallSnapshot, StartCall, UiNode};
