//! Dispatcher module exports.
//!
//! Re-exports the per-room dispatcher, its registry, and subscription keys so
//! feature adapters can depend on this module directly.

pub mod dispatcher;
pub mod registry;
pub mod route;

pub use dispatcher::{Dispatcher, Handler, Subscription};
pub use registry::DispatcherRegistry;
pub use route::{SubscriptionKey, Topics, PREFIX_MARKER};
