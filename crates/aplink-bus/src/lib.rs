//! APLink in-call message bus.
//!
//! One dispatcher per room decodes every data-channel frame once and fans it
//! out to exact, prefix, and wildcard subscribers. Feature adapters (raise
//! hand, translation broadcast, chat) sit on top, and the app shell keeps a
//! single call session that outlives any one screen.

pub mod app_state;
pub mod audio;
pub mod config;
pub mod dispatch;
pub mod obs;
pub mod policy;
pub mod services;
pub mod session;
pub mod transport;
