//! Lightweight in-process metrics (dependency-free).
//!
//! Counters for frames, drops, handler failures and publishes, rendered in
//! Prometheus text format by `BusMetrics::render`.

pub mod metrics;

pub use metrics::BusMetrics;
