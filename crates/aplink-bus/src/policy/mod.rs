//! Rate policies shared by feature adapters.

pub mod throttle;

pub use throttle::MinIntervalThrottle;
