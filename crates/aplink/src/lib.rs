//! Top-level facade crate for APLink.
//!
//! Re-exports the wire primitives and the in-call bus so apps can depend on a single crate.

pub mod core {
    pub use aplink_core::*;
}

pub mod bus {
    pub use aplink_bus::*;
}
