//! Top-level facade crate for vigil.
//!
//! Re-exports the core collectors and the HTTP exporter so users can depend
//! on a single crate.

pub mod core {
    pub use vigil_core::*;
}

pub mod exporter {
    pub use vigil_exporter::*;
}
