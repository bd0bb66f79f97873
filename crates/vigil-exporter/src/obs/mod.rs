//! Exposition encoding for registry snapshots.
//!
//! Renders the Prometheus text format (0.0.4) by default and OpenMetrics
//! 1.0.0 when the scraper asks for it.

pub mod exposition;

pub use exposition::{render, Format};
