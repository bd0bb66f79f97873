//! vigil core: metric collectors, the scrape registry, and the guards that
//! sit in front of every scrape.
//!
//! This crate defines the collection contract shared by the exporter and by
//! host applications that register their own metric families. It carries no
//! transport dependencies so it can be embedded behind any HTTP stack.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! A failing value source surfaces as `VigilError`/`Result` and is isolated
//! to its own family; it never takes the scrape down with it.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod access;
pub mod baseline;
pub mod error;
pub mod metric;
pub mod registry;
pub mod rundown;

pub use access::AccessGuard;
/// Shared result type.
pub use error::{Result, VigilError};
pub use metric::{
    CallbackCollector, Collector, LabeledInstance, MetricDescriptor, MetricKind, Sample,
    ValueSource,
};
pub use registry::{FamilySnapshot, Registry, ScrapeFailure, Snapshot};
pub use rundown::{RundownGuard, RundownPermit, RundownState};
