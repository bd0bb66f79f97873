//! Metric families and the collectors that materialize them at scrape time.
//!
//! A family is identified by an immutable [`MetricDescriptor`]. Each
//! collector reads its values through [`ValueSource`] callbacks on every
//! `collect()`; nothing is cached between scrapes.

pub mod collector;
pub mod descriptor;
pub mod source;

pub use collector::{CallbackCollector, Collector, LabeledInstance, Sample};
pub use descriptor::{MetricDescriptor, MetricKind};
pub use source::ValueSource;
