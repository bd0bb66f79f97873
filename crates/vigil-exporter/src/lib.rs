//! vigil exporter: the HTTP boundary around the metrics registry.
//!
//! This crate wires the health and metrics read paths, the admission and
//! access guards, and the exposition encoder into an axum router, and owns
//! the controller lifecycle (register, start, drain, destroy). It is
//! intended to be embedded by host processes and exercised by integration
//! tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod app_state;
pub mod config;
pub mod controller;
pub mod guard;
pub mod obs;
pub mod ops;
pub mod router;

pub use app_state::{AppState, HealthCallback};
pub use config::ExporterConfig;
pub use controller::{Controller, ControllerBuilder};
