//! Shared request state for the exporter routes.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use vigil_core::{AccessGuard, Registry, RundownGuard};

type HealthFn = dyn Fn() -> String + Send + Sync;

/// Supplies the `/health` body. Called on every request; the result is
/// rendered as-is.
#[derive(Clone)]
pub struct HealthCallback {
    f: Arc<HealthFn>,
}

impl HealthCallback {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    /// Serialize whatever `f` returns as JSON on each call.
    pub fn json<T, F>(f: F) -> Self
    where
        T: Serialize,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::new(move || {
            serde_json::to_string(&f()).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "health value not serializable");
                String::new()
            })
        })
    }

    pub fn call(&self) -> String {
        (self.f)()
    }
}

impl fmt::Debug for HealthCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HealthCallback(..)")
    }
}

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    registry: Arc<Registry>,
    rundown: Arc<RundownGuard>,
    access: Arc<AccessGuard>,
    health: HealthCallback,
}

impl AppState {
    pub fn new(
        registry: Arc<Registry>,
        rundown: Arc<RundownGuard>,
        access: Arc<AccessGuard>,
        health: HealthCallback,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                registry,
                rundown,
                access,
                health,
            }),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn rundown(&self) -> &Arc<RundownGuard> {
        &self.inner.rundown
    }

    pub fn access(&self) -> &AccessGuard {
        &self.inner.access
    }

    pub fn health(&self) -> &HealthCallback {
        &self.inner.health
    }
}
