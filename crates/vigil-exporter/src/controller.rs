//! Metrics controller: owns the registry and guards, and optionally the
//! listener serving them.
//!
//! Lifecycle:
//! 1. `Controller::builder(cfg).health(cb).build()`
//! 2. register families (`create_*`), single-threaded
//! 3. `start()` for an owned listener, or `router()` to attach to a host
//!    server; either one freezes the registry
//! 4. `destroy()`: drain admitted requests, stop the listener, drop state

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use axum::Router;
use vigil_core::error::{Result, VigilError};
use vigil_core::{AccessGuard, Collector, Registry, RundownGuard, ValueSource};

use crate::app_state::{AppState, HealthCallback};
use crate::config::ExporterConfig;
use crate::router;

pub struct ControllerBuilder {
    config: ExporterConfig,
    health: Option<HealthCallback>,
    registry: Option<Registry>,
    external: bool,
}

impl ControllerBuilder {
    pub fn health(mut self, cb: HealthCallback) -> Self {
        self.health = Some(cb);
        self
    }

    /// Serve through a host-owned server via [`Controller::router`] instead
    /// of binding a listener.
    pub fn attach_external(mut self) -> Self {
        self.external = true;
        self
    }

    /// Start from a caller-built registry instead of `Registry::new()`.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> Result<Controller> {
        let Self {
            mut config,
            health,
            registry,
            external,
        } = self;

        config.validate()?;
        let health = health.ok_or_else(|| VigilError::Config("invalid health callback".into()))?;

        let access = match config.access.token.take() {
            Some(secret) => AccessGuard::from_secret(secret),
            None => AccessGuard::disabled(),
        };

        Ok(Controller {
            config,
            registry: Arc::new(registry.unwrap_or_else(Registry::new)),
            rundown: Arc::new(RundownGuard::new()),
            access: Arc::new(access),
            health,
            external,
            server: None,
        })
    }
}

/// Dropping this (with the controller) also signals graceful shutdown.
struct RunningServer {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

pub struct Controller {
    config: ExporterConfig,
    registry: Arc<Registry>,
    rundown: Arc<RundownGuard>,
    access: Arc<AccessGuard>,
    health: HealthCallback,
    external: bool,
    server: Option<RunningServer>,
}

impl Controller {
    pub fn builder(config: ExporterConfig) -> ControllerBuilder {
        ControllerBuilder {
            config,
            health: None,
            registry: None,
            external: false,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn rundown(&self) -> &Arc<RundownGuard> {
        &self.rundown
    }

    pub fn access(&self) -> &Arc<AccessGuard> {
        &self.access
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.as_ref().map(|s| s.local_addr)
    }

    /// Mutable registry access; only available until the first router is
    /// built.
    fn registry_mut(&mut self) -> Result<&mut Registry> {
        Arc::get_mut(&mut self.registry).ok_or_else(|| {
            VigilError::Config("registry is frozen once the exporter is serving".into())
        })
    }

    pub fn register<C>(&mut self, collector: C) -> Result<()>
    where
        C: Collector + 'static,
    {
        self.registry_mut()?.register(collector)
    }

    pub fn create_counter(&mut self, name: &str, help: &str, source: ValueSource) -> Result<()> {
        self.registry_mut()?.create_counter(name, help, source)
    }

    pub fn create_gauge(&mut self, name: &str, help: &str, source: ValueSource) -> Result<()> {
        self.registry_mut()?.create_gauge(name, help, source)
    }

    pub fn create_counter_vec<I>(
        &mut self,
        name: &str,
        help: &str,
        label_names: &[&str],
        entries: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = (Vec<String>, ValueSource)>,
    {
        self.registry_mut()?
            .create_counter_vec(name, help, label_names, entries)
    }

    pub fn create_gauge_vec<I>(
        &mut self,
        name: &str,
        help: &str,
        label_names: &[&str],
        entries: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = (Vec<String>, ValueSource)>,
    {
        self.registry_mut()?
            .create_gauge_vec(name, help, label_names, entries)
    }

    /// Router serving `/health`, `/metrics` and the optional debug routes.
    /// Freezes the registry.
    pub fn router(&self) -> Router {
        let state = AppState::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.rundown),
            Arc::clone(&self.access),
            self.health.clone(),
        );
        router::build_router(state, &self.config)
    }

    /// Bind the internal listener and serve in the background. Returns the
    /// bound address (useful with port 0).
    pub async fn start(&mut self) -> Result<SocketAddr> {
        if self.external {
            return Err(VigilError::Config("cannot start an external web server".into()));
        }
        if self.server.is_some() {
            return Err(VigilError::Config("metrics web server already started".into()));
        }

        let server = &self.config.server;
        let listener = TcpListener::bind((server.address.as_str(), server.port))
            .await
            .map_err(|e| {
                VigilError::Internal(format!(
                    "unable to bind metrics web server on {}:{}: {e}",
                    server.address, server.port
                ))
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| VigilError::Internal(format!("local_addr failed: {e}")))?;

        let app = self.router();
        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = rx.await;
                })
                .await
        });

        tracing::info!(%local_addr, name = %self.config.server.name, "metrics web server started");
        self.server = Some(RunningServer {
            local_addr,
            shutdown: tx,
            task,
        });
        Ok(local_addr)
    }

    /// Drain, stop, and release everything. Returns only after the last
    /// admitted request has finished; the access token is zeroed right after
    /// the drain.
    ///
    /// Routers handed to a host keep their state alive, but every request
    /// through them is refused from here on and no collector is read again.
    pub async fn destroy(mut self) {
        self.rundown.shutdown().await;
        self.access.revoke();

        if let Some(server) = self.server.take() {
            let _ = server.shutdown.send(());
            match server.task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "metrics web server stopped with error"),
                Err(e) => tracing::warn!(error = %e, "metrics web server task failed"),
            }
        }
        tracing::info!("metrics controller destroyed");
    }
}
