//! Health & metrics exporter demo.
//!
//! Serves `/health`, `/metrics` and `/debug/pprof/` on 127.0.0.1:3000 until
//! Ctrl+C, then drains in-flight requests and shuts down.
//!
//! `RUST_LOG=debug cargo run -p vigil --example serve`

use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use vigil::core::ValueSource;
use vigil::exporter::{config, Controller, HealthCallback};

#[derive(Serialize)]
struct State {
    system: &'static str,
}

fn entries() -> Vec<(Vec<String>, ValueSource)> {
    ["Value 1", "Value 2", "Value 3"]
        .into_iter()
        .map(|v| (vec!["Set A".to_string(), v.to_string()], ValueSource::new(rand::random::<f64>)))
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cfg = config::load_from_str(
        r#"
version: 1
server:
  address: "127.0.0.1"
  port: 3000
http:
  enable_debug_profiles: true
  include_cors: true
  disable_client_cache: true
"#,
    )?;

    let mut controller = Controller::builder(cfg)
        .health(HealthCallback::json(|| State {
            system: "all services running",
        }))
        .build()?;

    controller.create_counter(
        "random_counter",
        "A random counter",
        ValueSource::new(rand::random::<f64>),
    )?;
    controller.create_counter_vec(
        "random_counter_vec",
        "A random counter vector",
        &["set", "value"],
        entries(),
    )?;
    controller.create_gauge_vec(
        "random_gauge_vec",
        "A random gauge vector",
        &["set", "value"],
        entries(),
    )?;

    let addr = controller.start().await?;
    tracing::info!(%addr, "open http://{addr}/metrics");

    tokio::signal::ctrl_c().await?;
    tracing::info!("signal received, shutting down");
    controller.destroy().await;
    Ok(())
}
