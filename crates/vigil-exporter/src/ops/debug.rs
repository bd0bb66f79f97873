//! Lightweight runtime introspection under `/debug/pprof`.
//!
//! Mounted only when `http.enable_debug_profiles` is set, behind the same
//! access guard as `/metrics`.

use axum::{routing::get, Router};
use tokio::runtime::Handle;

use crate::app_state::AppState;

const INDEX: &str = "\
/debug/pprof/

cmdline: the running program's command line, NUL-separated
runtime: tokio runtime worker and task counts
";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/debug/pprof/", get(index))
        .route("/debug/pprof/cmdline", get(cmdline))
        .route("/debug/pprof/runtime", get(runtime))
}

async fn index() -> &'static str {
    INDEX
}

async fn cmdline() -> String {
    std::env::args().collect::<Vec<_>>().join("\0")
}

async fn runtime() -> String {
    let m = Handle::current().metrics();
    format!(
        "workers: {}\nalive_tasks: {}\n",
        m.num_workers(),
        m.num_alive_tasks()
    )
}
