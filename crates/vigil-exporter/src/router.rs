//! Axum router wiring.
//!
//! Layer order, outermost first: trace, timeout, body limit, `Server`
//! header, rundown admission, CORS, no-cache headers, then the per-route
//! access token check.

use axum::{
    http::{
        header::{CACHE_CONTROL, EXPIRES, PRAGMA, SERVER},
        HeaderValue,
    },
    middleware,
    routing::get,
    Router,
};
use tower_http::{
    cors::CorsLayer, limit::RequestBodyLimitLayer, set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer, trace::TraceLayer,
};

use crate::{app_state::AppState, config::ExporterConfig, guard, ops};

pub fn build_router(state: AppState, cfg: &ExporterConfig) -> Router {
    let protect = middleware::from_fn_with_state(state.clone(), guard::require_token);

    let mut health = Router::new().route("/health", get(ops::health).head(ops::health_head));
    if cfg.access.require_for_health {
        health = health.route_layer(protect.clone());
    }

    let mut protected = Router::new().route("/metrics", get(ops::metrics));
    if cfg.http.enable_debug_profiles {
        protected = protected.merge(ops::debug::routes());
    }
    let protected = protected.route_layer(protect);

    let mut app = health.merge(protected).with_state(state.clone());

    if cfg.http.disable_client_cache {
        app = app
            .layer(SetResponseHeaderLayer::overriding(
                CACHE_CONTROL,
                HeaderValue::from_static("no-cache, no-store, must-revalidate"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                PRAGMA,
                HeaderValue::from_static("no-cache"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                EXPIRES,
                HeaderValue::from_static("0"),
            ));
    }
    if cfg.http.include_cors {
        app = app.layer(CorsLayer::permissive());
    }

    let server_name = HeaderValue::from_str(&cfg.server.name)
        .unwrap_or_else(|_| HeaderValue::from_static("metrics-server"));

    app.layer(middleware::from_fn_with_state(state, guard::admit))
        .layer(SetResponseHeaderLayer::if_not_present(SERVER, server_name))
        .layer(RequestBodyLimitLayer::new(cfg.server.max_body_bytes))
        .layer(TimeoutLayer::new(cfg.server.request_timeout()))
        .layer(TraceLayer::new_for_http())
}
