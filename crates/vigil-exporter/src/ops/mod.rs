//! Operational HTTP endpoints.
//!
//! - `/health`       : host-supplied health body (GET + HEAD)
//! - `/metrics`      : registry snapshot in text / OpenMetrics format
//! - `/debug/pprof/` : optional runtime introspection

pub mod debug;

use axum::{
    extract::State,
    http::{
        header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use vigil_core::error::{ClientCode, VigilError};

use crate::app_state::AppState;
use crate::obs::{self, Format};

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const PLAIN_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Map an error onto a bare status response. The reason is never echoed.
pub fn error_response(err: &VigilError) -> Response {
    let status = match err.client_code() {
        ClientCode::Forbidden => StatusCode::FORBIDDEN,
        ClientCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ClientCode::Config | ClientCode::ScrapeFailed | ClientCode::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, status.canonical_reason().unwrap_or_default()).into_response()
}

/// Shape check only: a body wrapped in braces or brackets is served as JSON.
pub fn looks_like_json(body: &str) -> bool {
    let t = body.trim();
    (t.starts_with('{') && t.ends_with('}')) || (t.starts_with('[') && t.ends_with(']'))
}

fn health_content_type(body: &str) -> HeaderValue {
    if looks_like_json(body) {
        HeaderValue::from_static(JSON_CONTENT_TYPE)
    } else {
        HeaderValue::from_static(PLAIN_CONTENT_TYPE)
    }
}

#[tracing::instrument(skip_all, name = "vigil.health")]
pub async fn health(State(state): State<AppState>) -> Response {
    let body = state.health().call();
    (StatusCode::OK, [(CONTENT_TYPE, health_content_type(&body))], body).into_response()
}

/// Same decision as GET, no body; `Content-Length` is the size GET would send.
#[tracing::instrument(skip_all, name = "vigil.health.head")]
pub async fn health_head(State(state): State<AppState>) -> Response {
    let body = state.health().call();
    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, health_content_type(&body)),
            (CONTENT_LENGTH, HeaderValue::from(body.len())),
        ],
    )
        .into_response()
}

#[tracing::instrument(skip_all, name = "vigil.metrics.scrape")]
pub async fn metrics(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let format = Format::negotiate(headers.get(ACCEPT).and_then(|v| v.to_str().ok()));
    let snapshot = state.registry().gather();
    if !snapshot.failures.is_empty() {
        tracing::debug!(failed = snapshot.failures.len(), "scrape completed with omitted families");
    }
    let body = obs::render(&snapshot, format);

    (
        StatusCode::OK,
        [(CONTENT_TYPE, HeaderValue::from_static(format.content_type()))],
        body,
    )
        .into_response()
}
