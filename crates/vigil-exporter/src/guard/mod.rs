//! Request guards applied in front of the exporter routes.
//!
//! - `admit`: rundown admission; 503 once shutdown has begun
//! - `require_token`: access token check; 403 on a missing or wrong token

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use vigil_core::access::ACCESS_TOKEN_HEADER;
use vigil_core::VigilError;

use crate::{app_state::AppState, ops};

/// Holds a rundown permit for the whole request. The permit is released
/// when the inner future completes or is dropped.
pub async fn admit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let _permit = match state.rundown().enter() {
        Ok(p) => p,
        Err(e) => {
            tracing::debug!(path = %req.uri().path(), "request refused while draining");
            return ops::error_response(&e);
        }
    };
    next.run(req).await
}

pub async fn require_token(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let headers = req.headers();
    let access_token = headers.get(ACCESS_TOKEN_HEADER).and_then(|v| v.to_str().ok());
    let authorization = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());

    if !state.access().check(access_token, authorization) {
        tracing::debug!(path = %req.uri().path(), "access denied");
        return ops::error_response(&VigilError::AccessDenied);
    }
    next.run(req).await
}
