//! Route handlers.

use super::auth::Authenticated;
use super::response::{ApiError, PingResponse, PING_FUNCTION, SERVER_FUNCTION};
use super::AppState;
use crate::types::{ProbeTarget, TargetError};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use tracing::{error, info};

/// `GET /ping`: liveness check.
pub async fn pong() -> &'static str {
    "pong"
}

/// `POST /ping`: measure TCP connect latency to `ip_address`.
pub async fn measure(
    State(state): State<AppState>,
    Authenticated(claims): Authenticated,
    body: Bytes,
) -> Result<Json<PingResponse>, ApiError> {
    let target = target_from_body(&body)?;
    info!(ip = %target, issuer = %claims.iss, "ping requested");

    let attempts = state.prober.config().attempts;
    match state.prober.measure(&target).await {
        Ok(report) => {
            state.metrics.observe_probe_success(&report, attempts);
            Ok(Json(PingResponse::from_report(&target, &report)))
        }
        Err(e) => {
            state.metrics.observe_probe_failure(attempts);
            error!(ip = %target, error = %e, "ping failed");
            Err(ApiError::internal(e.to_string(), PING_FUNCTION))
        }
    }
}

/// `GET /metrics`: Prometheus text exposition.
pub async fn metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let body = state.metrics.render().map_err(|e| {
        error!(error = %e, "failed to render metrics");
        ApiError::internal("Failed to render metrics", SERVER_FUNCTION)
    })?;
    Ok(([(CONTENT_TYPE, state.metrics.content_type())], body).into_response())
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Pull and validate `ip_address` from a JSON body.
///
/// Anything that is not a JSON object with a non-empty `ip_address` counts
/// as missing; a present value that is not a dotted-quad string is invalid.
fn target_from_body(body: &[u8]) -> Result<ProbeTarget, TargetError> {
    let value: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    match value.get("ip_address") {
        None | Some(Value::Null) => Err(TargetError::Missing),
        Some(Value::String(ip)) => ProbeTarget::parse(ip),
        Some(other) => Err(TargetError::InvalidFormat(other.to_string())),
    }
}
