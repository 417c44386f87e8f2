//! Response payloads and the error envelope.
//!
//! Client errors carry a bare `{ "error": ... }` body. Server errors use
//! a fixed envelope with a source, code and originating function so that
//! callers never see internal detail beyond a one-line message.

use crate::error::AuthError;
use crate::prober::LatencyReport;
use crate::types::{ProbeTarget, TargetError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Error code reported for every internal failure.
pub const INTERNAL_ERROR_CODE: &str = "00000";
/// Error source reported for every internal failure.
pub const INTERNAL_ERROR_SOURCE: &str = "internal";
/// Function name reported when a probe fails.
pub const PING_FUNCTION: &str = "handlePing";
/// Function name reported for failures outside the ping handler.
pub const SERVER_FUNCTION: &str = "server/index";

pub const UNAUTHORIZED_MESSAGE: &str = "Invalid auth token";
pub const NOT_FOUND_MESSAGE: &str = "Not found";

/// Body of a successful `POST /ping`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PingResponse {
    pub success: bool,
    pub ip: String,
    pub average_ping_ms: u64,
    pub individual_times_ms: Vec<u64>,
    pub port_used: u16,
}

impl PingResponse {
    /// Shape a report for the wire. The mean is rounded only here.
    pub fn from_report(target: &ProbeTarget, report: &LatencyReport) -> Self {
        Self {
            success: true,
            ip: target.as_str().to_string(),
            average_ping_ms: report.rounded_average_ms(),
            individual_times_ms: report.times_ms.clone(),
            port_used: report.reported_port.as_u16(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope<'a> {
    success: bool,
    error: ErrorDetail<'a>,
}

#[derive(Debug, Serialize)]
struct ErrorDetail<'a> {
    source: &'a str,
    code: &'a str,
    message: &'a str,
    function: &'a str,
}

/// Everything a handler can fail with, mapped to a status and body.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed input.
    BadRequest(TargetError),
    /// Missing, malformed or rejected bearer token.
    Unauthorized(AuthError),
    NotFound,
    /// Unexpected operational failure.
    Internal {
        message: String,
        function: &'static str,
    },
}

impl ApiError {
    pub fn internal(message: impl Into<String>, function: &'static str) -> Self {
        Self::Internal {
            message: message.into(),
            function,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TargetError> for ApiError {
    fn from(err: TargetError) -> Self {
        Self::BadRequest(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::Unauthorized(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::BadRequest(err) => {
                let message = err.to_string();
                (status, Json(ErrorBody { error: &message })).into_response()
            }
            Self::Unauthorized(_) => {
                (status, Json(ErrorBody { error: UNAUTHORIZED_MESSAGE })).into_response()
            }
            Self::NotFound => (status, Json(ErrorBody { error: NOT_FOUND_MESSAGE })).into_response(),
            Self::Internal { message, function } => {
                let body = ErrorEnvelope {
                    success: false,
                    error: ErrorDetail {
                        source: INTERNAL_ERROR_SOURCE,
                        code: INTERNAL_ERROR_CODE,
                        message,
                        function,
                    },
                };
                (status, Json(body)).into_response()
            }
        }
    }
}
