//! Gateway error types and their HTTP mapping.
//!
//! Every failure leaves the gateway as
//! `{"error": {"code": "<kind>", "message": "..."}}`. Integrity and
//! persistence failures are logged in full and answered with a generic
//! message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use raffle_draw::{ErrorKind, RaffleError};
use serde::Serialize;
use tracing::error;

/// Error codes carried in the response body
pub mod codes {
    pub const VALIDATION: &str = "validation";
    pub const INVALID_STATE: &str = "invalid_state";
    pub const NOT_FOUND: &str = "not_found";
    pub const INTEGRITY: &str = "integrity";
    pub const DEPENDENCY: &str = "dependency";
    pub const PERSISTENCE: &str = "persistence";
}

const GENERIC_MESSAGE: &str = "Internal error, see server logs";

/// API error with HTTP status
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTP status
    pub status: StatusCode,
    /// Machine-readable code
    pub code: &'static str,
    /// Error message
    pub message: String,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// Malformed request
    pub fn bad_request(details: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::VALIDATION, details)
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    code: &'a str,
    message: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: &self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<RaffleError> for ApiError {
    fn from(e: RaffleError) -> Self {
        match e.kind() {
            ErrorKind::Validation => {
                let status = match e {
                    RaffleError::NoEntries { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    _ => StatusCode::BAD_REQUEST,
                };
                Self::new(status, codes::VALIDATION, e.to_string())
            }
            ErrorKind::InvalidState => {
                Self::new(StatusCode::CONFLICT, codes::INVALID_STATE, e.to_string())
            }
            ErrorKind::NotFound => {
                Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, e.to_string())
            }
            kind => {
                error!("[raffle] Request failed: {}", e);
                let code = match kind {
                    ErrorKind::Integrity => codes::INTEGRITY,
                    ErrorKind::Dependency => codes::DEPENDENCY,
                    _ => codes::PERSISTENCE,
                };
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, GENERIC_MESSAGE)
            }
        }
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Gateway-level errors (startup, not per request)
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(String),

    /// Server stopped with an error
    #[error("server error: {0}")]
    Serve(String),

    /// Raffle core could not be assembled
    #[error("raffle setup error: {0}")]
    Raffle(#[from] RaffleError),
}
