use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

/// Message sent to clients in place of any internal failure detail.
pub const GENERIC_FAILURE: &str = "Что-то пошло не так :(";

// ── ServiceError ────────────────────────────────────────────────────

/// Unified service error type used across all modules.
///
/// Each variant maps to an HTTP status code. The JSON response always
/// carries `result: false` next to the human-readable text:
///
/// ```json
/// {"result": false, "message": "Твит с id# 7 не найден"}
/// ```
///
/// Authentication failures use `detail` instead of `message`, which is
/// what API clients already match on for 401 responses.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Referenced resource does not exist. HTTP 404.
    #[error("{0}")]
    NotFound(String),

    /// Request is well-formed but not allowed in the current state
    /// (duplicate edge, self-action, foreign resource). HTTP 400.
    #[error("{0}")]
    InvalidOperation(String),

    /// Input data is invalid. HTTP 400.
    #[error("{0}")]
    Validation(String),

    /// Missing or unknown credentials. HTTP 401.
    #[error("{0}")]
    Unauthorized(String),

    /// Storage backend failure. HTTP 500.
    #[error("{0}")]
    Storage(String),

    /// Unexpected internal error. HTTP 500.
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::InvalidOperation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON body sent to the client. Internal details never leave the process.
    pub fn body(&self) -> serde_json::Value {
        match self {
            ServiceError::Unauthorized(m) => serde_json::json!({
                "result": false,
                "detail": m,
            }),
            ServiceError::Storage(_) | ServiceError::Internal(_) => serde_json::json!({
                "result": false,
                "message": GENERIC_FAILURE,
            }),
            other => serde_json::json!({
                "result": false,
                "message": other.to_string(),
            }),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("request failed: {}", self);
        }
        (status, axum::Json(self.body())).into_response()
    }
}
