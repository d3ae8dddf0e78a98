//! Error types for nrf-quote
//!
//! Citizen input problems never reach this type: they are re-rendered as
//! field errors with HTTP 200. Everything here is a server-side failure or a
//! request for something that does not exist.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Method not supported by the page (405)
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// Session store failure (500)
    #[error("Session error: {0}")]
    Session(String),

    /// Session database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// nrf-common error
    #[error("Common error: {0}")]
    Common(#[from] nrf_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::MethodNotAllowed(msg) => {
                (StatusCode::METHOD_NOT_ALLOWED, "METHOD_NOT_ALLOWED", msg)
            }
            ApiError::Common(nrf_common::Error::Configuration(msg)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR", msg)
            }
            ApiError::Session(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "SESSION_ERROR", msg),
            ApiError::Database(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                err.to_string(),
            ),
            ApiError::Io(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                err.to_string(),
            ),
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        if status.is_server_error() {
            error!(code = error_code, "{}", message);
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for handlers and page controllers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let not_found = ApiError::NotFound("x".to_string()).into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let graph = ApiError::from(nrf_common::Error::Configuration("no edge".to_string())).into_response();
        assert_eq!(graph.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let method = ApiError::MethodNotAllowed("POST".to_string()).into_response();
        assert_eq!(method.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
