//! Error types for rk-web
//!
//! Every failure reaching a JSON handler becomes one `ApiError`, rendered as
//! `{"error": {"code": ..., "message": ...}}` with a matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::chat::ChatError;
use crate::enrichment::EnrichError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409), e.g. a uniqueness violation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing credential or other setup problem (500)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// External provider failed (502)
    #[error("Provider error: {0}")]
    ProviderFailure(String),

    /// Database could not be reached (503)
    #[error("Database unavailable: {0}")]
    StoreUnavailable(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<rk_common::Error> for ApiError {
    fn from(err: rk_common::Error) -> Self {
        use rk_common::Error;
        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            Error::StoreUnavailable(msg) => ApiError::StoreUnavailable(msg),
            Error::Config(msg) => ApiError::Configuration(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<EnrichError> for ApiError {
    fn from(err: EnrichError) -> Self {
        let message = err.user_message();
        match err {
            EnrichError::RecordNotFound { .. } | EnrichError::ProviderNotFound { .. } => {
                ApiError::NotFound(message)
            }
            EnrichError::Configuration { .. } => ApiError::Configuration(message),
            EnrichError::Provider { .. } => ApiError::ProviderFailure(message),
            EnrichError::Store(inner) => ApiError::from(inner),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::EmptyQuestion => ApiError::BadRequest(err.user_message()),
            ChatError::MissingCredential(_) => ApiError::Configuration(err.user_message()),
            other => ApiError::ProviderFailure(other.user_message()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIGURATION_ERROR",
                msg,
            ),
            ApiError::ProviderFailure(msg) => (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", msg),
            ApiError::StoreUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "STORE_UNAVAILABLE",
                msg,
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
        };

        if status.is_server_error() {
            tracing::error!(code = error_code, "{}", message);
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

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
