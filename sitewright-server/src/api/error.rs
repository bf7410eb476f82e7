//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sitewright_core::domain::job::InvalidJobId;
use sitewright_runner::{BuildLogError, SubmitError};

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    /// The server is misconfigured; the caller cannot fix this
    Configuration(String),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Configuration(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        if err.is_configuration() {
            ApiError::Configuration(err.to_string())
        } else {
            ApiError::BadRequest(err.to_string())
        }
    }
}

impl From<BuildLogError> for ApiError {
    fn from(err: BuildLogError) -> Self {
        match err {
            BuildLogError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            BuildLogError::Io { .. } => ApiError::InternalError(err.to_string()),
        }
    }
}

impl From<InvalidJobId> for ApiError {
    fn from(err: InvalidJobId) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
