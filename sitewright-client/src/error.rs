//! Client errors
//!
//! The server answers failures with a JSON `{"error": ...}` body; its
//! message ends up in [`ClientError::ApiError`].

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server could not be reached or the connection broke
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The server refused the call, e.g. 404 for a build without a log or
    /// 500 when its build program is missing
    #[error("server error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("unexpected response: {0}")]
    ParseError(String),

    /// Rejected before anything was sent
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// No log exists (yet) for the queried build
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
    }

    /// The request itself was wrong; resending it unchanged will not help
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if (400..500).contains(status))
    }

    /// The server side is broken or misconfigured
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }
}
