//! Error types for the sailor client

use thiserror::Error;

/// Result type alias for sailor RPCs
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to a sailor.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced an HTTP response (connect failure,
    /// timeout, ...)
    #[error("sailor request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The sailor answered with an error status
    #[error("sailor error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },
}

impl ClientError {
    /// Create an API error from status code and body
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// HTTP status the sailor answered with, if it answered at all.
    ///
    /// `None` means the failure was transport-level: the request may or
    /// may not have reached the sailor, so callers should treat the
    /// operation as retryable.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::ApiError { status, .. } => Some(*status),
            ClientError::RequestFailed(err) => err.status().map(|s| s.as_u16()),
        }
    }

    /// Body or error text suitable for surfacing as a chore reason
    pub fn message(&self) -> String {
        match self {
            ClientError::ApiError { message, .. } => message.clone(),
            ClientError::RequestFailed(err) => err.to_string(),
        }
    }
}
