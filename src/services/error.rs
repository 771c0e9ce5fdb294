use thiserror::Error;

use crate::application::error::ApplicationError;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Request timeout")]
    Timeout,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Upstream returned status {status}: {message}")]
    ProviderError { status: u16, message: String },

    #[error("Upstream job failed: {0}")]
    JobFailed(String),

    #[error("Unsupported upstream format: {0}")]
    UnsupportedFormat(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl InferenceError {
    /// Failures that may succeed when the whole submission is repeated.
    pub fn is_retryable(&self) -> bool {
        match self {
            InferenceError::Timeout | InferenceError::NetworkError(_) => true,
            InferenceError::ProviderError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<InferenceError> for ApplicationError {
    fn from(error: InferenceError) -> Self {
        match error {
            InferenceError::UnsupportedFormat(_) => ApplicationError::UpstreamUnsupportedFormat,
            other => ApplicationError::ProcessingFailure(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for InferenceError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            InferenceError::Timeout
        } else if error.is_connect() {
            InferenceError::NetworkError(format!("Connection failed: {}", error))
        } else if let Some(status) = error.status() {
            InferenceError::ProviderError {
                status: status.as_u16(),
                message: error.to_string(),
            }
        } else if error.is_decode() {
            InferenceError::UnsupportedFormat(error.to_string())
        } else {
            InferenceError::NetworkError(error.to_string())
        }
    }
}
