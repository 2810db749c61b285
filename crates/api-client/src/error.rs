//! Error types for the API client

use thiserror::Error;
use workkar_discovery::DiscoveryError;

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// API client errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend returned an error response
    #[error("API error ({status}): {message}")]
    ApiResponse {
        /// HTTP status code
        status: u16,
        /// Error body from the backend
        message: String,
    },

    /// Response decoded but had an unexpected shape
    #[error("Unexpected response: {0}")]
    UnexpectedShape(String),

    /// Circuit breaker is open
    #[error("Circuit breaker is open - service temporarily unavailable")]
    CircuitOpen,

    /// All retry attempts exhausted
    #[error("All {attempts} retry attempts failed: {last_error}")]
    RetriesExhausted {
        /// Number of attempts made
        attempts: u32,
        /// Last error message
        last_error: String,
    },
}

impl ApiError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an API response error
    pub fn api_response(status: u16, message: impl Into<String>) -> Self {
        Self::ApiResponse {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(e) => e.is_connect() || e.is_timeout(),
            Self::ApiResponse { status, .. } => *status >= 500 || *status == 429,
            // The breaker closes again on its own
            Self::CircuitOpen | Self::RetriesExhausted { .. } => true,
            Self::Config(_) | Self::Json(_) | Self::UnexpectedShape(_) => false,
        }
    }

    /// Check if this is a client error (4xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiResponse { status, .. } if (400..500).contains(status))
    }

    /// Check if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiResponse { status, .. } if *status >= 500)
    }
}

impl From<ApiError> for DiscoveryError {
    fn from(err: ApiError) -> Self {
        if err.is_retryable() {
            Self::retryable(err.to_string())
        } else {
            Self::permanent(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(ApiError::api_response(503, "down").is_retryable());
        assert!(ApiError::api_response(429, "slow down").is_retryable());
        assert!(!ApiError::api_response(401, "bad key").is_retryable());
        assert!(!ApiError::config("missing url").is_retryable());
    }

    #[test]
    fn test_status_classes() {
        let err = ApiError::api_response(404, "no view");
        assert!(err.is_client_error());
        assert!(!err.is_server_error());
        assert!(ApiError::api_response(502, "").is_server_error());
    }

    #[test]
    fn test_into_discovery_error_keeps_retry_hint() {
        let retry: DiscoveryError = ApiError::api_response(500, "boom").into();
        assert!(retry.is_retryable());

        let fatal: DiscoveryError = ApiError::api_response(400, "bad filter").into();
        assert!(!fatal.is_retryable());
        assert!(fatal.to_string().contains("bad filter"));
    }
}
