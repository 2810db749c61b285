//! Error types for the discovery pipeline.

use thiserror::Error;
use workkar_core::ErrorCode;

/// Errors surfaced by discovery collaborators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiscoveryError {
    /// The worker directory (or viewer lookup) could not be read.
    #[error("fetch failed: {message}")]
    Fetch {
        /// Human-readable cause
        message: String,
        /// Whether trying again may succeed
        retryable: bool,
    },

    /// Reverse geocoding failed; callers fall back to a coordinate label.
    #[error("reverse geocoding failed: {0}")]
    Geocode(String),

    /// Local cache read or write failed.
    #[error("cache error: {0}")]
    Cache(String),
}

impl DiscoveryError {
    /// Fetch failure that may succeed on retry.
    pub fn retryable(message: impl Into<String>) -> Self {
        Self::Fetch {
            message: message.into(),
            retryable: true,
        }
    }

    /// Fetch failure that will not succeed without intervention.
    pub fn permanent(message: impl Into<String>) -> Self {
        Self::Fetch {
            message: message.into(),
            retryable: false,
        }
    }

    /// Whether the UI should offer a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch { retryable: true, .. })
    }
}

impl From<workkar_core::Error> for DiscoveryError {
    fn from(err: workkar_core::Error) -> Self {
        Self::Cache(err.message)
    }
}

/// Device geolocation outcomes other than a position.
///
/// None of these are fatal: the resolver moves on to its next strategy.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeolocationError {
    /// The user (or OS) refused the permission prompt.
    #[error("location permission denied")]
    Denied,
    /// No position arrived within the allowed time.
    #[error("timed out waiting for a position")]
    Timeout,
    /// The device has no positioning capability.
    #[error("location unavailable")]
    Unavailable,
}

impl GeolocationError {
    /// Structured error code used in logs.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Denied => ErrorCode::GeolocationDenied,
            Self::Timeout => ErrorCode::GeolocationTimeout,
            Self::Unavailable => ErrorCode::GeolocationUnavailable,
        }
    }
}

/// Result type for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_flag() {
        assert!(DiscoveryError::retryable("connection reset").is_retryable());
        assert!(!DiscoveryError::permanent("401 unauthorized").is_retryable());
        assert!(!DiscoveryError::Geocode("no result".into()).is_retryable());
    }

    #[test]
    fn test_display() {
        let err = DiscoveryError::retryable("connection reset");
        assert_eq!(err.to_string(), "fetch failed: connection reset");
        assert_eq!(GeolocationError::Denied.to_string(), "location permission denied");
    }

    #[test]
    fn test_geolocation_codes_are_location_category() {
        for err in [GeolocationError::Denied, GeolocationError::Timeout, GeolocationError::Unavailable] {
            assert_eq!(err.code().category(), "Location");
        }
        assert_eq!(GeolocationError::Timeout.code().to_string(), "E5002");
    }
}
