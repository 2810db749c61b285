//! Error types for the geo crate.

use thiserror::Error;

/// Result type alias for geo operations.
pub type Result<T> = std::result::Result<T, GeoError>;

/// Errors that can occur during geo operations.
///
/// Every variant except `JsonError` means "the stored location is malformed";
/// callers treat it as an absent location after logging.
#[derive(Debug, Error)]
pub enum GeoError {
    /// Invalid WKT format
    #[error("Invalid WKT format: {0}")]
    InvalidWkt(String),

    /// GeoJSON object without a usable `coordinates` array
    #[error("Malformed GeoJSON point: {0}")]
    MalformedGeoJson(String),

    /// Invalid coordinate values
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// Value is neither GeoJSON nor a recognised text form
    #[error("Unsupported location format: {0}")]
    UnsupportedFormat(String),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Error code for integration with workkar-core error handling.
/// Range: 10xxx for geo errors.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoErrorCode {
    /// Invalid WKT format
    InvalidWkt = 10001,
    /// Invalid coordinate values
    InvalidCoordinate = 10002,
    /// JSON parsing error
    JsonParsing = 10003,
    /// Malformed GeoJSON
    MalformedGeoJson = 10004,
    /// Unsupported representation
    UnsupportedFormat = 10005,
}

impl GeoError {
    /// Returns the error code for this error.
    pub fn code(&self) -> GeoErrorCode {
        match self {
            GeoError::InvalidWkt(_) => GeoErrorCode::InvalidWkt,
            GeoError::MalformedGeoJson(_) => GeoErrorCode::MalformedGeoJson,
            GeoError::InvalidCoordinate(_) => GeoErrorCode::InvalidCoordinate,
            GeoError::UnsupportedFormat(_) => GeoErrorCode::UnsupportedFormat,
            GeoError::JsonError(_) => GeoErrorCode::JsonParsing,
        }
    }
}
