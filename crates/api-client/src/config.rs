//! Configuration for the backend and geocoding clients
//!
//! Built from the `[backend]` and `[geocoding]` sections of `workkar.toml`.

use crate::error::{ApiError, ApiResult};
use std::time::Duration;
use workkar_core::config::{BackendConfig, GeocodingConfig};
use workkar_core::rate_limit::RateLimitConfig;
use workkar_core::retry::{CircuitBreakerConfig, RetryConfig};

/// Backend client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Project URL (without `/rest/v1`)
    pub base_url: String,
    /// Supabase anonymous key
    pub anon_key: Option<String>,
    /// View with worker rows
    pub workers_view: String,
    /// View with profile rows
    pub profiles_view: String,
    /// Request timeout
    pub timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
    /// Circuit breaker configuration
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_backend(&BackendConfig::default())
    }
}

impl ClientConfig {
    /// Create configuration from the `[backend]` section
    #[must_use]
    pub fn from_backend(backend: &BackendConfig) -> Self {
        Self {
            base_url: backend.url.trim_end_matches('/').to_string(),
            anon_key: backend.anon_key.clone(),
            workers_view: backend.workers_view.clone(),
            profiles_view: backend.profiles_view.clone(),
            timeout: Duration::from_secs(backend.timeout_secs),
            retry: RetryConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }

    /// Builder-style method to set base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Builder-style method to set anon key
    #[must_use]
    pub fn with_anon_key(mut self, key: impl Into<String>) -> Self {
        self.anon_key = Some(key.into());
        self
    }

    /// Builder-style method to set timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder-style method to set retry config
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Builder-style method to set circuit breaker config
    #[must_use]
    pub fn with_circuit_breaker(mut self, circuit_breaker: CircuitBreakerConfig) -> Self {
        self.circuit_breaker = circuit_breaker;
        self
    }

    /// PostgREST root, e.g. `https://abc.supabase.co/rest/v1`
    #[must_use]
    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.base_url)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ApiResult<()> {
        validate_url("base_url", &self.base_url)?;

        if self.workers_view.trim().is_empty() || self.profiles_view.trim().is_empty() {
            return Err(ApiError::config("view names cannot be empty"));
        }

        if self.timeout.is_zero() {
            return Err(ApiError::config("timeout cannot be zero"));
        }

        if self.retry.max_attempts == 0 {
            return Err(ApiError::config("retry.max_attempts must be at least 1"));
        }

        Ok(())
    }
}

/// Reverse geocoder configuration
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    /// Nominatim-compatible base URL
    pub base_url: String,
    /// User-Agent header value
    pub user_agent: String,
    /// Outbound request budget
    pub rate_limit: RateLimitConfig,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self::from_geocoding(&GeocodingConfig::default())
    }
}

impl GeocoderConfig {
    /// Create configuration from the `[geocoding]` section
    #[must_use]
    pub fn from_geocoding(geocoding: &GeocodingConfig) -> Self {
        Self {
            base_url: geocoding.base_url.trim_end_matches('/').to_string(),
            user_agent: geocoding.user_agent.clone(),
            rate_limit: RateLimitConfig::per_second(geocoding.requests_per_second),
            timeout: Duration::from_secs(10),
        }
    }

    /// Builder-style method to set base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Builder-style method to set rate limit config
    #[must_use]
    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ApiResult<()> {
        validate_url("geocoding base_url", &self.base_url)?;

        if self.user_agent.trim().is_empty() {
            return Err(ApiError::config("user_agent cannot be empty"));
        }

        if self.rate_limit.max_requests == 0 {
            return Err(ApiError::config("requests_per_second must be at least 1"));
        }

        Ok(())
    }
}

fn validate_url(field: &str, url: &str) -> ApiResult<()> {
    if url.is_empty() {
        return Err(ApiError::config(format!("{field} cannot be empty")));
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ApiError::config(format!(
            "{field} must start with http:// or https://"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert!(config.base_url.contains("localhost"));
        assert_eq!(config.workers_view, "workers_with_geojson");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rest_url_strips_trailing_slash() {
        let config = ClientConfig::default().with_base_url("https://abc.supabase.co/");
        assert_eq!(config.rest_url(), "https://abc.supabase.co/rest/v1");
    }

    #[test]
    fn test_from_backend_section() {
        let backend = BackendConfig {
            url: "https://abc.supabase.co".into(),
            anon_key: Some("anon".into()),
            timeout_secs: 5,
            ..BackendConfig::default()
        };
        let config = ClientConfig::from_backend(&backend);

        assert_eq!(config.anon_key.as_deref(), Some("anon"));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_validation() {
        assert!(ClientConfig::default().with_base_url("").validate().is_err());
        assert!(ClientConfig::default().with_base_url("ftp://x").validate().is_err());
        assert!(ClientConfig::default().with_timeout(Duration::ZERO).validate().is_err());
    }

    #[test]
    fn test_geocoder_defaults() {
        let config = GeocoderConfig::default();
        assert_eq!(config.base_url, "https://nominatim.openstreetmap.org");
        assert!(config.user_agent.starts_with("workkar/"));
        assert_eq!(config.rate_limit.max_requests, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_geocoder_rejects_zero_rate() {
        let config = GeocoderConfig::default().with_rate_limit(RateLimitConfig::per_second(0));
        assert!(config.validate().is_err());
    }
}
