//! Configuration schema definitions
//!
//! Every section has serde defaults so a partial (or missing) file is valid.

use crate::cache::CacheConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigSchema {
    /// Hosted backend (Supabase) connection
    #[serde(default)]
    pub backend: BackendConfig,

    /// Reverse geocoding provider
    #[serde(default)]
    pub geocoding: GeocodingConfig,

    /// Ranking, pagination and location resolution
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Local cache for offline snapshots and pending locations
    #[serde(default)]
    pub cache: CacheSection,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project URL, e.g. `https://abc.supabase.co`
    #[serde(default = "default_backend_url")]
    pub url: String,

    /// Public anonymous API key
    #[serde(default)]
    pub anon_key: Option<String>,

    /// View exposing worker rows with a GeoJSON location column
    #[serde(default = "default_workers_view")]
    pub workers_view: String,

    /// View exposing profile rows with a GeoJSON location column
    #[serde(default = "default_profiles_view")]
    pub profiles_view: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            anon_key: None,
            workers_view: default_workers_view(),
            profiles_view: default_profiles_view(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_backend_url() -> String {
    "http://localhost:54321".to_string()
}

fn default_workers_view() -> String {
    "workers_with_geojson".to_string()
}

fn default_profiles_view() -> String {
    "profiles_with_geojson".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Reverse geocoding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Disable to always fall back to coordinate labels
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Nominatim-compatible base URL
    #[serde(default = "default_geocoding_url")]
    pub base_url: String,

    /// User-Agent sent to the provider (Nominatim requires one)
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Provider usage policy limit
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_geocoding_url(),
            user_agent: default_user_agent(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_geocoding_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_user_agent() -> String {
    format!("workkar/{}", env!("CARGO_PKG_VERSION"))
}

fn default_requests_per_second() -> u32 {
    1
}

/// Discovery pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Workers per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// `distance` or `rating`
    #[serde(default = "default_sort")]
    pub default_sort: String,

    /// Upper bound on waiting for a device position
    #[serde(default = "default_geolocation_timeout_ms")]
    pub geolocation_timeout_ms: u64,

    /// How long a pending (sign-up) location stays usable
    #[serde(default = "default_pending_location_ttl_secs")]
    pub pending_location_ttl_secs: u64,

    /// Remember each viewer's stored location, keyed by viewer, for offline use
    #[serde(default = "default_true")]
    pub cache_profile_location: bool,

    /// Fixed device position, used where no geolocation hardware exists
    #[serde(default)]
    pub device_latitude: Option<f64>,

    /// Fixed device position, used where no geolocation hardware exists
    #[serde(default)]
    pub device_longitude: Option<f64>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            default_sort: default_sort(),
            geolocation_timeout_ms: default_geolocation_timeout_ms(),
            pending_location_ttl_secs: default_pending_location_ttl_secs(),
            cache_profile_location: true,
            device_latitude: None,
            device_longitude: None,
        }
    }
}

fn default_page_size() -> usize {
    6
}

fn default_sort() -> String {
    "distance".to_string()
}

fn default_geolocation_timeout_ms() -> u64 {
    5000
}

fn default_pending_location_ttl_secs() -> u64 {
    900
}

/// Cache configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSection {
    /// Cache directory (platform cache dir when unset)
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Lifetime of the offline worker snapshot
    #[serde(default = "default_workers_ttl_secs")]
    pub workers_ttl_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            dir: None,
            workers_ttl_secs: default_workers_ttl_secs(),
        }
    }
}

fn default_workers_ttl_secs() -> u64 {
    86_400
}

impl CacheSection {
    /// Build the low-level cache configuration for this section
    #[must_use]
    pub fn to_cache_config(&self) -> CacheConfig {
        let mut config = CacheConfig::default();
        if let Some(dir) = &self.dir {
            config.cache_dir.clone_from(dir);
        }
        config.default_ttl_secs = self.workers_ttl_secs;
        config
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Also write logs to a daily rolling file at this path
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
