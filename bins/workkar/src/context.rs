//! Shared state for one CLI invocation

use anyhow::{Context, Result};
use clap::ValueEnum;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use workkar_api_client::{ClientConfig, GeocoderConfig, NominatimGeocoder, WorkkarClient};
use workkar_core::cache::Cache;
use workkar_core::config::{Config, ConfigSchema};
use workkar_discovery::{FileLocationCache, SortMode};
use workkar_geo::Coordinate;
use workkar_telemetry::{TelemetryConfig, TelemetryGuard};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Loaded configuration plus lazily built collaborators
pub struct AppContext {
    config: Config,
    pub format: OutputFormat,
    _telemetry: TelemetryGuard,
}

impl AppContext {
    /// Load configuration and start logging
    pub fn load(path: Option<&Path>, verbose: bool, format: OutputFormat) -> Result<Self> {
        let config = Config::load(path).context("Failed to load configuration")?;

        let log_level = if verbose {
            "workkar=debug,workkar_discovery=debug,workkar_api_client=debug".to_string()
        } else {
            config.schema.logging.level.clone()
        };

        let telemetry = workkar_telemetry::init_with_config(TelemetryConfig {
            log_level,
            log_file: config.schema.logging.file.clone(),
            show_target: verbose,
            ..TelemetryConfig::default()
        })?;

        match &config.path {
            Some(path) => debug!(path = %path.display(), "Loaded configuration"),
            None => debug!("Using default configuration"),
        }

        Ok(Self {
            config,
            format,
            _telemetry: telemetry,
        })
    }

    pub fn settings(&self) -> &ConfigSchema {
        &self.config.schema
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Sort mode from the flag, or the configured default
    pub fn sort(&self, flag: Option<SortMode>) -> Result<SortMode> {
        match flag {
            Some(sort) => Ok(sort),
            None => self
                .settings()
                .discovery
                .default_sort
                .parse()
                .map_err(anyhow::Error::msg),
        }
    }

    pub fn cache(&self) -> Result<Arc<Cache>> {
        let cache = Cache::new(self.settings().cache.to_cache_config())
            .context("Failed to open cache directory")?;
        Ok(Arc::new(cache))
    }

    /// The pending location slot, shared with sign-up flows
    pub fn pending_location(&self, cache: Arc<Cache>) -> FileLocationCache {
        let ttl = Duration::from_secs(self.settings().discovery.pending_location_ttl_secs);
        FileLocationCache::new(cache, ttl)
    }

    pub fn client(&self) -> Result<WorkkarClient> {
        let config = ClientConfig::from_backend(&self.settings().backend);
        WorkkarClient::with_config(config).context("Failed to create backend client")
    }

    /// Reverse geocoder, unless disabled in configuration
    pub fn geocoder(&self) -> Result<Option<NominatimGeocoder>> {
        let geocoding = &self.settings().geocoding;
        if !geocoding.enabled {
            return Ok(None);
        }

        let geocoder = NominatimGeocoder::with_config(GeocoderConfig::from_geocoding(geocoding))
            .context("Failed to create geocoder")?;
        Ok(Some(geocoder))
    }

    /// Configured stand-in for device geolocation
    pub fn device_position(&self) -> Option<Coordinate> {
        let discovery = &self.settings().discovery;
        match (discovery.device_latitude, discovery.device_longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinate::new(latitude, longitude)),
            _ => None,
        }
    }

    pub fn geolocation_timeout(&self) -> Duration {
        Duration::from_millis(self.settings().discovery.geolocation_timeout_ms)
    }

    /// Log the session's counters and timings (visible with --verbose)
    pub fn log_metrics(&self) {
        debug!(metrics = %workkar_telemetry::metrics().export_json(), "Session metrics");
    }
}
