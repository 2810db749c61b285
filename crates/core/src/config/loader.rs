//! Configuration file loading

use super::schema::ConfigSchema;
use crate::error::{Error, Result, ResultExt};
use std::path::{Path, PathBuf};

/// Files searched, in order, when no explicit path is given
const CANDIDATES: [&str; 3] = ["workkar.toml", ".workkar.toml", ".config/workkar.toml"];

/// Sort modes accepted by `discovery.default_sort`
const SORT_MODES: [&str; 2] = ["distance", "rating"];

/// Configuration wrapper
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed (and overridden) settings
    pub schema: ConfigSchema,
    /// File the settings came from, if any
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file path or the standard locations.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file falls back to built-in defaults. Environment overrides are
    /// applied before validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) if !p.exists() => return Err(Error::config_not_found(p)),
            Some(p) => Some(p.to_path_buf()),
            None => find_config_file(),
        };

        let schema = match &config_path {
            Some(p) => load_config_file(p)?,
            None => ConfigSchema::default(),
        };

        let mut config = Self {
            schema,
            path: config_path,
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text without touching the filesystem
    pub fn from_toml(content: &str) -> Result<Self> {
        let schema: ConfigSchema = toml::from_str(content)?;
        let config = Self { schema, path: None };
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup.
    ///
    /// `WORKKAR_BACKEND_URL` wins over `SUPABASE_URL`; `SUPABASE_ANON_KEY`
    /// sets the API key; `WORKKAR_LOG` sets the log level.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty("WORKKAR_BACKEND_URL").or_else(|| non_empty("SUPABASE_URL")) {
            self.schema.backend.url = url;
        }
        if let Some(key) = non_empty("SUPABASE_ANON_KEY") {
            self.schema.backend.anon_key = Some(key);
        }
        if let Some(level) = non_empty("WORKKAR_LOG") {
            self.schema.logging.level = level;
        }
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        let s = &self.schema;

        if s.discovery.page_size == 0 {
            return Err(Error::config_invalid("discovery.page_size must be at least 1"));
        }
        if s.discovery.geolocation_timeout_ms == 0 {
            return Err(Error::config_invalid(
                "discovery.geolocation_timeout_ms must be greater than 0",
            ));
        }
        if s.backend.timeout_secs == 0 {
            return Err(Error::config_invalid("backend.timeout_secs must be greater than 0"));
        }
        if !SORT_MODES.contains(&s.discovery.default_sort.as_str()) {
            return Err(Error::config_invalid(format!(
                "discovery.default_sort must be one of {SORT_MODES:?}, got '{}'",
                s.discovery.default_sort
            )));
        }
        if s.discovery.device_latitude.is_some() != s.discovery.device_longitude.is_some() {
            return Err(Error::config_invalid(
                "discovery.device_latitude and discovery.device_longitude must be set together",
            ));
        }
        check_http_url("backend.url", &s.backend.url)?;
        if s.geocoding.enabled {
            check_http_url("geocoding.base_url", &s.geocoding.base_url)?;
            if s.geocoding.requests_per_second == 0 {
                return Err(Error::config_invalid(
                    "geocoding.requests_per_second must be greater than 0",
                ));
            }
        }

        Ok(())
    }
}

fn check_http_url(field: &str, url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(Error::config_invalid(format!("{field} must be an http(s) URL, got '{url}'"))
            .with_suggestion("Use a full URL such as https://<project>.supabase.co"))
    }
}

/// Find configuration file in standard locations
fn find_config_file() -> Option<PathBuf> {
    CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.exists())
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &Path) -> Result<ConfigSchema> {
    let content = std::fs::read_to_string(path)
        .map_err(Error::from)
        .context(format!("Failed to read config file {}", path.display()))?;

    toml::from_str(&content)
        .map_err(Error::from)
        .context(format!("Failed to parse config file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.path.is_none());
        assert_eq!(config.schema.discovery.page_size, 6);
        assert_eq!(config.schema.discovery.default_sort, "distance");
        assert_eq!(config.schema.discovery.geolocation_timeout_ms, 5000);
        assert_eq!(config.schema.backend.workers_view, "workers_with_geojson");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [backend]
            url = "https://abc.supabase.co"

            [discovery]
            default_sort = "rating"
            "#,
        )
        .unwrap();

        assert_eq!(config.schema.backend.url, "https://abc.supabase.co");
        assert_eq!(config.schema.backend.timeout_secs, 30);
        assert_eq!(config.schema.discovery.default_sort, "rating");
        assert_eq!(config.schema.discovery.page_size, 6);
        assert_eq!(config.schema.cache.workers_ttl_secs, 86_400);
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[discovery]\npage_size = 12").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.schema.discovery.page_size, 12);
        assert_eq!(config.path.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/definitely/not/here/workkar.toml"))).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigNotFound);
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = Config::from_toml("[discovery\npage_size = ").unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigParseError);
    }

    #[test]
    fn test_validate_rejects_zero_page_size() {
        let err = Config::from_toml("[discovery]\npage_size = 0").unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigValidationError);
    }

    #[test]
    fn test_validate_rejects_unknown_sort() {
        let err = Config::from_toml("[discovery]\ndefault_sort = \"newest\"").unwrap_err();
        assert!(err.message.contains("default_sort"));
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let err = Config::from_toml("[backend]\nurl = \"ftp://example.com\"").unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigValidationError);
        assert!(err.suggestion.is_some());
    }

    #[test]
    fn test_validate_rejects_half_device_position() {
        let err = Config::from_toml("[discovery]\ndevice_latitude = 17.4").unwrap_err();
        assert!(err.message.contains("device_longitude"));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SUPABASE_URL", "https://fallback.supabase.co"),
            ("WORKKAR_BACKEND_URL", "https://primary.example.com"),
            ("SUPABASE_ANON_KEY", "anon-123"),
            ("WORKKAR_LOG", "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env_overrides(|k| vars.get(k).map(|v| (*v).to_string()));

        assert_eq!(config.schema.backend.url, "https://primary.example.com");
        assert_eq!(config.schema.backend.anon_key.as_deref(), Some("anon-123"));
        assert_eq!(config.schema.logging.level, "debug");
    }

    #[test]
    fn test_env_override_falls_back_to_supabase_url() {
        let mut config = Config::default();
        config.apply_env_overrides(|k| {
            (k == "SUPABASE_URL").then(|| "https://fallback.supabase.co".to_string())
        });
        assert_eq!(config.schema.backend.url, "https://fallback.supabase.co");
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let mut config = Config::default();
        config.apply_env_overrides(|_| Some("  ".to_string()));
        assert_eq!(config.schema.backend.url, "http://localhost:54321");
        assert!(config.schema.backend.anon_key.is_none());
    }
}
