//! Nominatim reverse geocoding
//!
//! Nominatim's usage policy asks for an identifying User-Agent and at most
//! one request per second, so calls queue on a token bucket before sending.

use crate::client::handle_response;
use crate::config::GeocoderConfig;
use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};
use workkar_core::rate_limit::RateLimiter;
use workkar_discovery::{DiscoveryError, Place, ReverseGeocoder};
use workkar_geo::Coordinate;

const RATE_LIMIT_KEY: &str = "reverse";

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    address: Option<Address>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    hamlet: Option<String>,
}

impl Address {
    fn locality(self) -> Option<String> {
        self.city.or(self.town).or(self.village).or(self.hamlet)
    }
}

/// Rate-limited Nominatim client
#[derive(Clone)]
pub struct NominatimGeocoder {
    inner: Client,
    config: Arc<GeocoderConfig>,
    rate_limiter: RateLimiter,
}

impl NominatimGeocoder {
    /// Create a geocoder with specific configuration
    pub fn with_config(config: GeocoderConfig) -> ApiResult<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|_| ApiError::config("user_agent contains invalid header characters"))?,
        );

        let inner = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers)
            .build()?;

        Ok(Self {
            inner,
            rate_limiter: RateLimiter::new(config.rate_limit.clone()),
            config: Arc::new(config),
        })
    }

    /// Wait for the next request slot
    async fn acquire(&self) {
        while !self.rate_limiter.try_acquire(RATE_LIMIT_KEY) {
            let wait = self.rate_limiter.time_until_available(RATE_LIMIT_KEY);
            debug!(wait_ms = wait.as_millis(), "Waiting for geocoding rate limit");
            tokio::time::sleep(wait).await;
        }
    }

    /// Look up the place at `point`
    ///
    /// GET /reverse?format=json&lat=<lat>&lon=<lon>
    #[instrument(skip(self), fields(point = %point))]
    pub async fn lookup(&self, point: Coordinate) -> ApiResult<Place> {
        self.acquire().await;

        let url = format!("{}/reverse", self.config.base_url);
        let response = self
            .inner
            .get(&url)
            .query(&[
                ("format", "json".to_string()),
                ("lat", point.latitude.to_string()),
                ("lon", point.longitude.to_string()),
            ])
            .send()
            .await?;

        let body: ReverseResponse = handle_response(response).await?;

        if let Some(error) = body.error {
            return Err(ApiError::UnexpectedShape(error));
        }

        let display_name = body
            .display_name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| ApiError::UnexpectedShape("missing display_name".to_string()))?;

        Ok(Place {
            display_name,
            city: body.address.and_then(Address::locality),
        })
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse(&self, point: Coordinate) -> workkar_discovery::Result<Place> {
        self.lookup(point)
            .await
            .map_err(|err| DiscoveryError::Geocode(err.to_string()))
    }
}

impl std::fmt::Debug for NominatimGeocoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NominatimGeocoder")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}
