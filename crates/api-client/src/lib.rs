//! HTTP adapters for WorkKar discovery
//!
//! This crate connects the discovery ports to real services:
//!
//! - [`WorkkarClient`]: Supabase PostgREST client for the worker and profile
//!   views, implementing [`WorkerDirectory`](workkar_discovery::WorkerDirectory)
//!   and [`ViewerLocationSource`](workkar_discovery::ViewerLocationSource)
//! - [`NominatimGeocoder`]: rate-limited reverse geocoder implementing
//!   [`ReverseGeocoder`](workkar_discovery::ReverseGeocoder)
//!
//! # Features
//!
//! - **Retry with exponential backoff**: Automatic retry for transient failures
//! - **Circuit breaker**: Stop calling a backend that keeps failing
//! - **Rate limiting**: Stay within the geocoding provider's usage policy
//! - **Request correlation**: Track requests with unique IDs for debugging
//!
//! # Example
//!
//! ```rust,no_run
//! use workkar_api_client::{ClientConfig, WorkkarClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::default()
//!         .with_base_url("https://abc.supabase.co")
//!         .with_anon_key("public-anon-key");
//!     let client = WorkkarClient::with_config(config)?;
//!
//!     let rows = client.workers().active().await?;
//!     println!("{} active workers", rows.len());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
mod directory;
pub mod endpoints;
pub mod error;
pub mod geocoder;

pub use client::WorkkarClient;
pub use config::{ClientConfig, GeocoderConfig};
pub use error::{ApiError, ApiResult};
pub use geocoder::NominatimGeocoder;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::client::WorkkarClient;
    pub use crate::config::{ClientConfig, GeocoderConfig};
    pub use crate::endpoints::{ProfilesApi, WorkersApi};
    pub use crate::error::{ApiError, ApiResult};
    pub use crate::geocoder::NominatimGeocoder;
}
