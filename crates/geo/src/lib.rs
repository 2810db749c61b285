//! Geo-distance engine for WorkKar.
//!
//! This crate provides:
//! - A single named point type ([`Coordinate`]) with explicit latitude/longitude fields
//! - Haversine distance calculations that refuse non-finite input
//! - Location normalization from PostGIS columns (GeoJSON, WKT/EWKT, `"lat,lng"` text)
//! - Batch distance annotation with optional parallelism
//! - WASM bindings for browser usage
//!
//! # Example
//!
//! ```
//! use workkar_geo::{distance_km, Coordinate};
//!
//! let hyderabad = Coordinate::new(17.3850, 78.4867);
//! let secunderabad = Coordinate::new(17.4399, 78.4983);
//!
//! let km = distance_km(&hyderabad, &secunderabad).unwrap();
//! assert!((km - 6.2).abs() < 0.5);
//! ```

mod haversine;
mod postgis;
pub mod batch;
mod error;

#[cfg(feature = "wasm")]
mod wasm;

pub use haversine::{distance_km, distance_m, EARTH_RADIUS_KM, EARTH_RADIUS_M};
pub use postgis::{parse_location, parse_wkt_point, GeoJsonPoint};
pub use batch::{calculate_distances, compare_known_first, distances_from, DistanceResult, LocationItem};
pub use error::{GeoError, GeoErrorCode, Result};

use std::fmt;

/// A geographic point with named latitude and longitude.
///
/// Storage formats disagree on axis order (GeoJSON and WKT are `lon lat`,
/// human-facing APIs are `lat, lon`). Everything past the normalization
/// boundary uses this type, never a bare pair.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees (-90 to 90)
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180)
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a new coordinate without validation.
    ///
    /// # Arguments
    /// * `latitude` - Latitude in degrees (-90 to 90)
    /// * `longitude` - Longitude in degrees (-180 to 180)
    #[inline]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Creates a coordinate, rejecting non-finite or out-of-range values.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self> {
        let coord = Self::new(latitude, longitude);
        if coord.is_valid() {
            Ok(coord)
        } else {
            Err(GeoError::InvalidCoordinate(format!(
                "latitude={latitude}, longitude={longitude}"
            )))
        }
    }

    /// Returns true if both components are finite numbers.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Returns true if the coordinate is finite and within WGS84 bounds.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Converts degrees to radians for internal calculations.
    #[inline]
    pub(crate) fn to_radians(self) -> (f64, f64) {
        (self.latitude.to_radians(), self.longitude.to_radians())
    }
}

impl fmt::Display for Coordinate {
    /// Formats as `lat, lon` with four decimals.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}
