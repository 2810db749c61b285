//! Haversine distance calculation.
//!
//! The Haversine formula calculates the great-circle distance between two points
//! on a sphere given their longitudes and latitudes.

use crate::Coordinate;

/// Earth's mean radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Earth's mean radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Calculates the great-circle distance between two coordinates in kilometers.
///
/// Returns `None` when either coordinate has a non-finite component. The
/// caller must then treat the distance as unknown; there is no placeholder.
///
/// # Example
/// ```
/// use workkar_geo::{distance_km, Coordinate};
///
/// let hyderabad = Coordinate::new(17.3850, 78.4867);
/// let secunderabad = Coordinate::new(17.4399, 78.4983);
///
/// let distance = distance_km(&hyderabad, &secunderabad).unwrap();
/// assert!((distance - 6.2).abs() < 0.5);
///
/// let broken = Coordinate::new(f64::NAN, 78.4983);
/// assert!(distance_km(&hyderabad, &broken).is_none());
/// ```
#[inline]
pub fn distance_km(from: &Coordinate, to: &Coordinate) -> Option<f64> {
    haversine_with_radius(from, to, EARTH_RADIUS_KM)
}

/// Calculates the great-circle distance between two coordinates in meters.
#[inline]
pub fn distance_m(from: &Coordinate, to: &Coordinate) -> Option<f64> {
    haversine_with_radius(from, to, EARTH_RADIUS_M)
}

#[inline]
fn haversine_with_radius(from: &Coordinate, to: &Coordinate, radius: f64) -> Option<f64> {
    if !from.is_finite() || !to.is_finite() {
        return None;
    }

    let (lat1, lon1) = from.to_radians();
    let (lat2, lon2) = to.to_radians();

    let d_lat = lat2 - lat1;
    let d_lon = lon2 - lon1;

    let h = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    // Rounding can push h a hair outside [0, 1] for antipodal points.
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    Some(radius * c)
}
