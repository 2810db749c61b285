//! PostGIS location normalization.
//!
//! Supports parsing coordinates from:
//! - GeoJSON format: `{"type": "Point", "coordinates": [lng, lat]}`
//! - WKT / EWKT format: `POINT(lng lat)`, `SRID=4326;POINT(lng lat)`
//! - Profile text format: `"lat,lng"`
//!
//! Absent data (`null`, empty string) is `Ok(None)`. Present but unparsable
//! data is an error, so callers can log it before treating it as absent.

use crate::{Coordinate, GeoError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

const NUMBER: &str = r"[+-]?(?:\d+\.?\d*|\.\d+)";

static WKT_POINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^\s*(?:SRID=\d+;)?\s*POINT\s*\(\s*({NUMBER})\s+({NUMBER})\s*\)\s*$"
    ))
    .expect("WKT point regex is valid")
});

static WKT_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:SRID=\d+;)?\s*POINT\b").expect("WKT prefix regex is valid")
});

static LAT_LNG_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^\s*({NUMBER})\s*,\s*({NUMBER})\s*$")).expect("pair regex is valid")
});

/// GeoJSON Point format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoJsonPoint {
    /// Should be "Point" when present
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub point_type: Option<String>,
    /// `[longitude, latitude]`, optionally followed by altitude
    pub coordinates: Vec<f64>,
}

impl GeoJsonPoint {
    /// Converts to a coordinate, reading index 0 as longitude and index 1 as latitude.
    pub fn to_coordinate(&self) -> Result<Coordinate> {
        if let Some(kind) = &self.point_type {
            if !kind.eq_ignore_ascii_case("point") {
                return Err(GeoError::MalformedGeoJson(format!(
                    "Expected Point geometry, got: {kind}"
                )));
            }
        }

        match self.coordinates.as_slice() {
            [lng, lat, ..] => Coordinate::try_new(*lat, *lng),
            other => Err(GeoError::MalformedGeoJson(format!(
                "Expected [lng, lat], got {} values",
                other.len()
            ))),
        }
    }
}

/// Parse a location column value from the backend.
///
/// This is the normalization boundary: whatever representation the row
/// carries, the result is a named [`Coordinate`] or nothing.
///
/// # Returns
/// * `Ok(Some(Coordinate))` if a valid point was found
/// * `Ok(None)` if the value is null or an empty string
/// * `Err(GeoError)` if the value is present but malformed
///
/// # Example
/// ```
/// use workkar_geo::parse_location;
/// use serde_json::json;
///
/// // GeoJSON format
/// let geojson = json!({"type": "Point", "coordinates": [78.49, 17.39]});
/// let coord = parse_location(&geojson).unwrap().unwrap();
/// assert!((coord.latitude - 17.39).abs() < 0.0001);
///
/// // WKT format
/// let wkt = json!("POINT(78.49 17.39)");
/// let coord = parse_location(&wkt).unwrap().unwrap();
/// assert!((coord.longitude - 78.49).abs() < 0.0001);
///
/// // Malformed WKT is an error, never (0, 0)
/// assert!(parse_location(&json!("POINT(abc)")).is_err());
/// ```
pub fn parse_location(value: &serde_json::Value) -> Result<Option<Coordinate>> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Object(_) => {
            let point: GeoJsonPoint = serde_json::from_value(value.clone())
                .map_err(|e| GeoError::MalformedGeoJson(e.to_string()))?;
            point.to_coordinate().map(Some)
        }
        serde_json::Value::String(text) => parse_location_text(text),
        other => Err(GeoError::UnsupportedFormat(format!(
            "Expected GeoJSON object or string, got: {other}"
        ))),
    }
}

fn parse_location_text(text: &str) -> Result<Option<Coordinate>> {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Ok(None);
    }

    // Some views hand GeoJSON back as a JSON-encoded string.
    if trimmed.starts_with('{') {
        let value: serde_json::Value = serde_json::from_str(trimmed)?;
        return parse_location(&value);
    }

    if WKT_PREFIX.is_match(trimmed) {
        return parse_wkt_point(trimmed).map(Some);
    }

    if let Some(caps) = LAT_LNG_PAIR.captures(trimmed) {
        let lat = parse_number(&caps[1], "latitude")?;
        let lng = parse_number(&caps[2], "longitude")?;
        return Coordinate::try_new(lat, lng).map(Some);
    }

    Err(GeoError::UnsupportedFormat(format!(
        "Unrecognized location text: {trimmed}"
    )))
}

/// Parse a WKT POINT string.
///
/// Format: `POINT(longitude latitude)`, optionally prefixed with `SRID=n;`.
/// Both components must be plain signed decimals.
pub fn parse_wkt_point(wkt: &str) -> Result<Coordinate> {
    let caps = WKT_POINT
        .captures(wkt)
        .ok_or_else(|| GeoError::InvalidWkt(format!("Expected POINT(lng lat), got: {}", wkt.trim())))?;

    let lng = parse_number(&caps[1], "longitude")?;
    let lat = parse_number(&caps[2], "latitude")?;

    Coordinate::try_new(lat, lng)
}

fn parse_number(raw: &str, axis: &str) -> Result<f64> {
    raw.parse()
        .map_err(|_| GeoError::InvalidWkt(format!("Invalid {axis}: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::GeoErrorCode;

    fn assert_close(coord: Coordinate, lat: f64, lng: f64) {
        assert!((coord.latitude - lat).abs() < 0.0001, "latitude {}", coord.latitude);
        assert!((coord.longitude - lng).abs() < 0.0001, "longitude {}", coord.longitude);
    }

    #[test]
    fn test_parse_geojson_reverses_axis_order() {
        let value = json!({"coordinates": [78.49, 17.39]});
        let coord = parse_location(&value).unwrap().unwrap();
        assert_close(coord, 17.39, 78.49);
    }

    #[test]
    fn test_parse_geojson_with_type_and_altitude() {
        let value = json!({"type": "Point", "coordinates": [78.49, 17.39, 540.0]});
        let coord = parse_location(&value).unwrap().unwrap();
        assert_close(coord, 17.39, 78.49);
    }

    #[test]
    fn test_parse_geojson_missing_array_is_error() {
        assert!(parse_location(&json!({"type": "Point"})).is_err());
        assert!(parse_location(&json!({"coordinates": [78.49]})).is_err());
        assert!(parse_location(&json!({"coordinates": "78.49 17.39"})).is_err());
    }

    #[test]
    fn test_parse_geojson_wrong_geometry_is_error() {
        let value = json!({"type": "LineString", "coordinates": [78.49, 17.39]});
        let err = parse_location(&value).unwrap_err();
        assert_eq!(err.code(), GeoErrorCode::MalformedGeoJson);
    }

    #[test]
    fn test_parse_wkt_point() {
        let coord = parse_location(&json!("POINT(78.4867 17.3850)")).unwrap().unwrap();
        assert_close(coord, 17.3850, 78.4867);
    }

    #[test]
    fn test_parse_wkt_with_space_and_srid() {
        let coord = parse_location(&json!("POINT (78.4867 17.3850)")).unwrap().unwrap();
        assert_close(coord, 17.3850, 78.4867);

        let coord = parse_location(&json!("SRID=4326;POINT(78.4867 17.3850)")).unwrap().unwrap();
        assert_close(coord, 17.3850, 78.4867);
    }

    #[test]
    fn test_parse_negative_coordinates() {
        let coord = parse_location(&json!("POINT(-74.0060 40.7128)")).unwrap().unwrap();
        assert_close(coord, 40.7128, -74.0060);
    }

    #[test]
    fn test_malformed_wkt_is_error_not_origin() {
        let result = parse_location(&json!("POINT(abc)"));
        assert!(matches!(result, Err(GeoError::InvalidWkt(_))));

        assert!(parse_wkt_point("POINT(78.49)").is_err());
        assert!(parse_wkt_point("POINT(1e5 2)").is_err());
        assert!(parse_wkt_point("POLYGON((0 0, 1 1, 1 0, 0 0))").is_err());
    }

    #[test]
    fn test_out_of_range_wkt_is_error() {
        // Transposed pair puts latitude at 178
        assert!(parse_wkt_point("POINT(17.39 178.49)").is_err());
    }

    #[test]
    fn test_parse_lat_lng_pair() {
        let coord = parse_location(&json!("40.7128,-74.0060")).unwrap().unwrap();
        assert_close(coord, 40.7128, -74.0060);
    }

    #[test]
    fn test_parse_geojson_encoded_as_string() {
        let value = json!(r#"{"type":"Point","coordinates":[78.49,17.39]}"#);
        let coord = parse_location(&value).unwrap().unwrap();
        assert_close(coord, 17.39, 78.49);
    }

    #[test]
    fn test_absent_values_are_none() {
        assert!(parse_location(&json!(null)).unwrap().is_none());
        assert!(parse_location(&json!("   ")).unwrap().is_none());
    }

    #[test]
    fn test_unsupported_values_are_errors() {
        assert!(parse_location(&json!(42)).is_err());
        assert!(parse_location(&json!([78.49, 17.39])).is_err());
        assert!(parse_location(&json!("Hyderabad")).is_err());
    }
}
