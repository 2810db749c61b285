//! Typed access to the backend views
//!
//! | Module | View | Description |
//! |--------|------|-------------|
//! | `workers` | `workers_with_geojson` | Worker listings with GeoJSON locations |
//! | `profiles` | `profiles_with_geojson` | Viewer profiles with GeoJSON locations |
//!
//! View names are configurable; the defaults are shown.

pub mod profiles;
pub mod workers;

pub use profiles::ProfilesApi;
pub use workers::WorkersApi;

use serde_json::Value;

/// Columns that may hold a stored location, preferred first
pub(crate) const LOCATION_COLUMNS: &str = "location_coordinates_geojson,location_coordinates";

/// Pull the location out of a single-row PostgREST response
///
/// Prefers the first column that parses as a point, GeoJSON first. When no
/// column parses, the first non-null value is returned so the caller can
/// report it as malformed.
pub(crate) fn location_from_rows(rows: Vec<Value>) -> Option<Value> {
    let row = rows.into_iter().next()?;

    let present: Vec<&Value> = ["location_coordinates_geojson", "location_coordinates"]
        .into_iter()
        .filter_map(|column| row.get(column))
        .filter(|value| !value.is_null())
        .collect();

    present
        .iter()
        .find(|value| matches!(workkar_geo::parse_location(value), Ok(Some(_))))
        .or_else(|| present.first())
        .copied()
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_location_prefers_geojson() {
        let rows = vec![json!({
            "location_coordinates_geojson": {"type": "Point", "coordinates": [78.4, 17.4]},
            "location_coordinates": "0101000020E6100000"
        })];
        assert_eq!(location_from_rows(rows).unwrap()["type"], "Point");
    }

    #[test]
    fn test_location_falls_back_to_raw_column() {
        let rows = vec![json!({
            "location_coordinates_geojson": null,
            "location_coordinates": "17.4,78.4"
        })];
        assert_eq!(location_from_rows(rows), Some(json!("17.4,78.4")));
    }

    #[test]
    fn test_location_skips_unparsable_geojson() {
        let rows = vec![json!({
            "location_coordinates_geojson": {"type": "Point", "coordinates": ["x"]},
            "location_coordinates": "17.4,78.4"
        })];
        assert_eq!(location_from_rows(rows), Some(json!("17.4,78.4")));
    }

    #[test]
    fn test_location_reports_malformed_when_nothing_parses() {
        let rows = vec![json!({
            "location_coordinates_geojson": {"type": "Point", "coordinates": ["x"]},
            "location_coordinates": "0101000020E6100000"
        })];
        assert_eq!(location_from_rows(rows).unwrap()["type"], "Point");
    }

    #[test]
    fn test_no_rows_or_empty_columns() {
        assert_eq!(location_from_rows(Vec::new()), None);
        assert_eq!(location_from_rows(vec![json!({"location_coordinates": null})]), None);
    }
}
