//! WASM bindings for the geo crate.
//!
//! These bindings let the browser client compute worker distances with the
//! same normalization rules as the native pipeline.

use crate::{batch::LocationItem, calculate_distances, distance_km, parse_location, Coordinate};
use wasm_bindgen::prelude::*;

/// Calculate distance between two coordinates.
///
/// Returns `undefined` when either point has a non-finite component.
#[wasm_bindgen]
pub fn distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> Option<f64> {
    let from = Coordinate::new(lat1, lng1);
    let to = Coordinate::new(lat2, lng2);
    distance_km(&from, &to)
}

/// Calculate distances from the viewer to multiple workers.
///
/// # Arguments
/// * `user_lat` - Viewer's latitude
/// * `user_lng` - Viewer's longitude
/// * `workers_json` - JSON array of `{id, location}` objects
///
/// # Returns
/// JSON array of `{id, distanceKm}` in input order
#[wasm_bindgen]
pub fn calculate_worker_distances(user_lat: f64, user_lng: f64, workers_json: &str) -> Result<String, JsValue> {
    let items: Vec<LocationItem> = serde_json::from_str(workers_json)
        .map_err(|e| JsValue::from_str(&format!("JSON parse error: {}", e)))?;

    let results = calculate_distances(&Coordinate::new(user_lat, user_lng), &items);

    serde_json::to_string(&results)
        .map_err(|e| JsValue::from_str(&format!("JSON serialize error: {}", e)))
}

/// Parse a stored location and return coordinates.
///
/// # Returns
/// JSON string with latitude/longitude, or `null` when absent or malformed
#[wasm_bindgen]
pub fn normalize_location(location_json: &str) -> Result<String, JsValue> {
    let value: serde_json::Value = serde_json::from_str(location_json)
        .map_err(|e| JsValue::from_str(&format!("JSON parse error: {}", e)))?;

    match parse_location(&value) {
        Ok(Some(coord)) => serde_json::to_string(&coord)
            .map_err(|e| JsValue::from_str(&format!("JSON serialize error: {}", e))),
        Ok(None) | Err(_) => Ok("null".to_string()),
    }
}

/// Distance calculation sorted nearest first, unknown distances last.
///
/// `max_results` of 0 returns everything.
#[wasm_bindgen]
pub fn calculate_distances_sorted(
    user_lat: f64,
    user_lng: f64,
    workers_json: &str,
    max_results: u32,
) -> Result<String, JsValue> {
    let items: Vec<LocationItem> = serde_json::from_str(workers_json)
        .map_err(|e| JsValue::from_str(&format!("JSON parse error: {}", e)))?;

    let max = if max_results == 0 { None } else { Some(max_results as usize) };
    let results = crate::batch::calculate_distances_sorted(&Coordinate::new(user_lat, user_lng), &items, max);

    serde_json::to_string(&results)
        .map_err(|e| JsValue::from_str(&format!("JSON serialize error: {}", e)))
}
