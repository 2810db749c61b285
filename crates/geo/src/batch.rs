//! Batch distance calculations with optional parallelism.
//!
//! Output order always matches input order, with or without the `parallel`
//! feature, so callers can zip results back onto their records.

use crate::{distance_km, parse_location, Coordinate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Result of a distance calculation for a single item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceResult {
    /// The item ID
    pub id: String,
    /// Distance in kilometers, absent when the item has no usable location
    #[serde(rename = "distanceKm")]
    pub distance_km: Option<f64>,
}

/// Input item for batch distance calculation.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationItem {
    /// Item ID
    pub id: String,
    /// Location in any format accepted by [`parse_location`]
    #[serde(default)]
    pub location: serde_json::Value,
}

/// Distances from `reference` to every item, in input order.
///
/// Every entry is `None` when there is no reference point; otherwise an entry
/// is `None` when `locate` yields no coordinate for that item.
pub fn distances_from<T, F>(reference: Option<&Coordinate>, items: &[T], locate: F) -> Vec<Option<f64>>
where
    T: Sync,
    F: Fn(&T) -> Option<Coordinate> + Sync + Send,
{
    let Some(reference) = reference else {
        return vec![None; items.len()];
    };

    let single = |item: &T| locate(item).and_then(|coord| distance_km(reference, &coord));

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        items.par_iter().map(single).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        items.iter().map(single).collect()
    }
}

/// Calculate distances from a reference point to raw location items.
///
/// # Example
/// ```
/// use workkar_geo::{calculate_distances, Coordinate, LocationItem};
/// use serde_json::json;
///
/// let items = vec![
///     LocationItem { id: "1".into(), location: json!({"coordinates": [78.4983, 17.4399]}) },
///     LocationItem { id: "2".into(), location: json!("POINT(abc)") },
/// ];
///
/// let results = calculate_distances(&Coordinate::new(17.3850, 78.4867), &items);
/// assert!(results[0].distance_km.is_some());
/// assert!(results[1].distance_km.is_none());
/// ```
pub fn calculate_distances(reference: &Coordinate, items: &[LocationItem]) -> Vec<DistanceResult> {
    let distances = distances_from(Some(reference), items, |item| {
        parse_location(&item.location).ok().flatten()
    });

    items
        .iter()
        .zip(distances)
        .map(|(item, distance_km)| DistanceResult {
            id: item.id.clone(),
            distance_km,
        })
        .collect()
}

/// Calculate distances and return items sorted nearest first.
///
/// Unknown distances sort last; ties keep their input order.
pub fn calculate_distances_sorted(
    reference: &Coordinate,
    items: &[LocationItem],
    max_results: Option<usize>,
) -> Vec<DistanceResult> {
    let mut results = calculate_distances(reference, items);

    results.sort_by(|a, b| compare_known_first(a.distance_km, b.distance_km));

    if let Some(max) = max_results {
        results.truncate(max);
    }

    results
}

/// Ascending order that places `None` after every known distance.
pub fn compare_known_first(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
