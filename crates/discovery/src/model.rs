//! Worker records and their normalization from backend rows.
//!
//! Rows arrive as loosely typed JSON from the worker directory view. Each row
//! is decoded on its own: an undecodable row is dropped and counted, a row
//! with an unreadable location keeps its place with no coordinates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use workkar_core::ErrorCode;
use workkar_geo::{parse_location, Coordinate};
use workkar_telemetry::metrics;

/// Highest rating a worker can carry.
pub const MAX_RATING: f64 = 5.0;

/// The signed-in viewer, as exposed by the session provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    /// Auth user id
    pub id: String,
}

impl Viewer {
    /// Viewer with the given user id.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Primary keys come back as integers, older snapshots as strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RowId {
    Int(i64),
    Text(String),
}

impl RowId {
    fn into_string(self) -> String {
        match self {
            Self::Int(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

/// A worker row as returned by the directory view.
#[derive(Debug, Clone, Deserialize)]
struct WorkerRow {
    id: RowId,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    service_category: Option<String>,
    #[serde(default)]
    service_subcategories: Option<Vec<String>>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    total_reviews: Option<i64>,
    #[serde(default)]
    location_coordinates_geojson: Value,
    #[serde(default)]
    location_coordinates: Value,
    #[serde(default)]
    location_address: Option<String>,
    #[serde(default)]
    mobile_number: Option<String>,
    #[serde(default)]
    business_name: Option<String>,
    #[serde(default)]
    is_active: Option<bool>,
    #[serde(default)]
    verification_status: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

/// A worker as the discovery pipeline sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRecord {
    pub id: String,
    pub user_id: Option<String>,
    pub name: String,
    pub category: String,
    pub subcategories: Vec<String>,
    /// Absent when the worker never set a location or it was unreadable
    pub coordinates: Option<Coordinate>,
    pub location_address: Option<String>,
    /// Clamped to `0.0..=5.0`
    pub rating: f64,
    pub review_count: u32,
    pub business_name: Option<String>,
    pub mobile_number: Option<String>,
    pub is_active: bool,
    pub verification_status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl WorkerRecord {
    /// Minimal record, mostly for fixtures.
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user_id: None,
            name: name.into(),
            category: category.into(),
            subcategories: Vec::new(),
            coordinates: None,
            location_address: None,
            rating: 0.0,
            review_count: 0,
            business_name: None,
            mobile_number: None,
            is_active: true,
            verification_status: None,
            created_at: None,
        }
    }

    #[must_use]
    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.coordinates = Some(Coordinate::new(latitude, longitude));
        self
    }

    #[must_use]
    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = clamp_rating(rating);
        self
    }

    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.location_address = Some(address.into());
        self
    }

    #[must_use]
    pub fn with_subcategories<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subcategories = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// A worker annotated with its distance from the reference location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedWorker {
    #[serde(flatten)]
    pub worker: WorkerRecord,
    /// Present iff both the worker and the reference location have coordinates
    pub distance_km: Option<f64>,
}

/// Output of [`normalize_rows`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedBatch {
    /// Decoded workers in backend order
    pub workers: Vec<WorkerRecord>,
    /// Rows dropped because they could not be decoded at all
    pub rejected: usize,
    /// Workers kept without coordinates because their location was unreadable
    pub malformed_locations: usize,
}

/// Decode backend rows into worker records.
///
/// One bad row never aborts the batch.
pub fn normalize_rows(rows: Vec<Value>) -> NormalizedBatch {
    let mut batch = NormalizedBatch {
        workers: Vec::with_capacity(rows.len()),
        ..NormalizedBatch::default()
    };

    for (index, row) in rows.into_iter().enumerate() {
        let row: WorkerRow = match serde_json::from_value(row) {
            Ok(row) => row,
            Err(err) => {
                warn!(index, error = %err, "Dropping undecodable worker row");
                batch.rejected += 1;
                continue;
            }
        };

        let (record, malformed) = record_from_row(row);
        if malformed {
            batch.malformed_locations += 1;
        }
        batch.workers.push(record);
    }

    if batch.rejected > 0 {
        metrics().increment_by("discovery.rows_rejected", batch.rejected as u64);
    }
    if batch.malformed_locations > 0 {
        metrics().increment_by("discovery.coordinates_malformed", batch.malformed_locations as u64);
    }
    debug!(
        workers = batch.workers.len(),
        rejected = batch.rejected,
        malformed = batch.malformed_locations,
        "Normalized worker rows"
    );

    batch
}

/// Parse a stored location, logging and discarding anything malformed.
///
/// Returns the point (if any) and whether the input was malformed.
pub fn normalize_location(owner: &str, raw: &Value) -> (Option<Coordinate>, bool) {
    match parse_location(raw) {
        Ok(point) => (point, false),
        Err(err) => {
            warn!(
                owner,
                code = %ErrorCode::MalformedCoordinates,
                geo_code = err.code() as u32,
                error = %err,
                "Ignoring malformed location"
            );
            (None, true)
        }
    }
}

fn record_from_row(row: WorkerRow) -> (WorkerRecord, bool) {
    let id = row.id.into_string();

    // GeoJSON projection first, raw column when it is empty or unreadable
    let (coordinates, malformed) = match normalize_location(&id, &row.location_coordinates_geojson) {
        (Some(point), _) => (Some(point), false),
        (None, geojson_malformed) => match normalize_location(&id, &row.location_coordinates) {
            (Some(point), _) => (Some(point), false),
            (None, raw_malformed) => (None, geojson_malformed || raw_malformed),
        },
    };

    let created_at = row.created_at.as_deref().and_then(|s| {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    });

    let category = row.service_category.unwrap_or_default();
    let record = WorkerRecord {
        name: row.full_name.unwrap_or_default(),
        user_id: row.user_id,
        subcategories: row.service_subcategories.unwrap_or_default(),
        coordinates,
        location_address: row.location_address,
        rating: clamp_rating(row.rating.unwrap_or(0.0)),
        review_count: row
            .total_reviews
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0),
        business_name: row.business_name.filter(|s| !s.trim().is_empty()),
        mobile_number: row.mobile_number,
        is_active: row.is_active.unwrap_or(true),
        verification_status: row.verification_status,
        created_at,
        category,
        id,
    };

    (record, malformed)
}

fn clamp_rating(rating: f64) -> f64 {
    if rating.is_finite() {
        rating.clamp(0.0, MAX_RATING)
    } else {
        0.0
    }
}
