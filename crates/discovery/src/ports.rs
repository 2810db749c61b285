//! Driven ports: the collaborators discovery depends on.
//!
//! Backend, device and cache access all sit behind these traits so the
//! pipeline can run against the hosted backend, a snapshot, or fixtures.

use crate::error::{GeolocationError, Result};
use crate::model::Viewer;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use workkar_geo::Coordinate;

/// Source of worker rows.
#[async_trait]
pub trait WorkerDirectory: Send + Sync {
    /// Active workers, newest first, as raw backend rows.
    async fn fetch_active_workers(&self) -> Result<Vec<Value>>;
}

/// Stored location fields for a signed-in viewer.
///
/// Each method returns the raw location column, or `None` when the viewer
/// has no such row or the column is empty.
#[async_trait]
pub trait ViewerLocationSource: Send + Sync {
    /// Location on the viewer's own worker listing, if they are a worker.
    async fn worker_location(&self, viewer: &Viewer) -> Result<Option<Value>>;

    /// Location on the viewer's profile.
    async fn profile_location(&self, viewer: &Viewer) -> Result<Option<Value>>;
}

/// One-shot device position lookup.
#[async_trait]
pub trait Geolocator: Send + Sync {
    /// Current position, or why there is none.
    async fn current_position(&self) -> std::result::Result<Coordinate, GeolocationError>;
}

/// A reverse-geocoded place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    /// Full address line from the provider
    pub display_name: String,
    /// City, town, village or hamlet, when the provider knows it
    pub city: Option<String>,
}

/// Coordinates to human-readable address.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Best-effort lookup of the place at `point`.
    async fn reverse(&self, point: Coordinate) -> Result<Place>;
}

/// Short-lived storage for a single reference location.
pub trait LocationCache: Send + Sync {
    /// Stored point, if present and not expired.
    fn get(&self) -> Option<Coordinate>;

    /// Replace the stored point.
    fn set(&self, point: Coordinate) -> Result<()>;

    /// Forget the stored point.
    fn clear(&self) -> Result<()>;
}

/// Last known stored location per viewer.
///
/// Only ever read back for the viewer it was written for.
pub trait ViewerLocationMemory: Send + Sync {
    /// Point last remembered for `viewer`, if present and not expired.
    fn recall(&self, viewer: &Viewer) -> Option<Coordinate>;

    /// Remember `point` as `viewer`'s stored location.
    fn remember(&self, viewer: &Viewer, point: Coordinate) -> Result<()>;
}

/// Fixture directory serving a fixed set of rows.
#[derive(Debug, Clone, Default)]
pub struct StaticWorkerDirectory {
    rows: Vec<Value>,
}

impl StaticWorkerDirectory {
    pub fn new(rows: Vec<Value>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl WorkerDirectory for StaticWorkerDirectory {
    async fn fetch_active_workers(&self) -> Result<Vec<Value>> {
        Ok(self.rows.clone())
    }
}

/// Geolocator that always answers the same way.
///
/// Stands in for device hardware in the CLI (a configured position) and
/// in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator {
    answer: std::result::Result<Coordinate, GeolocationError>,
}

impl FixedGeolocator {
    /// Always reports `point`.
    pub fn at(point: Coordinate) -> Self {
        Self { answer: Ok(point) }
    }

    /// Always fails with `error`.
    pub fn failing(error: GeolocationError) -> Self {
        Self { answer: Err(error) }
    }
}

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn current_position(&self) -> std::result::Result<Coordinate, GeolocationError> {
        self.answer
    }
}
