//! Location cache implementations.

use crate::error::Result;
use crate::model::Viewer;
use crate::ports::{LocationCache, ViewerLocationMemory};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::warn;
use workkar_core::cache::Cache;
use workkar_geo::Coordinate;

/// Cache key for the pending location.
pub const PENDING_LOCATION_KEY: &str = "pending_location";

/// Cache key prefix for remembered viewer locations.
pub const VIEWER_LOCATION_PREFIX: &str = "viewer_location";

fn viewer_key(viewer: &Viewer) -> String {
    format!("{VIEWER_LOCATION_PREFIX}:{}", viewer.id)
}

/// In-process cache with a time-to-live.
#[derive(Debug)]
pub struct MemoryLocationCache {
    ttl: Duration,
    slot: Mutex<Option<(Coordinate, Instant)>>,
}

impl MemoryLocationCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }
}

impl LocationCache for MemoryLocationCache {
    fn get(&self) -> Option<Coordinate> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match *slot {
            Some((point, stored)) if stored.elapsed() <= self.ttl => Some(point),
            Some(_) => {
                *slot = None;
                None
            }
            None => None,
        }
    }

    fn set(&self, point: Coordinate) -> Result<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some((point, Instant::now()));
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Location cache persisted through the shared file cache, so a location
/// set by one process (e.g. at sign-up) is visible to the next.
#[derive(Debug, Clone)]
pub struct FileLocationCache {
    cache: Arc<Cache>,
    ttl: Duration,
}

impl FileLocationCache {
    pub fn new(cache: Arc<Cache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }
}

impl LocationCache for FileLocationCache {
    fn get(&self) -> Option<Coordinate> {
        match self.cache.get::<Coordinate>(PENDING_LOCATION_KEY) {
            Ok(point) => point.filter(Coordinate::is_valid),
            Err(err) => {
                warn!(error = %err, "Failed to read pending location");
                None
            }
        }
    }

    fn set(&self, point: Coordinate) -> Result<()> {
        self.cache.set(PENDING_LOCATION_KEY, &point, Some(self.ttl))?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.cache.remove(PENDING_LOCATION_KEY)?;
        Ok(())
    }
}

/// Remembered viewer locations held in memory.
#[derive(Debug)]
pub struct MemoryViewerLocations {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Coordinate, Instant)>>,
}

impl MemoryViewerLocations {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl ViewerLocationMemory for MemoryViewerLocations {
    fn recall(&self, viewer: &Viewer) -> Option<Coordinate> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let (point, stored) = *entries.get(&viewer.id)?;
        if stored.elapsed() <= self.ttl {
            return Some(point);
        }
        entries.remove(&viewer.id);
        None
    }

    fn remember(&self, viewer: &Viewer, point: Coordinate) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(viewer.id.clone(), (point, Instant::now()));
        Ok(())
    }
}

/// Remembered viewer locations in the shared file cache, one entry per
/// viewer under `viewer_location:<id>`.
#[derive(Debug, Clone)]
pub struct FileViewerLocations {
    cache: Arc<Cache>,
    ttl: Option<Duration>,
}

impl FileViewerLocations {
    /// Entries expire after the cache's default TTL.
    pub fn new(cache: Arc<Cache>) -> Self {
        Self { cache, ttl: None }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

impl ViewerLocationMemory for FileViewerLocations {
    fn recall(&self, viewer: &Viewer) -> Option<Coordinate> {
        match self.cache.get::<Coordinate>(&viewer_key(viewer)) {
            Ok(point) => point.filter(Coordinate::is_valid),
            Err(err) => {
                warn!(viewer = %viewer.id, error = %err, "Failed to read remembered location");
                None
            }
        }
    }

    fn remember(&self, viewer: &Viewer, point: Coordinate) -> Result<()> {
        self.cache.set(&viewer_key(viewer), &point, self.ttl)?;
        Ok(())
    }
}
