//! Location strategies and the first-success combinator.
//!
//! Each strategy answers "where is the viewer?" with a point or nothing.
//! Failures inside a strategy (backend errors, denied permission, timeouts)
//! are logged and turn into nothing; they never stop the chain.
//!
//! `locate` has no side effects. Anything a strategy writes (consuming the
//! pending location, remembering a viewer's location) happens in
//! [`LocationStrategy::committed`], which only the committing resolution
//! calls.

use crate::model::{normalize_location, Viewer};
use crate::ports::{Geolocator, LocationCache, ViewerLocationMemory, ViewerLocationSource};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use workkar_core::ErrorCode;
use workkar_geo::Coordinate;
use workkar_telemetry::metrics;

/// Default bound on waiting for a device position.
pub const GEOLOCATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Inputs shared by every strategy in one resolution.
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    /// The signed-in viewer, if any
    pub viewer: Option<Viewer>,
}

impl ResolveContext {
    pub fn signed_in(viewer: Viewer) -> Self {
        Self {
            viewer: Some(viewer),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// One step in the resolution chain.
#[async_trait]
pub trait LocationStrategy: Send + Sync {
    /// Short name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// A point, or `None` to let the next strategy try.
    async fn locate(&self, ctx: &ResolveContext) -> Option<Coordinate>;

    /// Called once the resolver has committed `point`, found by this strategy.
    fn committed(&self, _ctx: &ResolveContext, _point: Coordinate) {}
}

/// Run strategies in order and return the first point found, with the
/// strategy that found it.
pub async fn first_success<'a>(
    strategies: &'a [Arc<dyn LocationStrategy>],
    ctx: &ResolveContext,
) -> Option<(&'a dyn LocationStrategy, Coordinate)> {
    for strategy in strategies {
        if let Some(point) = strategy.locate(ctx).await {
            debug!(strategy = strategy.name(), %point, "Location resolved");
            metrics().increment(&format!("resolver.strategy_hits.{}", strategy.name()));
            return Some((strategy.as_ref(), point));
        }
        debug!(strategy = strategy.name(), "No location from strategy");
    }
    None
}

/// What the backend said about a viewer's stored location.
enum Lookup {
    Found(Coordinate),
    /// Both rows were read and neither has a usable location
    Absent,
    /// At least one read failed and nothing usable came back
    Unreachable,
}

/// The signed-in viewer's stored location: their worker listing first,
/// then their profile.
///
/// With [`remembering`](Self::remembering), a committed location is kept
/// per viewer and reused for that same viewer when the backend cannot be
/// reached.
pub struct StoredViewerLocation {
    source: Arc<dyn ViewerLocationSource>,
    memory: Option<Arc<dyn ViewerLocationMemory>>,
}

impl StoredViewerLocation {
    pub fn new(source: Arc<dyn ViewerLocationSource>) -> Self {
        Self {
            source,
            memory: None,
        }
    }

    /// Remember committed locations in `memory` and fall back to them offline.
    #[must_use]
    pub fn remembering(mut self, memory: Arc<dyn ViewerLocationMemory>) -> Self {
        self.memory = Some(memory);
        self
    }

    async fn lookup(&self, viewer: &Viewer) -> Lookup {
        let mut failed = false;

        match self.source.worker_location(viewer).await {
            Ok(Some(raw)) => {
                if let (Some(point), _) = normalize_location(&viewer.id, &raw) {
                    return Lookup::Found(point);
                }
            }
            Ok(None) => {}
            Err(err) => {
                warn!(viewer = %viewer.id, error = %err, "Worker location lookup failed");
                failed = true;
            }
        }

        match self.source.profile_location(viewer).await {
            Ok(Some(raw)) => {
                if let (Some(point), _) = normalize_location(&viewer.id, &raw) {
                    return Lookup::Found(point);
                }
            }
            Ok(None) => {}
            Err(err) => {
                warn!(viewer = %viewer.id, error = %err, "Profile location lookup failed");
                failed = true;
            }
        }

        if failed { Lookup::Unreachable } else { Lookup::Absent }
    }
}

#[async_trait]
impl LocationStrategy for StoredViewerLocation {
    fn name(&self) -> &'static str {
        "profile"
    }

    async fn locate(&self, ctx: &ResolveContext) -> Option<Coordinate> {
        let viewer = ctx.viewer.as_ref()?;
        match self.lookup(viewer).await {
            Lookup::Found(point) => Some(point),
            Lookup::Absent => None,
            Lookup::Unreachable => {
                let point = self.memory.as_ref()?.recall(viewer)?;
                debug!(viewer = %viewer.id, %point, "Using remembered location while backend is unreachable");
                Some(point)
            }
        }
    }

    fn committed(&self, ctx: &ResolveContext, point: Coordinate) {
        let (Some(memory), Some(viewer)) = (&self.memory, &ctx.viewer) else {
            return;
        };
        if let Err(err) = memory.remember(viewer, point) {
            warn!(viewer = %viewer.id, error = %err, "Failed to remember viewer location");
        }
    }
}

/// The device's current position, bounded by a timeout.
pub struct DeviceGeolocation {
    geolocator: Arc<dyn Geolocator>,
    timeout: Duration,
}

impl DeviceGeolocation {
    pub fn new(geolocator: Arc<dyn Geolocator>) -> Self {
        Self {
            geolocator,
            timeout: GEOLOCATION_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl LocationStrategy for DeviceGeolocation {
    fn name(&self) -> &'static str {
        "device"
    }

    async fn locate(&self, _ctx: &ResolveContext) -> Option<Coordinate> {
        match tokio::time::timeout(self.timeout, self.geolocator.current_position()).await {
            Ok(Ok(point)) if point.is_valid() => Some(point),
            Ok(Ok(point)) => {
                warn!(code = %ErrorCode::MalformedCoordinates, %point, "Device reported an invalid position");
                None
            }
            Ok(Err(err)) => {
                warn!(code = %err.code(), error = %err, "Device location unavailable");
                None
            }
            Err(_) => {
                warn!(
                    code = %ErrorCode::GeolocationTimeout,
                    timeout_ms = self.timeout.as_millis(),
                    "Device location timed out"
                );
                None
            }
        }
    }
}

/// A location left in the cache (e.g. by sign-up), consumed once by the
/// resolution that commits it.
pub struct PendingLocation {
    cache: Arc<dyn LocationCache>,
}

impl PendingLocation {
    pub fn new(cache: Arc<dyn LocationCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl LocationStrategy for PendingLocation {
    fn name(&self) -> &'static str {
        "cached"
    }

    async fn locate(&self, _ctx: &ResolveContext) -> Option<Coordinate> {
        self.cache.get()
    }

    fn committed(&self, _ctx: &ResolveContext, point: Coordinate) {
        // A newer value may have been stored since this one was read
        if self.cache.get() != Some(point) {
            return;
        }
        if let Err(err) = self.cache.clear() {
            warn!(error = %err, "Failed to clear consumed pending location");
        }
    }
}
