//! Location resolution for the current viewer.
//!
//! The resolver runs an ordered list of [`LocationStrategy`]s and publishes
//! its state on a `watch` channel. Every resolution (and every manual
//! update) starts a new generation; a result is only committed if its
//! generation is still current, so a slow lookup can never overwrite a
//! newer answer. Strategy side effects run only for the committed result.

mod strategy;

pub use strategy::{
    first_success, DeviceGeolocation, LocationStrategy, PendingLocation, ResolveContext,
    StoredViewerLocation, GEOLOCATION_TIMEOUT,
};

use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;
use workkar_geo::Coordinate;
use workkar_telemetry::metrics;

/// Where the resolver is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolveState {
    Unresolved,
    Resolving,
    /// `None` is a valid answer: distances are not shown.
    Resolved(Option<Coordinate>),
}

/// Published resolver state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverSnapshot {
    /// Incremented by every resolution, manual update and reset
    pub generation: u64,
    pub state: ResolveState,
    /// Strategy (or `"manual"`) that produced the point
    pub source: Option<&'static str>,
}

impl ResolverSnapshot {
    /// The reference point, if resolved to one.
    pub fn point(&self) -> Option<Coordinate> {
        match self.state {
            ResolveState::Resolved(point) => point,
            _ => None,
        }
    }
}

/// Result of one call to [`LocationResolver::resolve`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolveOutcome {
    /// This resolution was committed.
    Resolved(Option<Coordinate>),
    /// A newer resolution or manual update started first; the result was dropped.
    Superseded,
}

/// Resolves and publishes the viewer's reference location.
pub struct LocationResolver {
    strategies: Vec<Arc<dyn LocationStrategy>>,
    state: watch::Sender<ResolverSnapshot>,
}

impl LocationResolver {
    pub fn new(strategies: Vec<Arc<dyn LocationStrategy>>) -> Self {
        let (state, _) = watch::channel(ResolverSnapshot {
            generation: 0,
            state: ResolveState::Unresolved,
            source: None,
        });
        Self { strategies, state }
    }

    /// Observe state changes.
    pub fn subscribe(&self) -> watch::Receiver<ResolverSnapshot> {
        self.state.subscribe()
    }

    /// Current state.
    pub fn snapshot(&self) -> ResolverSnapshot {
        *self.state.borrow()
    }

    /// Run the strategy chain and commit its answer unless superseded.
    pub async fn resolve(&self, ctx: &ResolveContext) -> ResolveOutcome {
        let generation = self.advance(ResolveState::Resolving, None);
        debug!(generation, "Resolving viewer location");

        let found = first_success(&self.strategies, ctx).await;
        let (source, point) = match &found {
            Some((strategy, point)) => (Some(strategy.name()), Some(*point)),
            None => (None, None),
        };

        let committed = self.state.send_if_modified(|snap| {
            if snap.generation != generation {
                return false;
            }
            snap.state = ResolveState::Resolved(point);
            snap.source = source;
            true
        });

        if committed {
            debug!(generation, ?point, ?source, "Viewer location committed");
            if let Some((strategy, point)) = found {
                strategy.committed(ctx, point);
            }
            ResolveOutcome::Resolved(point)
        } else {
            debug!(generation, "Discarding superseded location resolution");
            metrics().increment("resolver.resolutions_superseded");
            ResolveOutcome::Superseded
        }
    }

    /// Use an explicitly chosen point, superseding any in-flight resolution.
    ///
    /// Returns the new generation.
    pub fn set_manual(&self, point: Coordinate) -> u64 {
        let generation = self.advance(ResolveState::Resolved(Some(point)), Some("manual"));
        debug!(generation, %point, "Viewer location set manually");
        generation
    }

    /// Forget the current location and discard anything in flight.
    pub fn reset(&self) -> u64 {
        self.advance(ResolveState::Unresolved, None)
    }

    fn advance(&self, state: ResolveState, source: Option<&'static str>) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|snap| {
            snap.generation += 1;
            snap.state = state;
            snap.source = source;
            generation = snap.generation;
        });
        generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location_cache::MemoryLocationCache;
    use crate::ports::LocationCache;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::{oneshot, Mutex};

    const SECUNDERABAD: Coordinate = Coordinate::new(17.4399, 78.4983);
    const GACHIBOWLI: Coordinate = Coordinate::new(17.4401, 78.3489);
    const MADHAPUR: Coordinate = Coordinate::new(17.4483, 78.3915);

    struct Fixed(Option<Coordinate>);

    #[async_trait]
    impl LocationStrategy for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn locate(&self, _ctx: &ResolveContext) -> Option<Coordinate> {
            self.0
        }
    }

    /// Answers each call with the next gate's value, once that gate opens.
    struct Gated {
        gates: Mutex<Vec<oneshot::Receiver<Coordinate>>>,
    }

    #[async_trait]
    impl LocationStrategy for Gated {
        fn name(&self) -> &'static str {
            "gated"
        }

        async fn locate(&self, _ctx: &ResolveContext) -> Option<Coordinate> {
            let gate = self.gates.lock().await.remove(0);
            gate.await.ok()
        }
    }

    #[tokio::test]
    async fn test_resolves_first_success() {
        let resolver = LocationResolver::new(vec![Arc::new(Fixed(None)), Arc::new(Fixed(Some(SECUNDERABAD)))]);
        assert_eq!(resolver.snapshot().state, ResolveState::Unresolved);

        let outcome = resolver.resolve(&ResolveContext::anonymous()).await;

        assert_eq!(outcome, ResolveOutcome::Resolved(Some(SECUNDERABAD)));
        let snap = resolver.snapshot();
        assert_eq!(snap.point(), Some(SECUNDERABAD));
        assert_eq!(snap.source, Some("fixed"));
        assert_eq!(snap.generation, 1);
    }

    #[tokio::test]
    async fn test_resolves_to_none_when_chain_is_empty() {
        let resolver = LocationResolver::new(vec![Arc::new(Fixed(None))]);

        let outcome = resolver.resolve(&ResolveContext::anonymous()).await;

        assert_eq!(outcome, ResolveOutcome::Resolved(None));
        assert_eq!(resolver.snapshot().state, ResolveState::Resolved(None));
    }

    #[tokio::test]
    async fn test_newer_resolution_wins_over_slower_older_one() {
        let (release_a, gate_a) = oneshot::channel();
        let (release_b, gate_b) = oneshot::channel();
        let resolver = Arc::new(LocationResolver::new(vec![Arc::new(Gated {
            gates: Mutex::new(vec![gate_a, gate_b]),
        })]));
        let mut updates = resolver.subscribe();

        let a = tokio::spawn({
            let resolver = resolver.clone();
            async move { resolver.resolve(&ResolveContext::anonymous()).await }
        });
        updates.wait_for(|s| s.generation == 1).await.unwrap();

        let b = tokio::spawn({
            let resolver = resolver.clone();
            async move { resolver.resolve(&ResolveContext::anonymous()).await }
        });
        updates.wait_for(|s| s.generation == 2).await.unwrap();

        // B finishes first, then A
        release_b.send(GACHIBOWLI).unwrap();
        assert_eq!(b.await.unwrap(), ResolveOutcome::Resolved(Some(GACHIBOWLI)));
        release_a.send(MADHAPUR).unwrap();
        assert_eq!(a.await.unwrap(), ResolveOutcome::Superseded);

        assert_eq!(resolver.snapshot().point(), Some(GACHIBOWLI));
    }

    #[tokio::test]
    async fn test_superseded_resolution_leaves_pending_location() {
        let (release_a, gate_a) = oneshot::channel::<Coordinate>();
        let (release_b, gate_b) = oneshot::channel::<Coordinate>();
        let pending = Arc::new(MemoryLocationCache::new(Duration::from_secs(60)));
        pending.set(MADHAPUR).unwrap();

        let resolver = Arc::new(LocationResolver::new(vec![
            Arc::new(Gated {
                gates: Mutex::new(vec![gate_a, gate_b]),
            }),
            Arc::new(PendingLocation::new(pending.clone())),
        ]));
        let mut updates = resolver.subscribe();

        let a = tokio::spawn({
            let resolver = resolver.clone();
            async move { resolver.resolve(&ResolveContext::anonymous()).await }
        });
        updates.wait_for(|s| s.generation == 1).await.unwrap();
        let b = tokio::spawn({
            let resolver = resolver.clone();
            async move { resolver.resolve(&ResolveContext::anonymous()).await }
        });
        updates.wait_for(|s| s.generation == 2).await.unwrap();

        // Both gates answer nothing, so both fall through to the pending location
        drop(release_a);
        assert_eq!(a.await.unwrap(), ResolveOutcome::Superseded);
        assert_eq!(pending.get(), Some(MADHAPUR));

        drop(release_b);
        assert_eq!(b.await.unwrap(), ResolveOutcome::Resolved(Some(MADHAPUR)));
        assert_eq!(resolver.snapshot().source, Some("cached"));
        assert_eq!(pending.get(), None);
    }

    #[tokio::test]
    async fn test_manual_update_supersedes_in_flight_resolution() {
        let (release, gate) = oneshot::channel();
        let resolver = Arc::new(LocationResolver::new(vec![Arc::new(Gated {
            gates: Mutex::new(vec![gate]),
        })]));
        let mut updates = resolver.subscribe();

        let pending = tokio::spawn({
            let resolver = resolver.clone();
            async move { resolver.resolve(&ResolveContext::anonymous()).await }
        });
        updates.wait_for(|s| s.state == ResolveState::Resolving).await.unwrap();

        resolver.set_manual(MADHAPUR);
        release.send(SECUNDERABAD).unwrap();

        assert_eq!(pending.await.unwrap(), ResolveOutcome::Superseded);
        let snap = resolver.snapshot();
        assert_eq!(snap.point(), Some(MADHAPUR));
        assert_eq!(snap.source, Some("manual"));
    }

    #[tokio::test]
    async fn test_reset_returns_to_unresolved() {
        let resolver = LocationResolver::new(vec![]);
        resolver.set_manual(SECUNDERABAD);

        let generation = resolver.reset();

        assert_eq!(generation, 2);
        assert_eq!(resolver.snapshot().state, ResolveState::Unresolved);
        assert_eq!(resolver.snapshot().point(), None);
    }
}
