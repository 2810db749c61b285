//! Fetch-and-rank cycles over the worker directory.
//!
//! Each call to [`WorkerFeed::refresh`] is one cycle: fetch rows, normalize,
//! rank against the reference location, publish. Cycles carry a generation
//! and only the newest one may publish. A failed fetch never ranks partial
//! data; it publishes the error together with the last stored snapshot, if
//! there is one.

use crate::error::DiscoveryError;
use crate::model::{normalize_rows, WorkerRecord};
use crate::pagination::BrowseView;
use crate::ports::WorkerDirectory;
use crate::ranking::SortMode;
use crate::resolver::{LocationResolver, ResolveContext, ResolveOutcome};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use workkar_core::cache::Cache;
use workkar_geo::Coordinate;
use workkar_telemetry::{metrics, Timer};

/// Cache key for the offline worker snapshot.
pub const WORKERS_CACHE_KEY: &str = "workers";

/// Where a snapshot's records came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    Live,
    Cache,
}

/// A ranked view over one set of records.
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub view: BrowseView,
    pub source: RecordSource,
    /// When cached records were stored
    pub stored_at: Option<DateTime<Utc>>,
    /// Rows dropped during normalization
    pub rejected: usize,
}

/// Published feed state.
#[derive(Debug, Clone, Default)]
pub enum FeedState {
    #[default]
    Idle,
    Loading,
    Ready(FeedSnapshot),
    Failed {
        error: DiscoveryError,
        retryable: bool,
        /// Last stored snapshot, ranked against the same reference
        cached: Option<FeedSnapshot>,
    },
}

/// Feed state tagged with the cycle that produced it.
#[derive(Debug, Clone, Default)]
pub struct FeedStatus {
    pub generation: u64,
    pub state: FeedState,
}

/// Result of one fetch-and-rank cycle.
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    Ready(FeedSnapshot),
    Failed {
        error: DiscoveryError,
        cached: Option<FeedSnapshot>,
    },
    /// A newer cycle started before this one finished.
    Superseded,
}

/// Worker feed with snapshot fallback.
pub struct WorkerFeed {
    directory: Arc<dyn WorkerDirectory>,
    snapshots: Option<Arc<Cache>>,
    snapshot_ttl: Duration,
    page_size: usize,
    status: watch::Sender<FeedStatus>,
}

impl WorkerFeed {
    pub fn new(directory: Arc<dyn WorkerDirectory>) -> Self {
        let (status, _) = watch::channel(FeedStatus::default());
        Self {
            directory,
            snapshots: None,
            snapshot_ttl: Duration::from_secs(86_400),
            page_size: crate::pagination::PAGE_SIZE,
            status,
        }
    }

    /// Store every successful fetch in `cache` and fall back to it on failure.
    #[must_use]
    pub fn with_snapshots(mut self, cache: Arc<Cache>, ttl: Duration) -> Self {
        self.snapshots = Some(cache);
        self.snapshot_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Current state.
    pub fn state(&self) -> FeedState {
        self.status.borrow().state.clone()
    }

    /// Observe state changes.
    pub fn subscribe(&self) -> watch::Receiver<FeedStatus> {
        self.status.subscribe()
    }

    /// Run one fetch-and-rank cycle.
    pub async fn refresh(&self, reference: Option<Coordinate>, sort: SortMode) -> CycleOutcome {
        let generation = self.begin();
        debug!(generation, ?reference, %sort, "Starting fetch-and-rank cycle");

        let (outcome, fetched) = match self.directory.fetch_active_workers().await {
            Ok(rows) => {
                let batch = normalize_rows(rows);
                let fetched = self.snapshots.is_some().then(|| batch.workers.clone());
                let snapshot = self.build(batch.workers, reference, sort, RecordSource::Live, None, batch.rejected);
                (CycleOutcome::Ready(snapshot), fetched)
            }
            Err(error) => {
                warn!(generation, error = %error, retryable = error.is_retryable(), "Worker fetch failed");
                let cached = self
                    .load_snapshot()
                    .map(|(records, stored_at)| self.build(records, reference, sort, RecordSource::Cache, stored_at, 0));
                (CycleOutcome::Failed { error, cached }, None)
            }
        };

        let outcome = self.commit(generation, outcome);
        // Only the committed cycle may replace the offline snapshot
        if let (CycleOutcome::Ready(_), Some(records)) = (&outcome, fetched) {
            self.store_snapshot(&records);
        }
        outcome
    }

    fn build(
        &self,
        records: Vec<WorkerRecord>,
        reference: Option<Coordinate>,
        sort: SortMode,
        source: RecordSource,
        stored_at: Option<DateTime<Utc>>,
        rejected: usize,
    ) -> FeedSnapshot {
        let timer = Timer::start("discovery.rank_ms");
        let view = BrowseView::new(records, reference, sort).with_page_size(self.page_size);
        timer.stop();
        FeedSnapshot {
            view,
            source,
            stored_at,
            rejected,
        }
    }

    fn begin(&self) -> u64 {
        let mut generation = 0;
        self.status.send_modify(|status| {
            status.generation += 1;
            status.state = FeedState::Loading;
            generation = status.generation;
        });
        generation
    }

    fn commit(&self, generation: u64, outcome: CycleOutcome) -> CycleOutcome {
        let next = match &outcome {
            CycleOutcome::Ready(snapshot) => FeedState::Ready(snapshot.clone()),
            CycleOutcome::Failed { error, cached } => FeedState::Failed {
                error: error.clone(),
                retryable: error.is_retryable(),
                cached: cached.clone(),
            },
            CycleOutcome::Superseded => return CycleOutcome::Superseded,
        };

        let committed = self.status.send_if_modified(|status| {
            if status.generation != generation {
                return false;
            }
            status.state = next;
            true
        });

        if committed {
            if let CycleOutcome::Ready(snapshot) = &outcome {
                info!(
                    generation,
                    workers = snapshot.view.ranked().len(),
                    rejected = snapshot.rejected,
                    "Worker feed ready"
                );
            }
            outcome
        } else {
            debug!(generation, "Discarding superseded fetch-and-rank cycle");
            metrics().increment("discovery.cycles_superseded");
            CycleOutcome::Superseded
        }
    }

    fn store_snapshot(&self, records: &[WorkerRecord]) {
        let Some(cache) = &self.snapshots else {
            return;
        };
        if let Err(err) = cache.set(WORKERS_CACHE_KEY, &records, Some(self.snapshot_ttl)) {
            warn!(error = %err, "Failed to store worker snapshot");
        }
    }

    fn load_snapshot(&self) -> Option<(Vec<WorkerRecord>, Option<DateTime<Utc>>)> {
        let cache = self.snapshots.as_ref()?;
        match cache.get_entry::<Vec<WorkerRecord>>(WORKERS_CACHE_KEY) {
            Ok(Some(hit)) => {
                let stored_at = i64::try_from(hit.stored_at)
                    .ok()
                    .and_then(|secs| DateTime::from_timestamp(secs, 0));
                debug!(workers = hit.value.len(), "Using stored worker snapshot");
                Some((hit.value, stored_at))
            }
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, "Failed to read worker snapshot");
                None
            }
        }
    }
}

/// Resolver plus feed: a location change always triggers a full re-fetch.
pub struct DiscoverySession {
    resolver: LocationResolver,
    feed: WorkerFeed,
    sort: SortMode,
}

impl DiscoverySession {
    pub fn new(resolver: LocationResolver, feed: WorkerFeed, sort: SortMode) -> Self {
        Self { resolver, feed, sort }
    }

    pub fn resolver(&self) -> &LocationResolver {
        &self.resolver
    }

    pub fn feed(&self) -> &WorkerFeed {
        &self.feed
    }

    /// Resolve the viewer's location, then fetch and rank.
    pub async fn load(&self, ctx: &ResolveContext) -> CycleOutcome {
        match self.resolver.resolve(ctx).await {
            ResolveOutcome::Resolved(reference) => self.feed.refresh(reference, self.sort).await,
            ResolveOutcome::Superseded => CycleOutcome::Superseded,
        }
    }

    /// Use a chosen location, then fetch and rank.
    pub async fn set_location(&self, point: Coordinate) -> CycleOutcome {
        self.resolver.set_manual(point);
        self.feed.refresh(Some(point), self.sort).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::StaticWorkerDirectory;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tokio::sync::{oneshot, Mutex};
    use workkar_core::cache::CacheConfig;

    const CHARMINAR: Coordinate = Coordinate::new(17.3616, 78.4747);

    fn rows() -> Vec<Value> {
        vec![
            json!({"id": 1, "full_name": "Far", "service_category": "Plumbing",
                   "location_coordinates_geojson": {"type": "Point", "coordinates": [78.3489, 17.4401]}}),
            json!({"id": 2, "full_name": "Unknown", "service_category": "plumbing"}),
            json!({"id": 3, "full_name": "Near", "service_category": "Electrical",
                   "location_coordinates_geojson": {"type": "Point", "coordinates": [78.4867, 17.3850]}}),
            json!({"full_name": "No id"}),
        ]
    }

    fn ids(snapshot: &FeedSnapshot) -> Vec<&str> {
        snapshot.view.ranked().iter().map(|w| w.worker.id.as_str()).collect()
    }

    /// Succeeds with `rows` or fails, switchable between calls.
    struct Flaky {
        rows: Vec<Value>,
        fail: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl WorkerDirectory for Flaky {
        async fn fetch_active_workers(&self) -> crate::error::Result<Vec<Value>> {
            if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
                Err(DiscoveryError::retryable("connection refused"))
            } else {
                Ok(self.rows.clone())
            }
        }
    }

    /// Each call waits for the next gate and returns its rows.
    struct Gated {
        gates: Mutex<Vec<oneshot::Receiver<Vec<Value>>>>,
    }

    #[async_trait]
    impl WorkerDirectory for Gated {
        async fn fetch_active_workers(&self) -> crate::error::Result<Vec<Value>> {
            let gate = self.gates.lock().await.remove(0);
            gate.await.map_err(|_| DiscoveryError::retryable("cancelled"))
        }
    }

    fn snapshot_cache(dir: &TempDir) -> Arc<Cache> {
        Arc::new(
            Cache::new(CacheConfig {
                cache_dir: dir.path().to_path_buf(),
                default_ttl_secs: 60,
                memory_cache: false,
            })
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_refresh_ranks_by_distance() {
        let feed = WorkerFeed::new(Arc::new(StaticWorkerDirectory::new(rows())));

        let CycleOutcome::Ready(snapshot) = feed.refresh(Some(CHARMINAR), SortMode::Distance).await else {
            panic!("expected ready");
        };

        assert_eq!(ids(&snapshot), vec!["3", "1", "2"]);
        assert_eq!(snapshot.rejected, 1);
        assert_eq!(snapshot.source, RecordSource::Live);
        assert_eq!(snapshot.view.categories().len(), 2);
        assert!(matches!(feed.state(), FeedState::Ready(_)));
    }

    #[tokio::test]
    async fn test_failure_without_snapshot_is_retryable_error() {
        let feed = WorkerFeed::new(Arc::new(Flaky {
            rows: rows(),
            fail: true.into(),
        }));

        let outcome = feed.refresh(None, SortMode::Distance).await;

        assert!(matches!(outcome, CycleOutcome::Failed { cached: None, .. }));
        match feed.state() {
            FeedState::Failed { retryable, cached, .. } => {
                assert!(retryable);
                assert!(cached.is_none());
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_stored_snapshot() {
        let dir = TempDir::new().unwrap();
        let directory = Arc::new(Flaky {
            rows: rows(),
            fail: false.into(),
        });
        let feed = WorkerFeed::new(directory.clone()).with_snapshots(snapshot_cache(&dir), Duration::from_secs(60));

        assert!(matches!(feed.refresh(None, SortMode::Distance).await, CycleOutcome::Ready(_)));
        directory.fail.store(true, std::sync::atomic::Ordering::SeqCst);

        let CycleOutcome::Failed { error, cached: Some(cached) } =
            feed.refresh(Some(CHARMINAR), SortMode::Distance).await
        else {
            panic!("expected failure with cached snapshot");
        };

        assert!(error.is_retryable());
        assert_eq!(cached.source, RecordSource::Cache);
        assert!(cached.stored_at.is_some());
        assert_eq!(ids(&cached), vec!["3", "1", "2"]);
    }

    #[tokio::test]
    async fn test_older_cycle_cannot_overwrite_newer() {
        let (release_a, gate_a) = oneshot::channel();
        let (release_b, gate_b) = oneshot::channel();
        let feed = Arc::new(WorkerFeed::new(Arc::new(Gated {
            gates: Mutex::new(vec![gate_a, gate_b]),
        })));

        let mut updates = feed.subscribe();

        let a = tokio::spawn({
            let feed = feed.clone();
            async move { feed.refresh(None, SortMode::Distance).await }
        });
        updates.wait_for(|s| s.generation == 1).await.unwrap();
        let b = tokio::spawn({
            let feed = feed.clone();
            async move { feed.refresh(None, SortMode::Distance).await }
        });
        updates.wait_for(|s| s.generation == 2).await.unwrap();

        release_b.send(vec![json!({"id": 2, "full_name": "Newer"})]).unwrap();
        assert!(matches!(b.await.unwrap(), CycleOutcome::Ready(_)));
        release_a.send(vec![json!({"id": 1, "full_name": "Older"})]).unwrap();
        assert!(matches!(a.await.unwrap(), CycleOutcome::Superseded));

        let FeedState::Ready(snapshot) = feed.state() else {
            panic!("expected ready");
        };
        assert_eq!(ids(&snapshot), vec!["2"]);
    }

    #[tokio::test]
    async fn test_superseded_cycle_leaves_stored_snapshot() {
        let dir = TempDir::new().unwrap();
        let cache = snapshot_cache(&dir);
        let (release_a, gate_a) = oneshot::channel();
        let (release_b, gate_b) = oneshot::channel();
        let feed = Arc::new(
            WorkerFeed::new(Arc::new(Gated {
                gates: Mutex::new(vec![gate_a, gate_b]),
            }))
            .with_snapshots(cache.clone(), Duration::from_secs(60)),
        );
        let mut updates = feed.subscribe();

        let a = tokio::spawn({
            let feed = feed.clone();
            async move { feed.refresh(None, SortMode::Distance).await }
        });
        updates.wait_for(|s| s.generation == 1).await.unwrap();
        let b = tokio::spawn({
            let feed = feed.clone();
            async move { feed.refresh(None, SortMode::Distance).await }
        });
        updates.wait_for(|s| s.generation == 2).await.unwrap();

        release_b.send(vec![json!({"id": 2, "full_name": "Newer"})]).unwrap();
        assert!(matches!(b.await.unwrap(), CycleOutcome::Ready(_)));
        release_a.send(vec![json!({"id": 1, "full_name": "Older"})]).unwrap();
        assert!(matches!(a.await.unwrap(), CycleOutcome::Superseded));

        let stored: Vec<WorkerRecord> = cache.get(WORKERS_CACHE_KEY).unwrap().unwrap();
        let stored_ids: Vec<&str> = stored.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(stored_ids, vec!["2"]);
    }

    #[tokio::test]
    async fn test_session_manual_location_refetches() {
        let session = DiscoverySession::new(
            LocationResolver::new(vec![]),
            WorkerFeed::new(Arc::new(StaticWorkerDirectory::new(rows()))),
            SortMode::Distance,
        );

        let CycleOutcome::Ready(snapshot) = session.load(&ResolveContext::anonymous()).await else {
            panic!("expected ready");
        };
        assert_eq!(ids(&snapshot), vec!["1", "2", "3"]);

        let CycleOutcome::Ready(snapshot) = session.set_location(CHARMINAR).await else {
            panic!("expected ready");
        };
        assert_eq!(ids(&snapshot), vec!["3", "1", "2"]);
        assert_eq!(session.resolver().snapshot().source, Some("manual"));
    }

    #[tokio::test]
    async fn test_subscribe_sees_ready_state() {
        let feed = WorkerFeed::new(Arc::new(StaticWorkerDirectory::new(rows())));
        let mut updates = feed.subscribe();

        feed.refresh(None, SortMode::Rating).await;

        let status = updates.borrow_and_update().clone();
        assert_eq!(status.generation, 1);
        assert!(matches!(status.state, FeedState::Ready(_)));
    }
}
