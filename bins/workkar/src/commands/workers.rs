//! `workers` and `categories`

use super::print_json;
use crate::context::AppContext;
use anyhow::{bail, Result};
use chrono::Utc;
use clap::Args;
use owo_colors::OwoColorize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use workkar_api_client::WorkkarClient;
use workkar_cli::output::{self, format_age, Status};
use workkar_cli::progress;
use workkar_core::cache::Cache;
use workkar_discovery::{
    CycleOutcome, DeviceGeolocation, DiscoverySession, FeedSnapshot, FileViewerLocations, FixedGeolocator,
    LocationCache, LocationResolver, LocationStrategy, PendingLocation, RecordSource,
    ResolveContext, SortMode, StoredViewerLocation, Viewer, WorkerFeed, WorkerFilters,
};
use workkar_geo::Coordinate;

#[derive(Args)]
pub struct WorkersArgs {
    /// distance or rating (defaults to the configured sort)
    #[arg(short, long, value_parser = parse_sort)]
    sort: Option<SortMode>,

    /// Match name, category, business name or tags
    #[arg(short, long)]
    query: Option<String>,

    /// Match the worker's address
    #[arg(short, long)]
    location: Option<String>,

    /// Exact category (case-insensitive)
    #[arg(long)]
    category: Option<String>,

    /// Only workers within this many kilometres
    #[arg(long)]
    within_km: Option<f64>,

    /// Page to show (1-based)
    #[arg(short, long, default_value_t = 1)]
    page: usize,

    /// Use this point as the reference location (LAT,LNG)
    #[arg(long, value_parser = crate::parse_point, allow_hyphen_values = true)]
    near: Option<Coordinate>,

    /// Signed-in viewer whose stored location to use
    #[arg(long)]
    user: Option<String>,
}

fn parse_sort(text: &str) -> Result<SortMode, String> {
    text.parse()
}

impl WorkersArgs {
    fn filters(&self) -> WorkerFilters {
        let mut filters = WorkerFilters::default();
        if let Some(query) = &self.query {
            filters = filters.query(query);
        }
        if let Some(location) = &self.location {
            filters = filters.location(location);
        }
        if let Some(category) = &self.category {
            filters = filters.category(category);
        }
        if let Some(km) = self.within_km {
            filters = filters.within_km(km);
        }
        filters
    }
}

/// Build the resolver chain: stored viewer location, device, pending location
fn strategies(
    ctx: &AppContext,
    client: &Arc<WorkkarClient>,
    cache: &Arc<Cache>,
    signed_in: bool,
) -> Vec<Arc<dyn LocationStrategy>> {
    let mut chain: Vec<Arc<dyn LocationStrategy>> = Vec::new();

    if signed_in {
        let mut stored = StoredViewerLocation::new(client.clone());
        if ctx.settings().discovery.cache_profile_location {
            stored = stored.remembering(Arc::new(FileViewerLocations::new(cache.clone())));
        }
        chain.push(Arc::new(stored));
    }

    if let Some(point) = ctx.device_position() {
        let device = DeviceGeolocation::new(Arc::new(FixedGeolocator::at(point)))
            .with_timeout(ctx.geolocation_timeout());
        chain.push(Arc::new(device));
    }

    let pending: Arc<dyn LocationCache> = Arc::new(ctx.pending_location(cache.clone()));
    chain.push(Arc::new(PendingLocation::new(pending)));
    chain
}

fn feed(ctx: &AppContext, client: Arc<WorkkarClient>, cache: Arc<Cache>) -> WorkerFeed {
    let settings = ctx.settings();
    WorkerFeed::new(client)
        .with_snapshots(cache, Duration::from_secs(settings.cache.workers_ttl_secs))
        .with_page_size(settings.discovery.page_size)
}

/// Unwrap a cycle, falling back to the stored snapshot on failure
fn settle(outcome: CycleOutcome, quiet: bool) -> Result<FeedSnapshot> {
    match outcome {
        CycleOutcome::Ready(snapshot) => Ok(snapshot),
        CycleOutcome::Failed {
            error,
            cached: Some(snapshot),
        } => {
            if !quiet {
                let age = snapshot
                    .stored_at
                    .map(|at| format!(" from {} ago", format_age((Utc::now() - at).num_seconds())))
                    .unwrap_or_default();
                Status::warning(&format!("{error}; showing saved workers{age}"));
            }
            Ok(snapshot)
        }
        CycleOutcome::Failed { error, cached: None } => {
            let failure = if error.is_retryable() {
                workkar_core::Error::backend_unavailable(error.to_string())
            } else {
                workkar_core::Error::backend(error.to_string())
            };
            Err(failure.with_context("Fetching active workers").into())
        }
        CycleOutcome::Superseded => bail!("Request was superseded by a newer one"),
    }
}

/// List ranked workers
pub async fn run(ctx: &AppContext, args: WorkersArgs) -> Result<()> {
    let sort = ctx.sort(args.sort)?;
    let client = Arc::new(ctx.client()?);
    let cache = ctx.cache()?;

    let resolver = LocationResolver::new(strategies(ctx, &client, &cache, args.user.is_some()));
    let session = DiscoverySession::new(resolver, feed(ctx, client, cache), sort);

    let spinner = progress::spinner("Finding workers...");
    let outcome = match args.near {
        Some(point) => session.set_location(point).await,
        None => {
            let resolve = match &args.user {
                Some(id) => ResolveContext::signed_in(Viewer::new(id.clone())),
                None => ResolveContext::anonymous(),
            };
            session.load(&resolve).await
        }
    };
    progress::finish_clear(&spinner);

    let snapshot = settle(outcome, ctx.is_json())?;
    let location_source = session.resolver().snapshot().source;

    let mut view = snapshot.view;
    view.set_filters(args.filters());
    view.go_to(args.page);
    let page = view.current_page();

    if ctx.is_json() {
        return print_json(&json!({
            "source": snapshot.source,
            "storedAt": snapshot.stored_at,
            "reference": view.reference(),
            "locationSource": location_source,
            "sort": view.sort().to_string(),
            "filters": view.filters(),
            "page": page,
        }));
    }

    match view.reference() {
        Some(point) => Status::info(&format!(
            "Near {} ({}) · sorted by {}",
            point,
            location_source.unwrap_or("manual"),
            view.sort()
        )),
        None => Status::info(&format!(
            "No location set · sorted by {} · try --near LAT,LNG or `workkar set-location`",
            view.sort()
        )),
    }
    if snapshot.source == RecordSource::Cache {
        println!("{}", "Showing saved workers (offline)".yellow());
    }
    println!();

    output::print_page(&page, ctx.settings().discovery.page_size);
    Ok(())
}

/// List category facets of the active worker set
pub async fn categories(ctx: &AppContext) -> Result<()> {
    let worker_feed = feed(ctx, Arc::new(ctx.client()?), ctx.cache()?);

    let spinner = progress::spinner("Loading categories...");
    let outcome = worker_feed.refresh(None, SortMode::default()).await;
    progress::finish_clear(&spinner);

    let snapshot = settle(outcome, ctx.is_json())?;
    let categories = snapshot.view.categories();

    if ctx.is_json() {
        return print_json(&categories);
    }

    Status::header("Categories");
    output::print_categories(categories);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use workkar_core::ErrorCode;
    use workkar_discovery::DiscoveryError;

    #[test]
    fn test_parse_sort() {
        assert_eq!(parse_sort("rating").unwrap(), SortMode::Rating);
        assert_eq!(parse_sort("distance").unwrap(), SortMode::Distance);
        assert!(parse_sort("price").is_err());
    }

    #[test]
    fn test_failure_without_snapshot_is_backend_error() {
        let outcome = CycleOutcome::Failed {
            error: DiscoveryError::retryable("connection refused"),
            cached: None,
        };
        let err = settle(outcome, true).unwrap_err();
        let core = err.downcast_ref::<workkar_core::Error>().unwrap();
        assert_eq!(core.code, ErrorCode::BackendUnavailable);
        assert!(core.suggestion.is_some());

        let outcome = CycleOutcome::Failed {
            error: DiscoveryError::permanent("401 unauthorized"),
            cached: None,
        };
        let err = settle(outcome, true).unwrap_err();
        assert_eq!(err.downcast_ref::<workkar_core::Error>().unwrap().code, ErrorCode::BackendError);
    }

    #[test]
    fn test_filters_from_args() {
        let args = WorkersArgs {
            sort: None,
            query: Some("pipe".into()),
            location: None,
            category: Some("Plumbing".into()),
            within_km: Some(5.0),
            page: 1,
            near: None,
            user: None,
        };
        let expected = WorkerFilters::default()
            .query("pipe")
            .category("Plumbing")
            .within_km(5.0);
        assert_eq!(args.filters(), expected);
    }
}
