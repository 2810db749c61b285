//! Worker discovery for WorkKar.
//!
//! Answers "which workers should this viewer see, and in what order?":
//!
//! - [`resolver`]: find the viewer's reference location through an ordered
//!   chain of strategies, discarding superseded answers
//! - [`model`]: decode backend rows into [`WorkerRecord`]s
//! - [`ranking`], [`facets`], [`pagination`]: annotate with distance,
//!   filter, sort, derive categories, and page
//! - [`feed`]: fetch-and-rank cycles with an offline snapshot fallback
//! - [`geocode`]: labels for manually chosen locations
//!
//! Backend, device and cache access go through the traits in [`ports`].
//!
//! # Example
//!
//! ```
//! use workkar_discovery::{rank, SortMode, WorkerFilters, WorkerRecord};
//! use workkar_geo::Coordinate;
//!
//! let workers = vec![
//!     WorkerRecord::new("1", "Ravi", "Plumbing").with_coordinates(17.4401, 78.3489),
//!     WorkerRecord::new("2", "Asha", "Electrical").with_coordinates(17.3850, 78.4867),
//! ];
//! let here = Coordinate::new(17.3616, 78.4747);
//!
//! let ranked = rank(&workers, Some(here), SortMode::Distance, &WorkerFilters::default());
//! assert_eq!(ranked[0].worker.id, "2");
//! ```

pub mod error;
pub mod facets;
pub mod feed;
pub mod geocode;
pub mod location_cache;
pub mod model;
pub mod pagination;
pub mod ports;
pub mod ranking;
pub mod resolver;

pub use error::{DiscoveryError, GeolocationError, Result};
pub use facets::{derive_categories, CategoryFacet};
pub use feed::{CycleOutcome, DiscoverySession, FeedSnapshot, FeedState, FeedStatus, RecordSource, WorkerFeed};
pub use geocode::{describe_location, LocationLabel, LocationOrigin};
pub use location_cache::{FileLocationCache, FileViewerLocations, MemoryLocationCache, MemoryViewerLocations};
pub use model::{normalize_rows, AnnotatedWorker, NormalizedBatch, Viewer, WorkerRecord};
pub use pagination::{paginate, BrowseView, Page, PAGE_SIZE};
pub use ports::{
    FixedGeolocator, Geolocator, LocationCache, Place, ReverseGeocoder, StaticWorkerDirectory,
    ViewerLocationMemory, ViewerLocationSource, WorkerDirectory,
};
pub use ranking::{annotate, rank, sort_workers, SortMode, WorkerFilters};
pub use resolver::{
    DeviceGeolocation, LocationResolver, LocationStrategy, PendingLocation, ResolveContext,
    ResolveOutcome, ResolveState, ResolverSnapshot, StoredViewerLocation,
};
