//! Annotate, filter and sort workers.

use crate::model::{AnnotatedWorker, WorkerRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use workkar_geo::{compare_known_first, distances_from, Coordinate};

/// Ordering applied to the result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Nearest first; unknown distances last
    #[default]
    Distance,
    /// Highest rated first
    Rating,
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "distance" | "nearest" => Ok(Self::Distance),
            "rating" | "top-rated" => Ok(Self::Rating),
            other => Err(format!("unknown sort mode '{other}' (expected distance or rating)")),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Distance => "distance",
            Self::Rating => "rating",
        })
    }
}

/// Active search filters. Blank strings count as unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerFilters {
    /// Substring of name, category, business name or any subcategory
    pub query: Option<String>,
    /// Substring of the worker's address
    pub location: Option<String>,
    /// Exact category, case-insensitive
    pub category: Option<String>,
    /// Only workers known to be within this radius
    pub within_km: Option<f64>,
}

impl WorkerFilters {
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn within_km(mut self, km: f64) -> Self {
        self.within_km = Some(km);
        self
    }

    /// Whether any filter would exclude something.
    pub fn is_active(&self) -> bool {
        self.compiled().is_active()
    }

    /// Whether `worker` passes every active filter.
    pub fn matches(&self, worker: &AnnotatedWorker) -> bool {
        self.compiled().matches(worker)
    }

    fn compiled(&self) -> CompiledFilters {
        let normalize = |s: &Option<String>| {
            s.as_deref()
                .map(|v| v.trim().to_lowercase())
                .filter(|v| !v.is_empty())
        };
        CompiledFilters {
            query: normalize(&self.query),
            location: normalize(&self.location),
            category: normalize(&self.category),
            within_km: self.within_km.filter(|km| km.is_finite() && *km >= 0.0),
        }
    }
}

/// Filters lower-cased once per pass instead of once per worker.
struct CompiledFilters {
    query: Option<String>,
    location: Option<String>,
    category: Option<String>,
    within_km: Option<f64>,
}

impl CompiledFilters {
    fn is_active(&self) -> bool {
        self.query.is_some() || self.location.is_some() || self.category.is_some() || self.within_km.is_some()
    }

    fn matches(&self, annotated: &AnnotatedWorker) -> bool {
        let worker = &annotated.worker;
        let contains = |haystack: &str, needle: &str| haystack.to_lowercase().contains(needle);

        if let Some(q) = &self.query {
            let hit = contains(&worker.name, q)
                || contains(&worker.category, q)
                || worker.business_name.as_deref().is_some_and(|b| contains(b, q))
                || worker.subcategories.iter().any(|tag| contains(tag, q));
            if !hit {
                return false;
            }
        }

        if let Some(loc) = &self.location {
            if !worker.location_address.as_deref().is_some_and(|a| contains(a, loc)) {
                return false;
            }
        }

        if let Some(cat) = &self.category {
            if worker.category.trim().to_lowercase() != *cat {
                return false;
            }
        }

        if let Some(radius) = self.within_km {
            if !annotated.distance_km.is_some_and(|d| d <= radius) {
                return false;
            }
        }

        true
    }
}

/// Attach a distance from `reference` to every record, in input order.
pub fn annotate(records: &[WorkerRecord], reference: Option<&Coordinate>) -> Vec<AnnotatedWorker> {
    let distances = distances_from(reference, records, |w| w.coordinates);
    records
        .iter()
        .zip(distances)
        .map(|(worker, distance_km)| AnnotatedWorker {
            worker: worker.clone(),
            distance_km,
        })
        .collect()
}

/// Stable in-place sort.
pub fn sort_workers(workers: &mut [AnnotatedWorker], mode: SortMode) {
    match mode {
        SortMode::Distance => workers.sort_by(|a, b| compare_known_first(a.distance_km, b.distance_km)),
        SortMode::Rating => workers.sort_by(|a, b| b.worker.rating.total_cmp(&a.worker.rating)),
    }
}

/// Annotate, filter, then sort.
pub fn rank(
    records: &[WorkerRecord],
    reference: Option<Coordinate>,
    mode: SortMode,
    filters: &WorkerFilters,
) -> Vec<AnnotatedWorker> {
    let compiled = filters.compiled();
    let mut ranked = annotate(records, reference.as_ref());

    if compiled.is_active() {
        ranked.retain(|w| compiled.matches(w));
    }
    sort_workers(&mut ranked, mode);
    ranked
}
