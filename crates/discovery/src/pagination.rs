//! Fixed-size pages and the browse view that owns the current page.

use crate::facets::{derive_categories, CategoryFacet};
use crate::model::{AnnotatedWorker, WorkerRecord};
use crate::ranking::{rank, SortMode, WorkerFilters};
use serde::Serialize;
use workkar_geo::Coordinate;

/// Workers shown per page.
pub const PAGE_SIZE: usize = 6;

/// One page of results. Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// Number of pages needed for `total` items; at least 1.
pub fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1)).max(1)
}

/// Slice out page `page` (clamped into range).
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_pages = page_count(items.len(), page_size);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * page_size;

    Page {
        items: items.iter().skip(start).take(page_size).cloned().collect(),
        page,
        total_pages,
        total_items: items.len(),
    }
}

/// Ranked, filtered and paginated view over one worker snapshot.
///
/// Changing the records, reference location, sort mode or filters re-ranks
/// and returns to page 1. Facets always come from the unfiltered records.
#[derive(Debug, Clone)]
pub struct BrowseView {
    records: Vec<WorkerRecord>,
    reference: Option<Coordinate>,
    sort: SortMode,
    filters: WorkerFilters,
    page: usize,
    page_size: usize,
    ranked: Vec<AnnotatedWorker>,
    categories: Vec<CategoryFacet>,
}

impl BrowseView {
    pub fn new(records: Vec<WorkerRecord>, reference: Option<Coordinate>, sort: SortMode) -> Self {
        let mut view = Self {
            records,
            reference,
            sort,
            filters: WorkerFilters::default(),
            page: 1,
            page_size: PAGE_SIZE,
            ranked: Vec::new(),
            categories: Vec::new(),
        };
        view.refresh();
        view
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self.page = 1;
        self
    }

    #[must_use]
    pub fn with_filters(mut self, filters: WorkerFilters) -> Self {
        self.set_filters(filters);
        self
    }

    pub fn sort(&self) -> SortMode {
        self.sort
    }

    pub fn filters(&self) -> &WorkerFilters {
        &self.filters
    }

    pub fn reference(&self) -> Option<Coordinate> {
        self.reference
    }

    /// Current 1-based page index.
    pub fn page_index(&self) -> usize {
        self.page
    }

    pub fn total_pages(&self) -> usize {
        page_count(self.ranked.len(), self.page_size)
    }

    /// All matching workers in ranked order.
    pub fn ranked(&self) -> &[AnnotatedWorker] {
        &self.ranked
    }

    pub fn categories(&self) -> &[CategoryFacet] {
        &self.categories
    }

    pub fn current_page(&self) -> Page<AnnotatedWorker> {
        paginate(&self.ranked, self.page, self.page_size)
    }

    /// Jump to `page`, clamped into range. Returns the page actually selected.
    pub fn go_to(&mut self, page: usize) -> usize {
        self.page = page.clamp(1, self.total_pages());
        self.page
    }

    pub fn set_sort(&mut self, sort: SortMode) {
        if sort != self.sort {
            self.sort = sort;
            self.refresh();
        }
    }

    pub fn set_filters(&mut self, filters: WorkerFilters) {
        if filters != self.filters {
            self.filters = filters;
            self.refresh();
        }
    }

    pub fn set_reference(&mut self, reference: Option<Coordinate>) {
        if reference != self.reference {
            self.reference = reference;
            self.refresh();
        }
    }

    /// Swap in a fresh snapshot of records.
    pub fn replace_records(&mut self, records: Vec<WorkerRecord>) {
        self.records = records;
        self.refresh();
    }

    fn refresh(&mut self) {
        self.ranked = rank(&self.records, self.reference, self.sort, &self.filters);
        self.categories = derive_categories(&self.records);
        self.page = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: usize) -> Vec<WorkerRecord> {
        (0..n)
            .map(|i| {
                let category = if i % 2 == 0 { "Plumbing" } else { "electrical" };
                WorkerRecord::new(i.to_string(), format!("Worker {i}"), category)
                    .with_rating((i % 5) as f64)
            })
            .collect()
    }

    fn page_sizes(view: &mut BrowseView) -> Vec<usize> {
        (1..=view.total_pages())
            .map(|p| {
                view.go_to(p);
                view.current_page().items.len()
            })
            .collect()
    }

    #[test]
    fn test_thirteen_records_make_pages_of_six_six_one() {
        let mut view = BrowseView::new(records(13), None, SortMode::Distance);
        assert_eq!(page_sizes(&mut view), vec![6, 6, 1]);
    }

    #[test]
    fn test_sort_change_resets_page() {
        let mut view = BrowseView::new(records(13), None, SortMode::Distance);
        view.go_to(3);
        assert_eq!(view.page_index(), 3);

        view.set_sort(SortMode::Rating);
        assert_eq!(view.page_index(), 1);
    }

    #[test]
    fn test_same_sort_keeps_page() {
        let mut view = BrowseView::new(records(13), None, SortMode::Distance);
        view.go_to(2);
        view.set_sort(SortMode::Distance);
        assert_eq!(view.page_index(), 2);
    }

    #[test]
    fn test_filter_change_resets_page_and_keeps_facets() {
        let mut view = BrowseView::new(records(13), None, SortMode::Distance);
        view.go_to(2);

        view.set_filters(WorkerFilters::default().category("electrical"));

        assert_eq!(view.page_index(), 1);
        assert_eq!(view.ranked().len(), 6);
        let labels: Vec<_> = view.categories().iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Plumbing", "Electrical"]);
    }

    #[test]
    fn test_go_to_clamps() {
        let mut view = BrowseView::new(records(13), None, SortMode::Distance);
        assert_eq!(view.go_to(0), 1);
        assert_eq!(view.go_to(99), 3);
    }

    #[test]
    fn test_empty_set_has_one_empty_page() {
        let view = BrowseView::new(Vec::new(), None, SortMode::Distance);
        let page = view.current_page();

        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
        assert!(!page.has_next());
        assert!(!page.has_previous());
    }

    #[test]
    fn test_paginate_middle_page() {
        let items: Vec<u32> = (1..=13).collect();
        let page = paginate(&items, 2, PAGE_SIZE);

        assert_eq!(page.items, vec![7, 8, 9, 10, 11, 12]);
        assert!(page.has_next());
        assert!(page.has_previous());
    }
}
