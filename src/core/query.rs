//! List query parameters and paginated responses

use crate::config::{CollectionConfig, PaginationConfig};
use crate::core::view::{FlagFilter, SortKey, ViewState};
use serde::{Deserialize, Serialize};

/// Query parameters accepted by every list endpoint
///
/// All parameters are optional; missing or invalid values fall back to the
/// view defaults (no filter, newest first, page 1, default page size).
///
/// # Example
/// ```text
/// GET /api/exams?q=physics&sort=examDateAsc&page=2&page_size=25
/// GET /api/banners?status=active
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ListQuery {
    /// Free-text search
    pub q: Option<String>,

    /// Sort key wire name (`newest`, `oldest`, `titleAsc`, ...)
    pub sort: Option<String>,

    /// Page number (starts at 1)
    pub page: Option<usize>,

    /// Records per page, must be one of the configured sizes
    pub page_size: Option<usize>,

    /// Flag filter (`all`, `active`, `inactive`) for collections with a flag field
    pub status: Option<String>,
}

impl ListQuery {
    /// Requested page, at least 1
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    /// Resolve the sort key against what the collection offers
    pub fn sort_key(&self, collection: &CollectionConfig) -> SortKey {
        let key = self.sort.as_deref().map(SortKey::parse).unwrap_or_default();
        collection.offered_sort(key)
    }

    /// Build the view state these parameters describe
    pub fn view_state(
        &self,
        pagination: &PaginationConfig,
        collection: &CollectionConfig,
    ) -> ViewState {
        let mut state = ViewState::new(pagination.resolve(self.page_size));
        state.set_filter(self.q.as_deref().unwrap_or_default());
        state.set_sort(self.sort_key(collection));
        state.set_flag(self.status.as_deref().map(FlagFilter::parse).unwrap_or_default());
        state.set_page(self.page());
        state
    }
}

/// Paginated response structure
///
/// This structure wraps one page of records with metadata about the pagination state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginatedResponse<T> {
    /// The records on this page
    pub data: Vec<T>,

    /// Pagination metadata
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    /// Effective page number, clamped into `[1, total_pages]`
    pub page: usize,

    /// Number of items per page
    pub page_size: usize,

    /// Total number of items (after filters)
    pub total: usize,

    /// Total number of pages, never less than 1
    pub total_pages: usize,

    /// Whether there is a next page
    pub has_next: bool,

    /// Whether there is a previous page
    pub has_prev: bool,
}

impl PaginationMeta {
    /// Compute pagination metadata, clamping the requested page
    pub fn new(page: usize, page_size: usize, total: usize) -> Self {
        // A zero page size would divide by zero; treat it as 1
        let page_size = page_size.max(1);
        let total_pages = total.div_ceil(page_size).max(1);
        let page = page.clamp(1, total_pages);

        Self {
            page,
            page_size,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }

    /// Index range of this page within the full result set
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = ((self.page - 1) * self.page_size).min(self.total);
        let end = (start + self.page_size).min(self.total);
        start..end
    }
}
