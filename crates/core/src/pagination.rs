//! Page-number pagination shared by every listing endpoint.

use serde::Serialize;

/// Largest `per_page` a client may request.
pub const MAX_PER_PAGE: i64 = 100;

/// Default page size for loan and movie listings.
pub const DEFAULT_PER_PAGE: i64 = 20;

/// Default page size for image listings.
pub const DEFAULT_IMAGE_PER_PAGE: i64 = 10;

/// A resolved, always-valid page request (1-based page number).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    /// Resolve optional user input: page floors at 1, `per_page` is clamped
    /// to `1..=MAX_PER_PAGE` and falls back to `default_per_page`.
    pub fn resolve(page: Option<i64>, per_page: Option<i64>, default_per_page: i64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(default_per_page).clamp(1, MAX_PER_PAGE),
        }
    }

    /// Row offset for `LIMIT .. OFFSET ..` queries.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}

/// Number of pages needed for `total_items` rows.
pub fn total_pages(total_items: i64, per_page: i64) -> i64 {
    if total_items <= 0 || per_page <= 0 {
        return 0;
    }
    (total_items + per_page - 1) / per_page
}

/// Paginated listing envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T: Serialize> {
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub data: Vec<T>,
}

impl<T: Serialize> Page<T> {
    pub fn new(request: PageRequest, total_items: i64, data: Vec<T>) -> Self {
        Self {
            page: request.page,
            per_page: request.per_page,
            total_pages: total_pages(total_items, request.per_page),
            total_items,
            data,
        }
    }
}
