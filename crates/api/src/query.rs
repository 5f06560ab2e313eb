//! Shared query parameter types for API handlers.
//!
//! Common query structs that appear across multiple handler modules are
//! extracted here to avoid duplication.

use serde::Deserialize;
use tabula_core::pagination::PageRequest;

/// Generic pagination parameters (`?page=&per_page=`).
///
/// Values are floored and clamped by [`PageRequest::resolve`].
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PaginationParams {
    pub fn resolve(&self, default_per_page: i64) -> PageRequest {
        PageRequest::resolve(self.page, self.per_page, default_per_page)
    }
}

/// `?format=` selector for endpoints that can answer with an image or JSON.
#[derive(Debug, Deserialize)]
pub struct FormatParams {
    pub format: Option<String>,
}

/// `?query=` for the movie search endpoint.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}
