//! Pagination types for list endpoints.
//!
//! Page and limit arrive as untrusted query strings. They are sanitized into
//! bounded unsigned integers here and only ever reach the database as bound
//! parameters.

use serde::{Deserialize, Serialize};

/// Default page number.
pub const DEFAULT_PAGE: u64 = 1;

/// Default number of items per page.
pub const DEFAULT_LIMIT: u64 = 10;

/// Largest offset the database accepts as a bound `BIGINT`.
pub const MAX_OFFSET: u64 = i64::MAX.unsigned_abs();

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-indexed).
    #[serde(default = "default_page")]
    pub page: u64,
    /// Number of items per page.
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    DEFAULT_PAGE
}

fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PageRequest {
    /// Builds a page request from raw query-string values.
    ///
    /// Anything that is not a positive integer falls back to the default,
    /// and the limit is capped at `max_limit`. The page is capped so the
    /// offset never exceeds [`MAX_OFFSET`].
    #[must_use]
    pub fn sanitize(page: Option<&str>, limit: Option<&str>, max_limit: u64) -> Self {
        let limit = parse_positive(limit)
            .unwrap_or(DEFAULT_LIMIT)
            .min(max_limit.max(1))
            .min(MAX_OFFSET);
        let page = parse_positive(page)
            .unwrap_or(DEFAULT_PAGE)
            .min(MAX_OFFSET / limit + 1);

        Self { page, limit }
    }

    /// Calculates the offset for database queries, at most [`MAX_OFFSET`].
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.page
            .saturating_sub(1)
            .saturating_mul(self.limit)
            .min(MAX_OFFSET)
    }

    /// Returns the limit for database queries, at most [`MAX_OFFSET`].
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit.min(MAX_OFFSET)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
}

/// Response wrapper for paginated data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// The items in the current page.
    pub data: Vec<T>,
    /// Pagination metadata.
    pub meta: PageMeta,
}

/// Pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
    /// Current page number.
    pub page: u64,
    /// Items per page.
    pub limit: u64,
    /// Total number of items across all pages.
    pub total: u64,
    /// Total number of pages.
    pub total_pages: u64,
}

impl<T> PageResponse<T> {
    /// Creates a new paginated response.
    #[must_use]
    pub fn new(data: Vec<T>, request: PageRequest, total: u64) -> Self {
        let total_pages = if total == 0 {
            1
        } else {
            total.div_ceil(request.limit.max(1))
        };

        Self {
            data,
            meta: PageMeta {
                page: request.page,
                limit: request.limit,
                total,
                total_pages,
            },
        }
    }

    /// Maps the items of the page, keeping the metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResponse<U> {
        PageResponse {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}
