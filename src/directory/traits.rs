//! Directory traits and request types

use crate::error::SearchResult;
use crate::query::{SortKey, SortOrder};
use crate::results::{BasicRecord, DetailRecord};
use crate::search::Page;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Parameters for one paginated search call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchRequest {
    /// Query string produced by the query builder
    pub query: String,
    /// Page number (1-indexed)
    pub page: u32,
    /// Results per page, at most [`crate::MAX_PER_PAGE`]
    pub per_page: u32,
    /// Sort key; best match when absent
    pub sort: Option<SortKey>,
    /// Sort direction, only sent with a sort key
    pub order: SortOrder,
}

impl SearchRequest {
    /// Create a request for the first page
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            page: 1,
            per_page: crate::DEFAULT_PER_PAGE,
            sort: None,
            order: SortOrder::Desc,
        }
    }

    /// Set page number
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Set page size, clamped to what the directory accepts
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = clamp_per_page(per_page);
        self
    }

    /// Set sort key and direction
    pub fn with_sort(mut self, sort: Option<SortKey>, order: SortOrder) -> Self {
        self.sort = sort;
        self.order = order;
        self
    }
}

/// Clamp a page size into `1..=MAX_PER_PAGE`
pub fn clamp_per_page(per_page: u32) -> u32 {
    per_page.clamp(1, crate::MAX_PER_PAGE)
}

/// Remote user directory: one search endpoint, one per-identity endpoint
///
/// Implementations hold no state between calls.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Directory name, for logs
    fn name(&self) -> &str;

    /// Issue one paginated search call
    async fn search(&self, request: &SearchRequest) -> SearchResult<Page<BasicRecord>>;

    /// Fetch the full profile for a handle
    async fn detail(&self, handle: &str) -> SearchResult<DetailRecord>;
}
