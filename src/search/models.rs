//! Page, accumulated result and option models

use crate::config::Settings;
use crate::directory::clamp_per_page;
use crate::query::{SortKey, SortOrder, UsernameScope};
use crate::results::EnrichedRecord;
use serde::Serialize;
use std::time::Duration;

/// One batch of results from a single paginated request
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Page<T> {
    /// Items in the order the directory returned them
    pub items: Vec<T>,
    /// Total reported by the directory for the query
    pub total_count: u64,
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Page size the request asked for
    pub per_page: u32,
    /// Whether another page can be requested
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Create a page, deriving `has_more` from the counts
    pub fn new(items: Vec<T>, total_count: u64, page_number: u32, per_page: u32) -> Self {
        let has_more = has_more(items.len(), page_number, per_page, total_count);
        Self {
            items,
            total_count,
            page_number,
            per_page,
            has_more,
        }
    }

    /// Swap the items for index-aligned replacements, keeping the metadata
    pub fn with_items<U>(self, items: Vec<U>) -> Page<U> {
        Page {
            items,
            total_count: self.total_count,
            page_number: self.page_number,
            per_page: self.per_page,
            has_more: self.has_more,
        }
    }
}

/// A page was full and the total reaches past it
pub fn has_more(returned: usize, page_number: u32, per_page: u32, total_count: u64) -> bool {
    returned as u64 == per_page as u64 && (page_number as u64) * (per_page as u64) < total_count
}

/// Items accumulated across a search and its load-more calls
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct AccumulatedResult {
    /// All items so far, append-only
    pub items: Vec<EnrichedRecord>,
    /// Total reported by the directory for the current query
    pub total_count: u64,
    /// Last page loaded (0 before the first page)
    pub current_page: u32,
    /// Whether `load_more` would fetch another page
    pub has_more: bool,
}

impl AccumulatedResult {
    /// Start from the first page of a search
    pub fn from_page(page: Page<EnrichedRecord>) -> Self {
        let mut result = Self::default();
        result.append(page);
        result
    }

    /// Append a following page
    pub fn append(&mut self, page: Page<EnrichedRecord>) {
        self.total_count = page.total_count;
        self.current_page = page.page_number;
        self.has_more = page.has_more;
        self.items.extend(page.items);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Options for the enrichment fan-out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichOptions {
    /// Detail fetches in flight at once (0 = all at once)
    pub max_concurrent: usize,
    /// Timeout for each detail fetch
    pub timeout: Duration,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            max_concurrent: 10,
            timeout: Duration::from_secs(crate::DEFAULT_DETAIL_TIMEOUT),
        }
    }
}

/// Options fixed for the lifetime of an accumulator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    pub per_page: u32,
    pub sort: Option<SortKey>,
    pub order: SortOrder,
    pub username_scope: UsernameScope,
    pub enrich: EnrichOptions,
}

impl SearchOptions {
    /// Derive options from settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            per_page: clamp_per_page(settings.search.per_page),
            sort: settings.search.sort,
            order: settings.search.order,
            username_scope: settings.search.username_scope,
            enrich: EnrichOptions {
                max_concurrent: settings.search.max_concurrent_details,
                timeout: settings.outgoing.detail_timeout(),
            },
        }
    }

    /// Set page size
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

    /// Set enrichment options
    pub fn with_enrich(mut self, enrich: EnrichOptions) -> Self {
        self.enrich = enrich;
        self
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            per_page: crate::DEFAULT_PER_PAGE,
            sort: None,
            order: SortOrder::Desc,
            username_scope: UsernameScope::Any,
            enrich: EnrichOptions::default(),
        }
    }
}
