//! UserSearch-RS: user directory search with profile enrichment
//!
//! Builds a structured query from search criteria, pages through the
//! directory's user search, enriches every hit with its full profile and
//! accumulates pages across "load more" calls.

pub mod config;
pub mod directory;
pub mod error;
pub mod metrics;
pub mod network;
pub mod query;
pub mod results;
pub mod search;

pub use config::Settings;
pub use directory::{GitHubDirectory, SearchRequest, UserDirectory};
pub use error::{classify, EnrichmentDegraded, RetryGuidance, SearchError, SearchResult};
pub use query::{build, SearchCriteria, SortKey, SortOrder, UsernameScope};
pub use results::{BasicRecord, DetailRecord, EnrichedRecord, RepositoryRecord};
pub use search::{enrich, AccumulatedResult, Accumulator, Page, Phase, SearchOptions};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default timeout for search requests in seconds
pub const DEFAULT_TIMEOUT: u64 = 10;

/// Maximum timeout that can be set, in seconds
pub const MAX_TIMEOUT: u64 = 120;

/// Default timeout for each profile fetch in seconds
pub const DEFAULT_DETAIL_TIMEOUT: u64 = 5;

/// Default page size
pub const DEFAULT_PER_PAGE: u32 = 30;

/// Largest page size the directory accepts
pub const MAX_PER_PAGE: u32 = 100;
