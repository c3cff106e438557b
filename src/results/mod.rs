//! Record types for directory search results
//!
//! Basic records come from the search endpoint, detail records from the
//! per-identity endpoint, and enriched records are what callers receive.

mod types;

pub use types::*;
