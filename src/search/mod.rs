//! Search orchestration module
//!
//! Runs paginated searches against a directory, enriches every page with
//! profile details and accumulates pages across load-more calls.

mod accumulator;
mod enrich;
mod models;

#[cfg(test)]
pub(crate) mod testing;

pub use accumulator::{Accumulator, Phase};
pub use enrich::{enrich, Enrichment};
pub use models::*;
