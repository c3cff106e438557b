//! Profile enrichment fan-out
//!
//! Fetches one detail record per search hit concurrently and merges it into
//! the hit. A failed or timed-out fetch only degrades that one item.

use super::models::EnrichOptions;
use crate::directory::UserDirectory;
use crate::error::{EnrichmentDegraded, NetworkErrorKind, SearchError};
use crate::results::{BasicRecord, EnrichedRecord};
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Outcome of one `enrich` call
#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    /// Same length and order as the input
    pub records: Vec<EnrichedRecord>,
    /// Items that kept their basic record
    pub degraded: Vec<EnrichmentDegraded>,
}

/// Enrich every record with its profile details
///
/// All fetches are started together (up to `max_concurrent`) and the call
/// returns once each has resolved. Results land in input order no matter
/// which fetch finishes first.
pub async fn enrich(
    directory: &dyn UserDirectory,
    items: Vec<BasicRecord>,
    options: &EnrichOptions,
) -> Enrichment {
    if items.is_empty() {
        return Enrichment::default();
    }

    let limit = match options.max_concurrent {
        0 => items.len(),
        n => n,
    };
    let count = items.len();

    let outcomes: Vec<(EnrichedRecord, Option<EnrichmentDegraded>)> = stream::iter(items)
        .map(|basic| enrich_one(directory, basic, options.timeout))
        .buffered(limit)
        .collect()
        .await;

    let mut enrichment = Enrichment {
        records: Vec::with_capacity(count),
        degraded: Vec::new(),
    };
    for (record, degraded) in outcomes {
        enrichment.records.push(record);
        enrichment.degraded.extend(degraded);
    }

    debug!(
        "Enriched {} of {} records via {}",
        count - enrichment.degraded.len(),
        count,
        directory.name()
    );

    enrichment
}

async fn enrich_one(
    directory: &dyn UserDirectory,
    basic: BasicRecord,
    limit: Duration,
) -> (EnrichedRecord, Option<EnrichmentDegraded>) {
    let outcome = match timeout(limit, directory.detail(&basic.login)).await {
        Ok(result) => result,
        Err(_) => Err(SearchError::NetworkUnavailable {
            kind: NetworkErrorKind::Timeout,
        }),
    };

    match outcome {
        Ok(detail) => (EnrichedRecord::merge(basic, detail), None),
        Err(cause) => {
            let degraded = EnrichmentDegraded {
                handle: basic.login.clone(),
                cause,
            };
            warn!("{}", degraded);
            (EnrichedRecord::from(basic), Some(degraded))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::testing::{basic, FakeDirectory};

    fn options(max_concurrent: usize, timeout_ms: u64) -> EnrichOptions {
        EnrichOptions {
            max_concurrent,
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    #[tokio::test]
    async fn test_empty_input() {
        let directory = FakeDirectory::new(0);
        let enrichment = enrich(&directory, vec![], &options(4, 1000)).await;
        assert!(enrichment.records.is_empty());
        assert!(enrichment.degraded.is_empty());
        assert_eq!(directory.detail_calls(), 0);
    }

    #[tokio::test]
    async fn test_all_enriched_in_order() {
        let directory = FakeDirectory::new(0)
            .with_detail_delay("user1", Duration::from_millis(80))
            .with_detail_delay("user2", Duration::from_millis(40));
        let items = vec![basic(1), basic(2), basic(3)];

        let enrichment = enrich(&directory, items.clone(), &options(0, 1000)).await;

        assert_eq!(enrichment.records.len(), 3);
        assert!(enrichment.degraded.is_empty());
        for (record, input) in enrichment.records.iter().zip(&items) {
            assert_eq!(&record.basic, input);
            assert!(record.is_enriched());
        }
        assert_eq!(enrichment.records[0].display_name(), "User 1");
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let directory = FakeDirectory::new(0).with_failing_detail("user2");
        let items = vec![basic(1), basic(2), basic(3)];

        let enrichment = enrich(&directory, items.clone(), &options(2, 1000)).await;

        assert_eq!(enrichment.records.len(), 3);
        assert!(enrichment.records[0].is_enriched());
        assert_eq!(enrichment.records[1], EnrichedRecord::from(items[1].clone()));
        assert!(enrichment.records[2].is_enriched());

        assert_eq!(enrichment.degraded.len(), 1);
        assert_eq!(enrichment.degraded[0].handle, "user2");
        assert!(matches!(
            enrichment.degraded[0].cause,
            SearchError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_timeout_degrades_one_item() {
        let directory =
            FakeDirectory::new(0).with_detail_delay("user3", Duration::from_secs(5));
        let items = vec![basic(1), basic(2), basic(3)];

        let enrichment = enrich(&directory, items.clone(), &options(0, 100)).await;

        assert!(enrichment.records[0].is_enriched());
        assert!(enrichment.records[1].is_enriched());
        assert_eq!(enrichment.records[2], EnrichedRecord::from(items[2].clone()));
        assert_eq!(
            enrichment.degraded[0].cause,
            SearchError::NetworkUnavailable {
                kind: NetworkErrorKind::Timeout
            }
        );
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let directory = FakeDirectory::new(0).with_default_detail_delay(Duration::from_millis(20));
        let items: Vec<_> = (1..=12).map(basic).collect();

        let enrichment = enrich(&directory, items, &options(3, 1000)).await;

        assert_eq!(enrichment.records.len(), 12);
        assert_eq!(directory.detail_calls(), 12);
        assert!(directory.max_in_flight() <= 3);
        assert!(directory.max_in_flight() >= 2);
    }
}
