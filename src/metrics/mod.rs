//! Metrics collection module
//!
//! Tracks search volume, enrichment outcomes, error kinds and latency.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

/// Rolling window size for response times
const RESPONSE_WINDOW: usize = 100;

/// In-process metrics collector
pub struct Metrics {
    /// Fresh searches started
    searches: AtomicU64,
    /// Pages loaded by `load_more`
    page_loads: AtomicU64,
    /// Detail fetches merged into a record
    enriched: AtomicU64,
    /// Detail fetches that fell back to the basic record
    degraded: AtomicU64,
    /// Top-level failures by error kind
    errors: RwLock<HashMap<&'static str, u64>>,
    /// Page response times (rolling window, ms)
    response_times: RwLock<Vec<u64>>,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self {
            searches: AtomicU64::new(0),
            page_loads: AtomicU64::new(0),
            enriched: AtomicU64::new(0),
            degraded: AtomicU64::new(0),
            errors: RwLock::new(HashMap::new()),
            response_times: RwLock::new(Vec::new()),
        }
    }

    pub fn inc_search(&self) {
        self.searches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_page_load(&self) {
        self.page_loads.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one enrichment batch
    pub fn record_enrichment(&self, enriched: usize, degraded: usize) {
        self.enriched.fetch_add(enriched as u64, Ordering::Relaxed);
        self.degraded.fetch_add(degraded as u64, Ordering::Relaxed);
    }

    /// Record a top-level failure
    pub fn record_error(&self, kind: &'static str) {
        let mut errors = self.errors.write().unwrap_or_else(PoisonError::into_inner);
        *errors.entry(kind).or_insert(0) += 1;
    }

    /// Record how long one page took, enrichment included
    pub fn record_response_time(&self, elapsed: Duration) {
        let mut times = self
            .response_times
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        // Keep last 100 response times
        if times.len() >= RESPONSE_WINDOW {
            times.remove(0);
        }
        times.push(elapsed.as_millis() as u64);
    }

    /// Average page response time in ms
    pub fn avg_response_time(&self) -> Option<u64> {
        let times = self
            .response_times
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if times.is_empty() {
            None
        } else {
            Some(times.iter().sum::<u64>() / times.len() as u64)
        }
    }

    /// Share of detail fetches that succeeded, in percent
    pub fn enrichment_rate(&self) -> f64 {
        let enriched = self.enriched.load(Ordering::Relaxed);
        let degraded = self.degraded.load(Ordering::Relaxed);
        let total = enriched + degraded;
        if total == 0 {
            100.0
        } else {
            (enriched as f64 / total as f64) * 100.0
        }
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            searches: self.searches.load(Ordering::Relaxed),
            page_loads: self.page_loads.load(Ordering::Relaxed),
            enriched: self.enriched.load(Ordering::Relaxed),
            degraded: self.degraded.load(Ordering::Relaxed),
            errors: self
                .errors
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            avg_response_time: self.avg_response_time(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy of the counters at one moment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    pub searches: u64,
    pub page_loads: u64,
    pub enriched: u64,
    pub degraded: u64,
    pub errors: HashMap<&'static str, u64>,
    pub avg_response_time: Option<u64>,
}
