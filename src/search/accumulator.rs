//! Pagination accumulator
//!
//! Drives a search and its follow-up pages, enriching each page and
//! appending it to one growing result. Every call is tagged with a
//! generation; a call that resolves after a newer one started is discarded.

use super::enrich::enrich;
use super::models::{AccumulatedResult, Page, SearchOptions};
use crate::directory::{SearchRequest, UserDirectory};
use crate::error::{EnrichmentDegraded, SearchError, SearchResult};
use crate::metrics::Metrics;
use crate::query::{build_scoped, SearchCriteria};
use crate::results::EnrichedRecord;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Where the accumulator is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// No search yet
    Idle,
    /// A search or load-more is in flight
    Loading,
    /// The last call succeeded
    Loaded,
    /// The last call failed; items from earlier pages are kept
    Errored(SearchError),
}

#[derive(Debug)]
struct State {
    generation: u64,
    phase: Phase,
    result: AccumulatedResult,
    /// Request of the current search, page 1
    request: Option<SearchRequest>,
    /// Degraded items of the last page
    last_degraded: Vec<EnrichmentDegraded>,
    /// Phase to fall back to if the loading call is dropped
    resume: Phase,
}

impl State {
    /// Leave `Loading` when the call that entered it is no longer running
    fn settle(&mut self, in_flight: &AtomicU64) {
        if self.phase == Phase::Loading && in_flight.load(Ordering::SeqCst) != self.generation {
            debug!("Call {} was dropped while loading", self.generation);
            self.phase = std::mem::replace(&mut self.resume, Phase::Idle);
        }
    }

    /// Enter `Loading` under a fresh generation
    fn begin(&mut self, resume: Phase, in_flight: &Arc<AtomicU64>) -> InFlight {
        self.generation += 1;
        self.resume = resume;
        self.phase = Phase::Loading;
        in_flight.store(self.generation, Ordering::SeqCst);
        InFlight {
            generation: self.generation,
            slot: in_flight.clone(),
        }
    }
}

/// Marks a generation as running until dropped
struct InFlight {
    generation: u64,
    slot: Arc<AtomicU64>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let _ = self
            .slot
            .compare_exchange(self.generation, 0, Ordering::SeqCst, Ordering::SeqCst);
    }
}

/// Accumulates enriched pages across `search` and `load_more` calls
pub struct Accumulator {
    directory: Arc<dyn UserDirectory>,
    options: SearchOptions,
    metrics: Arc<Metrics>,
    state: Mutex<State>,
    /// Generation of the running call, 0 when none
    in_flight: Arc<AtomicU64>,
}

impl Accumulator {
    pub fn new(directory: Arc<dyn UserDirectory>, options: SearchOptions) -> Self {
        Self {
            directory,
            options,
            metrics: Arc::new(Metrics::new()),
            state: Mutex::new(State {
                generation: 0,
                phase: Phase::Idle,
                result: AccumulatedResult::default(),
                request: None,
                last_degraded: Vec::new(),
                resume: Phase::Idle,
            }),
            in_flight: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Record into a shared metrics collector
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Start a new search, replacing everything accumulated so far
    ///
    /// The criteria are validated before any request is made. Returns
    /// [`SearchError::Superseded`] if another call started while this one
    /// was in flight.
    pub async fn search(&self, criteria: &SearchCriteria) -> SearchResult<AccumulatedResult> {
        self.metrics.inc_search();

        let query = match build_scoped(criteria, self.options.username_scope) {
            Ok(query) => query,
            Err(error) => {
                let mut state = self.state.lock().await;
                state.generation += 1;
                state.result = AccumulatedResult::default();
                state.request = None;
                state.last_degraded.clear();
                state.phase = Phase::Errored(error.clone());
                self.metrics.record_error(error.kind());
                debug!("Rejected search criteria: {}", error);
                return Err(error);
            }
        };

        let request = SearchRequest::new(query)
            .with_per_page(self.options.per_page)
            .with_sort(self.options.sort, self.options.order);

        let call = {
            let mut state = self.state.lock().await;
            state.result = AccumulatedResult::default();
            state.request = Some(request.clone());
            state.last_degraded.clear();
            state.begin(Phase::Idle, &self.in_flight)
        };

        info!("Searching {} for '{}'", self.directory.name(), request.query);
        let outcome = self.fetch_page(&request).await;

        let mut state = self.state.lock().await;
        if state.generation != call.generation {
            debug!("Discarding stale search for '{}'", request.query);
            return Err(SearchError::Superseded);
        }

        match outcome {
            Ok((page, degraded)) => {
                state.result = AccumulatedResult::from_page(page);
                state.last_degraded = degraded;
                state.phase = Phase::Loaded;
                Ok(state.result.clone())
            }
            Err(error) => Err(self.fail(&mut state, error)),
        }
    }

    /// Fetch the next page of the current search and append it
    ///
    /// A no-op returning the current result when nothing was searched yet,
    /// a call is in flight, or there are no more pages. A call that was
    /// dropped before finishing does not count as in flight.
    pub async fn load_more(&self) -> SearchResult<AccumulatedResult> {
        let (call, request) = {
            let mut state = self.state.lock().await;
            state.settle(&self.in_flight);

            let request = match (&state.phase, &state.request) {
                (Phase::Idle | Phase::Loading, _) | (_, None) => {
                    return Ok(state.result.clone());
                }
                _ if !state.result.has_more || state.result.current_page == 0 => {
                    return Ok(state.result.clone());
                }
                (_, Some(request)) => request.clone().with_page(state.result.current_page + 1),
            };

            let resume = state.phase.clone();
            (state.begin(resume, &self.in_flight), request)
        };

        self.metrics.inc_page_load();
        debug!("Loading page {} of '{}'", request.page, request.query);
        let outcome = self.fetch_page(&request).await;

        let mut state = self.state.lock().await;
        if state.generation != call.generation {
            debug!("Discarding stale page {} of '{}'", request.page, request.query);
            return Err(SearchError::Superseded);
        }

        match outcome {
            Ok((page, degraded)) => {
                state.result.append(page);
                state.last_degraded = degraded;
                state.phase = Phase::Loaded;
                Ok(state.result.clone())
            }
            Err(error) => Err(self.fail(&mut state, error)),
        }
    }

    /// Copy of everything accumulated so far
    pub async fn snapshot(&self) -> AccumulatedResult {
        self.state.lock().await.result.clone()
    }

    pub async fn phase(&self) -> Phase {
        let mut state = self.state.lock().await;
        state.settle(&self.in_flight);
        state.phase.clone()
    }

    /// Items of the last page that kept their basic record
    pub async fn degraded(&self) -> Vec<EnrichmentDegraded> {
        self.state.lock().await.last_degraded.clone()
    }

    async fn fetch_page(
        &self,
        request: &SearchRequest,
    ) -> SearchResult<(Page<EnrichedRecord>, Vec<EnrichmentDegraded>)> {
        let started = Instant::now();

        let mut page = self.directory.search(request).await?;
        let items = std::mem::take(&mut page.items);
        let enrichment = enrich(self.directory.as_ref(), items, &self.options.enrich).await;

        self.metrics.record_enrichment(
            enrichment.records.len() - enrichment.degraded.len(),
            enrichment.degraded.len(),
        );
        self.metrics.record_response_time(started.elapsed());

        Ok((page.with_items(enrichment.records), enrichment.degraded))
    }

    fn fail(&self, state: &mut State, error: SearchError) -> SearchError {
        warn!("Search failed: {}", error);
        self.metrics.record_error(error.kind());
        state.phase = Phase::Errored(error.clone());
        error
    }
}
