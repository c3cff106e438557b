//! In-memory directory used by the search tests

use super::models::Page;
use crate::directory::{SearchRequest, UserDirectory};
use crate::error::{SearchError, SearchResult};
use crate::results::{BasicRecord, DetailRecord, EntityKind, ProfileDetails};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn basic(id: u64) -> BasicRecord {
    BasicRecord {
        id,
        login: format!("user{}", id),
        avatar_url: format!("https://avatars.example.com/u/{}", id),
        html_url: format!("https://github.com/user{}", id),
        kind: EntityKind::User,
        score: Some(1.0),
    }
}

/// Serves `total` users in id order, any query matches
pub struct FakeDirectory {
    total: u64,
    flaky_pages: Mutex<HashSet<u32>>,
    failing_details: HashSet<String>,
    detail_delays: HashMap<String, Duration>,
    default_detail_delay: Duration,
    search_delays: HashMap<String, Duration>,
    requests: Mutex<Vec<SearchRequest>>,
    detail_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeDirectory {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            flaky_pages: Mutex::new(HashSet::new()),
            failing_details: HashSet::new(),
            detail_delays: HashMap::new(),
            default_detail_delay: Duration::ZERO,
            search_delays: HashMap::new(),
            requests: Mutex::new(Vec::new()),
            detail_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// The first request for `page` fails with `ServiceUnavailable`
    pub fn with_flaky_page(self, page: u32) -> Self {
        self.flaky_pages.lock().unwrap().insert(page);
        self
    }

    pub fn with_failing_detail(mut self, handle: &str) -> Self {
        self.failing_details.insert(handle.to_string());
        self
    }

    pub fn with_detail_delay(mut self, handle: &str, delay: Duration) -> Self {
        self.detail_delays.insert(handle.to_string(), delay);
        self
    }

    pub fn with_default_detail_delay(mut self, delay: Duration) -> Self {
        self.default_detail_delay = delay;
        self
    }

    pub fn with_search_delay(mut self, query: &str, delay: Duration) -> Self {
        self.search_delays.insert(query.to_string(), delay);
        self
    }

    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserDirectory for FakeDirectory {
    fn name(&self) -> &str {
        "fake"
    }

    async fn search(&self, request: &SearchRequest) -> SearchResult<Page<BasicRecord>> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(delay) = self.search_delays.get(&request.query) {
            tokio::time::sleep(*delay).await;
        }
        if self.flaky_pages.lock().unwrap().remove(&request.page) {
            return Err(SearchError::ServiceUnavailable {
                retry_after_secs: None,
            });
        }

        let start = (request.page as u64 - 1) * request.per_page as u64;
        let end = (start + request.per_page as u64).min(self.total);
        let items = (start..end).map(|i| basic(i + 1)).collect();

        Ok(Page::new(items, self.total, request.page, request.per_page))
    }

    async fn detail(&self, handle: &str) -> SearchResult<DetailRecord> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self
            .detail_delays
            .get(handle)
            .copied()
            .unwrap_or(self.default_detail_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_details.contains(handle) {
            return Err(SearchError::NotFound {
                resource: format!("users/{}", handle),
            });
        }

        let id: u64 = handle.trim_start_matches("user").parse().unwrap_or(0);
        Ok(DetailRecord {
            basic: basic(id),
            profile: ProfileDetails {
                name: Some(format!("User {}", id)),
                public_repos: Some(id as u32),
                followers: Some(10),
                following: Some(1),
                ..Default::default()
            },
        })
    }
}
