//! GitHub user directory implementation
//!
//! Uses GitHub's official REST API: `/search/users` for the paginated
//! search and `/users/{login}` for profile details.

use super::traits::*;
use crate::error::{classify, SearchError, SearchResult};
use crate::network::{ApiRequest, ApiResponse, HttpClient, TransportFailure};
use crate::results::{BasicRecord, DetailRecord, EnrichedRecord, RepositoryRecord};
use crate::search::Page;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Raw envelope returned by the search endpoint
#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    total_count: u64,
    #[serde(default)]
    incomplete_results: bool,
    #[serde(default)]
    items: Vec<BasicRecord>,
}

/// GitHub-backed user directory
#[derive(Clone)]
pub struct GitHubDirectory {
    client: HttpClient,
    detail_timeout: Duration,
}

impl GitHubDirectory {
    pub fn new(client: HttpClient) -> Self {
        let detail_timeout = Duration::from_secs(crate::DEFAULT_DETAIL_TIMEOUT);
        Self {
            client,
            detail_timeout,
        }
    }

    /// Set the timeout applied to each profile fetch
    pub fn with_detail_timeout(mut self, timeout: Duration) -> Self {
        self.detail_timeout = timeout;
        self
    }

    /// Build the HTTP request for a search
    pub fn search_request(&self, request: &SearchRequest) -> ApiRequest {
        let mut api = ApiRequest::search(["search", "users"])
            .param("q", &request.query)
            .param("page", request.page)
            .param("per_page", clamp_per_page(request.per_page));

        if let Some(sort) = request.sort {
            api = api
                .param("sort", sort.as_str())
                .param("order", request.order.as_str());
        }

        api
    }

    /// Parse the search envelope into a page
    pub fn search_response(
        &self,
        request: &SearchRequest,
        response: ApiResponse,
    ) -> SearchResult<Page<BasicRecord>> {
        let envelope: SearchEnvelope = response.json().map_err(|e| SearchError::MalformedResponse {
            detail: format!("search envelope: {}", e),
        })?;

        if envelope.incomplete_results {
            warn!(
                "Search '{}' page {} returned incomplete results",
                request.query, request.page
            );
        }

        Ok(Page::new(
            envelope.items,
            envelope.total_count,
            request.page,
            clamp_per_page(request.per_page),
        ))
    }

    /// Build the HTTP request for a profile fetch
    pub fn detail_request(&self, handle: &str) -> ApiRequest {
        ApiRequest::resource(["users", handle]).timeout(self.detail_timeout)
    }

    /// Fetch a single user's full profile by handle
    pub async fn lookup(&self, handle: &str) -> SearchResult<EnrichedRecord> {
        let detail = self.detail(handle).await?;
        Ok(EnrichedRecord::merge(detail.basic.clone(), detail))
    }

    /// Fetch one page of a user's public repositories, most recently updated first
    pub async fn repositories(
        &self,
        handle: &str,
        page: u32,
        per_page: u32,
    ) -> SearchResult<Vec<RepositoryRecord>> {
        let request = ApiRequest::resource(["users", handle, "repos"])
            .param("sort", "updated")
            .param("page", page.max(1))
            .param("per_page", clamp_per_page(per_page));

        let response = self.send(request).await?;
        response.json().map_err(|e| SearchError::MalformedResponse {
            detail: format!("repositories of {}: {}", handle, e),
        })
    }

    async fn send(&self, request: ApiRequest) -> SearchResult<ApiResponse> {
        self.client.execute(request).await.map_err(|failure| {
            let error = classify(&failure);
            log_failure(&failure, &error);
            error
        })
    }
}

fn log_failure(failure: &TransportFailure, error: &SearchError) {
    match error {
        SearchError::NotFound { .. } => debug!("{} ({})", failure, error.kind()),
        _ => warn!("{} ({})", failure, error.kind()),
    }
}

#[async_trait]
impl UserDirectory for GitHubDirectory {
    fn name(&self) -> &str {
        "github"
    }

    async fn search(&self, request: &SearchRequest) -> SearchResult<Page<BasicRecord>> {
        let response = self.send(self.search_request(request)).await?;
        let page = self.search_response(request, response)?;

        debug!(
            "Search '{}' page {}: {} items of {}",
            request.query,
            page.page_number,
            page.items.len(),
            page.total_count
        );

        Ok(page)
    }

    async fn detail(&self, handle: &str) -> SearchResult<DetailRecord> {
        let response = self.send(self.detail_request(handle)).await?;
        response.json().map_err(|e| SearchError::MalformedResponse {
            detail: format!("profile of {}: {}", handle, e),
        })
    }
}
