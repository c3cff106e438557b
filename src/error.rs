//! Domain errors and the transport failure classifier
//!
//! Every failure that reaches a caller of the search pipeline is one of the
//! [`SearchError`] variants. Transport failures are mapped onto them by
//! [`classify`], which also decides the retry guidance for each kind.

use crate::network::{EndpointKind, TransportFailure};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Result alias used across the pipeline
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Kind of failure when no HTTP response was received
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NetworkErrorKind {
    Timeout,
    Connect,
    Other,
}

impl std::fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "timed out"),
            Self::Connect => write!(f, "connection failed"),
            Self::Other => write!(f, "network error"),
        }
    }
}

/// Rate-limit state reported by the directory
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimit {
    /// Requests allowed per window
    pub limit: Option<u32>,
    /// Requests left in the current window
    pub remaining: Option<u32>,
    /// When the window resets
    pub reset_at: Option<DateTime<Utc>>,
    /// Explicit `retry-after` in seconds
    pub retry_after_secs: Option<u64>,
}

impl RateLimit {
    /// Read the rate-limit headers (keys must be lower-case)
    pub fn from_headers(headers: &HashMap<String, String>) -> Self {
        fn parse<T: std::str::FromStr>(headers: &HashMap<String, String>, key: &str) -> Option<T> {
            headers.get(key).and_then(|v| v.trim().parse().ok())
        }

        Self {
            limit: parse(headers, "x-ratelimit-limit"),
            remaining: parse(headers, "x-ratelimit-remaining"),
            reset_at: parse::<i64>(headers, "x-ratelimit-reset")
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
            retry_after_secs: parse(headers, "retry-after"),
        }
    }

    /// True when the headers alone say the request was throttled
    pub fn is_signalled(&self) -> bool {
        self.remaining == Some(0) || self.retry_after_secs.is_some()
    }

    /// How long to wait before retrying, measured from `now`
    pub fn wait_hint(&self, now: DateTime<Utc>) -> Option<Duration> {
        if let Some(secs) = self.retry_after_secs {
            return Some(Duration::from_secs(secs));
        }
        self.reset_at
            .map(|reset| (reset - now).to_std().unwrap_or(Duration::ZERO))
    }
}

/// What a caller may do about a failed operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryGuidance {
    /// Retrying the same request will fail again
    NotRetryable,
    /// Retry with backoff
    Retryable,
    /// Retry only after waiting; carries the wait when known
    RetryAfter(Option<Duration>),
}

/// Errors surfaced by `search()` and `load_more()`
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum SearchError {
    #[error("search criteria are empty")]
    EmptyCriteria,

    #[error("resource not found: {resource}")]
    NotFound { resource: String },

    #[error("query rejected by the directory: {query}")]
    InvalidQuery {
        query: String,
        message: Option<String>,
    },

    #[error("rate limit exceeded")]
    RateLimited(RateLimit),

    #[error("directory service unavailable")]
    ServiceUnavailable { retry_after_secs: Option<u64> },

    #[error("request failed with HTTP {status}")]
    RequestFailed {
        status: u16,
        message: Option<String>,
    },

    #[error("network unavailable: {kind}")]
    NetworkUnavailable { kind: NetworkErrorKind },

    #[error("malformed response: {detail}")]
    MalformedResponse { detail: String },

    #[error("superseded by a newer search")]
    Superseded,
}

impl SearchError {
    /// Retry policy for this error kind
    pub fn retry_guidance(&self) -> RetryGuidance {
        match self {
            Self::RateLimited(limit) => RetryGuidance::RetryAfter(limit.wait_hint(Utc::now())),
            Self::ServiceUnavailable { retry_after_secs } => match retry_after_secs {
                Some(secs) => RetryGuidance::RetryAfter(Some(Duration::from_secs(*secs))),
                None => RetryGuidance::Retryable,
            },
            Self::NetworkUnavailable { .. } => RetryGuidance::Retryable,
            Self::EmptyCriteria
            | Self::NotFound { .. }
            | Self::InvalidQuery { .. }
            | Self::RequestFailed { .. }
            | Self::MalformedResponse { .. }
            | Self::Superseded => RetryGuidance::NotRetryable,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.retry_guidance() != RetryGuidance::NotRetryable
    }

    /// Short stable name, used for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyCriteria => "empty_criteria",
            Self::NotFound { .. } => "not_found",
            Self::InvalidQuery { .. } => "invalid_query",
            Self::RateLimited(_) => "rate_limited",
            Self::ServiceUnavailable { .. } => "service_unavailable",
            Self::RequestFailed { .. } => "request_failed",
            Self::NetworkUnavailable { .. } => "network_unavailable",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::Superseded => "superseded",
        }
    }

    /// One human-readable sentence for end users
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyCriteria => {
                "Enter a username, location, repository count or language to search.".to_string()
            }
            Self::NotFound { .. } => "Looks like we can't find the user.".to_string(),
            Self::InvalidQuery { query, .. } => {
                format!("The search \"{}\" could not be processed. Try different criteria.", query)
            }
            Self::RateLimited(limit) => match limit.wait_hint(Utc::now()) {
                Some(wait) => format!(
                    "Too many searches. Try again in {} seconds.",
                    wait.as_secs().max(1)
                ),
                None => "Too many searches. Try again in a little while.".to_string(),
            },
            Self::ServiceUnavailable { .. } => {
                "The user directory is temporarily unavailable. Try again shortly.".to_string()
            }
            Self::RequestFailed { status, .. } => {
                format!("The search failed (HTTP {}).", status)
            }
            Self::NetworkUnavailable { kind: NetworkErrorKind::Timeout } => {
                "The search timed out. Check your connection and try again.".to_string()
            }
            Self::NetworkUnavailable { .. } => {
                "Could not reach the user directory. Check your connection.".to_string()
            }
            Self::MalformedResponse { .. } => {
                "The user directory sent an unexpected response.".to_string()
            }
            Self::Superseded => "A newer search replaced this one.".to_string(),
        }
    }
}

/// Non-fatal signal: a profile could not be fetched, the basic record is used
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentDegraded {
    /// Handle whose detail fetch failed
    pub handle: String,
    /// Why it failed
    pub cause: SearchError,
}

impl std::fmt::Display for EnrichmentDegraded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "enrichment degraded for {}: {}", self.handle, self.cause)
    }
}

/// Map a transport failure onto the closed error taxonomy
pub fn classify(failure: &TransportFailure) -> SearchError {
    match failure {
        TransportFailure::Network { kind, .. } => SearchError::NetworkUnavailable { kind: *kind },
        TransportFailure::Status {
            endpoint,
            resource,
            query,
            response,
        } => {
            let status = response.status;
            match status {
                404 if *endpoint == EndpointKind::Resource => SearchError::NotFound {
                    resource: resource.clone(),
                },
                422 => SearchError::InvalidQuery {
                    query: query.clone().unwrap_or_default(),
                    message: provider_message(&response.text),
                },
                403 | 429 => {
                    let limit = RateLimit::from_headers(&response.headers);
                    if status == 429 || limit.is_signalled() || mentions_rate_limit(&response.text) {
                        SearchError::RateLimited(limit)
                    } else {
                        SearchError::RequestFailed {
                            status,
                            message: provider_message(&response.text),
                        }
                    }
                }
                503 => SearchError::ServiceUnavailable {
                    retry_after_secs: response
                        .header("retry-after")
                        .and_then(|v| v.trim().parse().ok()),
                },
                _ => SearchError::RequestFailed {
                    status,
                    message: provider_message(&response.text),
                },
            }
        }
    }
}

/// The directory wraps error details in `{"message": "..."}`
fn provider_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .map(|s| s.to_string())
}

fn mentions_rate_limit(body: &str) -> bool {
    body.to_ascii_lowercase().contains("rate limit")
}
