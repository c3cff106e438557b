//! Request, response and failure types for the directory transport

use crate::error::NetworkErrorKind;
use std::collections::HashMap;
use std::time::Duration;

/// Shape of the endpoint a request targets
///
/// The classifier only reports `NotFound` for single-resource endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// Paginated search endpoint
    Search,
    /// A single resource keyed by handle
    Resource,
}

/// GET request against the directory, relative to the base URL
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// Path segments appended to the base URL (encoded on send)
    pub segments: Vec<String>,
    /// Query parameters, in order
    pub params: Vec<(String, String)>,
    /// Endpoint shape, used for error classification
    pub endpoint: EndpointKind,
    /// Per-request timeout overriding the client default
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    /// Request against a search endpoint
    pub fn search<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(segments, EndpointKind::Search)
    }

    /// Request against a single resource
    pub fn resource<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(segments, EndpointKind::Resource)
    }

    fn new<I, S>(segments: I, endpoint: EndpointKind) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            params: Vec::new(),
            endpoint,
            timeout: None,
        }
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Override the timeout for this request
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Path relative to the base URL, e.g. `users/octocat`
    pub fn resource_path(&self) -> String {
        self.segments.join("/")
    }

    /// Value of the `q` parameter, if any
    pub fn query(&self) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == "q")
            .map(|(_, v)| v.as_str())
    }
}

/// HTTP response from the directory
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers, keys lower-cased
    pub headers: HashMap<String, String>,
    /// Response body as text
    pub text: String,
    /// Response URL (after redirects)
    pub url: String,
}

impl ApiResponse {
    /// Parse response as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.text)
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Look up a header by lower-case name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Anything that kept a request from producing a 2xx response
#[derive(Debug, Clone)]
pub enum TransportFailure {
    /// The directory answered with a non-2xx status
    Status {
        endpoint: EndpointKind,
        resource: String,
        query: Option<String>,
        response: ApiResponse,
    },
    /// No HTTP response at all
    Network {
        endpoint: EndpointKind,
        kind: NetworkErrorKind,
        detail: String,
    },
}

impl TransportFailure {
    pub(crate) fn network(endpoint: EndpointKind, error: &reqwest::Error) -> Self {
        let kind = if error.is_timeout() {
            NetworkErrorKind::Timeout
        } else if error.is_connect() {
            NetworkErrorKind::Connect
        } else {
            NetworkErrorKind::Other
        };

        Self::Network {
            endpoint,
            kind,
            detail: error.to_string(),
        }
    }
}

impl std::fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status {
                resource, response, ..
            } => write!(f, "HTTP {} from {}", response.status, resource),
            Self::Network { kind, detail, .. } => write!(f, "{}: {}", kind, detail),
        }
    }
}
