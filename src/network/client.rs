//! HTTP client for making requests to the user directory

use super::types::{ApiRequest, ApiResponse, TransportFailure};
use super::user_agent::resolve_user_agent;
use crate::config::Settings;
use anyhow::{bail, Context, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// HTTP client wrapper bound to one directory base URL
///
/// Default headers (accept, user agent, optional bearer credential) are
/// fixed at construction and attached to every request.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: Url,
    default_timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&Settings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &Settings) -> Result<Self> {
        let directory = &settings.directory;
        let outgoing = &settings.outgoing;

        let base_url = Url::parse(&directory.base_url)
            .with_context(|| format!("Invalid directory base URL: {}", directory.base_url))?;
        if base_url.cannot_be_a_base() {
            bail!("Directory base URL cannot carry paths: {}", base_url);
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_str(&directory.accept).context("Invalid accept header")?,
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&resolve_user_agent(directory.user_agent.as_deref()))
                .context("Invalid user agent")?,
        );

        for (key, value) in &outgoing.extra_headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .with_context(|| format!("Invalid header name: {}", key))?;
            let value = HeaderValue::from_str(value)
                .with_context(|| format!("Invalid value for header {}", key))?;
            headers.insert(name, value);
        }

        if let Some(token) = directory.token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .context("Invalid token value")?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let default_timeout = Duration::try_from_secs_f64(outgoing.request_timeout)
            .with_context(|| format!("Invalid request timeout: {}", outgoing.request_timeout))?;

        let mut builder = Client::builder()
            .default_headers(headers)
            .timeout(default_timeout)
            .pool_max_idle_per_host(outgoing.pool_maxsize)
            .gzip(true)
            .brotli(true);

        // SSL verification
        if !outgoing.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        // Proxy settings
        if let Some(ref proxy_url) = outgoing.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        } else {
            if let Some(ref http) = outgoing.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http)?);
            }
            if let Some(ref https) = outgoing.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https)?);
            }
        }

        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            default_timeout,
        })
    }

    /// Base URL all requests are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve request path segments against the base URL
    ///
    /// Segments are percent-encoded, so a handle can never add path levels.
    pub fn endpoint(&self, segments: &[String]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments);
        }
        url
    }

    /// Execute a directory request
    ///
    /// Non-2xx responses come back as [`TransportFailure::Status`] with the
    /// status, headers and body intact for the classifier.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportFailure> {
        let url = self.endpoint(&request.segments);
        let timeout = request.timeout.unwrap_or(self.default_timeout);

        debug!("GET {} (timeout {:?})", url, timeout);

        let mut req_builder = self.client.get(url).timeout(timeout);

        if !request.params.is_empty() {
            req_builder = req_builder.query(&request.params);
        }

        let response = req_builder
            .send()
            .await
            .map_err(|e| TransportFailure::network(request.endpoint, &e))?;

        let response = Self::parse_response(response)
            .await
            .map_err(|e| TransportFailure::network(request.endpoint, &e))?;

        if !response.is_success() {
            return Err(TransportFailure::Status {
                endpoint: request.endpoint,
                resource: request.resource_path(),
                query: request.query().map(str::to_string),
                response,
            });
        }

        Ok(response)
    }

    /// Parse response into ApiResponse
    async fn parse_response(response: Response) -> reqwest::Result<ApiResponse> {
        let status = response.status().as_u16();
        let url = response.url().to_string();

        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(key.as_str().to_ascii_lowercase(), v.to_string());
            }
        }

        let text = response.text().await?;

        Ok(ApiResponse {
            status,
            headers,
            text,
            url,
        })
    }
}
