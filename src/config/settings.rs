//! Settings structures for UserSearch-RS configuration

use crate::query::{SortKey, SortOrder, UsernameScope};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Main settings structure matching `usersearch.yml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub directory: DirectorySettings,
    pub outgoing: OutgoingSettings,
    pub search: SearchSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Parse settings from a YAML document
    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        Ok(settings)
    }

    /// Merge with environment variables (USERSEARCH_* prefix)
    pub fn merge_env(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    /// Merge overrides from any variable source
    pub fn merge_vars<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = var("USERSEARCH_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Some(val) = var("USERSEARCH_TOKEN").or_else(|| var("GITHUB_TOKEN")) {
            self.directory.token = Some(val);
        }
        if let Some(val) = var("USERSEARCH_BASE_URL") {
            self.directory.base_url = val;
        }
        if let Some(val) = var("USERSEARCH_PER_PAGE") {
            if let Ok(per_page) = val.parse() {
                self.search.per_page = per_page;
            }
        }
        if let Some(val) = var("USERSEARCH_TIMEOUT") {
            if let Ok(timeout) = val.parse() {
                self.outgoing.request_timeout = timeout;
            }
        }
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.directory.base_url)
            .with_context(|| format!("Invalid directory.base_url: {}", self.directory.base_url))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            bail!("directory.base_url must be http or https, got {}", url.scheme());
        }
        check_timeout("outgoing.request_timeout", self.outgoing.request_timeout)?;
        check_timeout("outgoing.detail_timeout", self.outgoing.detail_timeout)?;
        if self.search.per_page == 0 {
            bail!("search.per_page must be at least 1");
        }
        Ok(())
    }
}

fn check_timeout(name: &str, secs: f64) -> Result<()> {
    // NaN fails both comparisons
    if !(secs > 0.0 && secs <= crate::MAX_TIMEOUT as f64) {
        bail!(
            "{} must be between 0 and {} seconds, got {}",
            name,
            crate::MAX_TIMEOUT,
            secs
        );
    }
    Ok(())
}

/// General settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
}

/// Remote directory settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorySettings {
    /// API root, e.g. `https://api.github.com`
    pub base_url: String,
    /// Static bearer credential; unauthenticated when absent
    pub token: Option<String>,
    /// Accept header sent with every request
    pub accept: String,
    /// User agent override
    pub user_agent: Option<String>,
}

impl DirectorySettings {
    /// The credential, ignoring blank values
    pub fn token(&self) -> Option<&str> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

impl Default for DirectorySettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.github.com".to_string(),
            token: None,
            accept: crate::network::accept_json().to_string(),
            user_agent: None,
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default request timeout in seconds
    pub request_timeout: f64,
    /// Timeout for each profile detail fetch in seconds
    pub detail_timeout: f64,
    /// Pool max size
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
    /// Extra headers to send
    pub extra_headers: HashMap<String, String>,
}

impl OutgoingSettings {
    /// Request timeout, the default when the value is not a valid duration
    pub fn request_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.request_timeout)
            .unwrap_or(Duration::from_secs(crate::DEFAULT_TIMEOUT))
    }

    /// Detail timeout, the default when the value is not a valid duration
    pub fn detail_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.detail_timeout)
            .unwrap_or(Duration::from_secs(crate::DEFAULT_DETAIL_TIMEOUT))
    }
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: crate::DEFAULT_TIMEOUT as f64,
            detail_timeout: crate::DEFAULT_DETAIL_TIMEOUT as f64,
            pool_maxsize: 20,
            verify_ssl: true,
            proxies: ProxySettings::default(),
            extra_headers: HashMap::new(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Search behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Results per page (clamped to the directory maximum)
    pub per_page: u32,
    /// Sort key; best match when absent
    pub sort: Option<SortKey>,
    /// Sort direction
    pub order: SortOrder,
    /// Where the username fragment is matched
    pub username_scope: UsernameScope,
    /// Detail fetches in flight at once (0 = all at once)
    pub max_concurrent_details: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            per_page: crate::DEFAULT_PER_PAGE,
            sort: None,
            order: SortOrder::Desc,
            username_scope: UsernameScope::Any,
            max_concurrent_details: 10,
        }
    }
}
