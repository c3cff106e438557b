//! Query building module
//!
//! Turns structured search criteria into the directory's query syntax:
//! - Username fragment: `octo` or `octo in:login`
//! - Location qualifier: `location:"Berlin"`
//! - Repository count qualifier: `repos:>=10`
//! - Language qualifier: `language:"Rust"`

use crate::error::SearchError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Structured, multi-field search criteria
///
/// Created once per user-initiated search and left untouched for the
/// whole pagination sequence of that search.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchCriteria {
    /// Free text matched against usernames
    pub username_fragment: Option<String>,
    /// Location qualifier value
    pub location: Option<String>,
    /// Minimum number of public repositories
    pub min_repository_count: Option<u32>,
    /// Primary language qualifier value
    pub primary_language: Option<String>,
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the username fragment
    pub fn username(mut self, fragment: impl Into<String>) -> Self {
        self.username_fragment = Some(fragment.into());
        self
    }

    /// Set the location qualifier
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the minimum repository count
    pub fn min_repos(mut self, count: u32) -> Self {
        self.min_repository_count = Some(count);
        self
    }

    /// Set the language qualifier
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.primary_language = Some(language.into());
        self
    }

    /// True when no field would produce a query fragment
    pub fn is_empty(&self) -> bool {
        present(&self.username_fragment).is_none()
            && present(&self.location).is_none()
            && self.min_repository_count.is_none()
            && present(&self.primary_language).is_none()
    }
}

/// Where the username fragment is matched
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UsernameScope {
    /// Raw token, matched wherever the directory decides
    #[default]
    Any,
    Login,
    Name,
    Email,
}

impl UsernameScope {
    /// The `in:` qualifier for this scope, if any
    pub fn qualifier(&self) -> Option<&'static str> {
        match self {
            Self::Any => None,
            Self::Login => Some("in:login"),
            Self::Name => Some("in:name"),
            Self::Email => Some("in:email"),
        }
    }
}

impl FromStr for UsernameScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "any" => Ok(Self::Any),
            "login" => Ok(Self::Login),
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            other => Err(format!("unknown username scope: {}", other)),
        }
    }
}

/// Sort key understood by the user search endpoint
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Followers,
    Repositories,
    Joined,
}

impl SortKey {
    /// Get the string representation for API calls
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Followers => "followers",
            Self::Repositories => "repositories",
            Self::Joined => "joined",
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "followers" => Ok(Self::Followers),
            "repositories" | "repos" => Ok(Self::Repositories),
            "joined" => Ok(Self::Joined),
            other => Err(format!("unknown sort key: {}", other)),
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Build the directory query string for the given criteria
///
/// Fragments are emitted in a fixed order (username, location, repository
/// count, language) and joined by a single space. Fails with
/// [`SearchError::EmptyCriteria`] when no field is present.
pub fn build(criteria: &SearchCriteria) -> Result<String, SearchError> {
    build_scoped(criteria, UsernameScope::Any)
}

/// Same as [`build`], with an explicit scope for the username fragment
pub fn build_scoped(criteria: &SearchCriteria, scope: UsernameScope) -> Result<String, SearchError> {
    let mut fragments = Vec::with_capacity(4);

    if let Some(username) = present(&criteria.username_fragment) {
        match scope.qualifier() {
            Some(qualifier) => fragments.push(format!("{} {}", username, qualifier)),
            None => fragments.push(username.to_string()),
        }
    }

    if let Some(location) = present(&criteria.location) {
        fragments.push(format!("location:\"{}\"", strip_quotes(location)));
    }

    if let Some(count) = criteria.min_repository_count {
        fragments.push(format!("repos:>={}", count));
    }

    if let Some(language) = present(&criteria.primary_language) {
        fragments.push(format!("language:\"{}\"", strip_quotes(language)));
    }

    if fragments.is_empty() {
        return Err(SearchError::EmptyCriteria);
    }

    Ok(fragments.join(" "))
}

/// A text field counts only when it has non-whitespace content
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Quoted qualifier values cannot carry quotes of their own
fn strip_quotes(value: &str) -> String {
    value.replace('"', "")
}
