//! Record type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Kind of account behind a record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum EntityKind {
    #[default]
    User,
    Organization,
    Bot,
    #[serde(other)]
    Other,
}

/// Lightweight identity entry returned by the search endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BasicRecord {
    /// Stable unique id
    pub id: u64,
    /// Handle (login)
    pub login: String,
    /// Avatar image URL
    pub avatar_url: String,
    /// Public profile URL
    pub html_url: String,
    /// User, organization, ...
    #[serde(rename = "type", default)]
    pub kind: EntityKind,
    /// Relevance score reported by the search endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Profile fields only available from the per-identity endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileDetails {
    #[serde(default, deserialize_with = "non_empty")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub blog: Option<String>,
    #[serde(default)]
    pub public_repos: Option<u32>,
    #[serde(default)]
    pub followers: Option<u32>,
    #[serde(default)]
    pub following: Option<u32>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Full profile fetched by a follow-up per-identity request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetailRecord {
    #[serde(flatten)]
    pub basic: BasicRecord,
    #[serde(flatten)]
    pub profile: ProfileDetails,
}

/// A basic record with whatever profile details could be fetched
///
/// When enrichment fails the record carries no profile and is otherwise
/// identical to the basic record it came from.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub basic: BasicRecord,
    #[serde(flatten)]
    pub profile: Option<ProfileDetails>,
}

impl EnrichedRecord {
    /// Merge a detail record into a basic record
    ///
    /// Identity fields always come from the search hit.
    pub fn merge(basic: BasicRecord, detail: DetailRecord) -> Self {
        Self {
            basic,
            profile: Some(detail.profile),
        }
    }

    /// Whether profile details were merged in
    pub fn is_enriched(&self) -> bool {
        self.profile.is_some()
    }

    pub fn login(&self) -> &str {
        &self.basic.login
    }

    /// Display name, falling back to the handle
    pub fn display_name(&self) -> &str {
        self.profile
            .as_ref()
            .and_then(|p| p.name.as_deref())
            .unwrap_or(&self.basic.login)
    }

    /// Blog link with a scheme, if the profile has one
    pub fn blog_url(&self) -> Option<String> {
        let blog = self.profile.as_ref()?.blog.as_deref()?.trim();
        if blog.is_empty() {
            return None;
        }
        if blog.starts_with("http://") || blog.starts_with("https://") {
            Some(blog.to_string())
        } else {
            Some(format!("https://{}", blog))
        }
    }

    /// Link to the repositories tab, only for accounts with public repositories
    pub fn repositories_url(&self) -> Option<String> {
        let repos = self.profile.as_ref()?.public_repos?;
        if repos == 0 {
            return None;
        }
        Some(format!("{}?tab=repositories", self.basic.html_url))
    }
}

impl From<BasicRecord> for EnrichedRecord {
    fn from(basic: BasicRecord) -> Self {
        Self {
            basic,
            profile: None,
        }
    }
}

/// A public repository owned by a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepositoryRecord {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub html_url: String,
    #[serde(default, deserialize_with = "non_empty")]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u32,
    #[serde(default)]
    pub forks_count: u32,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// The directory sends `""` for unset profile fields
fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
