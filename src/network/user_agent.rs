//! User agent and accept headers
//!
//! The directory API refuses requests without a `User-Agent`, so one is
//! always sent.

/// User agent sent when the settings do not override it
pub fn default_user_agent() -> String {
    format!("usersearch-rs/{}", crate::VERSION)
}

/// Resolve the configured user agent, falling back to the default
pub fn resolve_user_agent(custom: Option<&str>) -> String {
    match custom.map(str::trim) {
        Some(ua) if !ua.is_empty() => ua.to_string(),
        _ => default_user_agent(),
    }
}

/// Standard accept header for the versioned JSON API
pub fn accept_json() -> &'static str {
    "application/vnd.github.v3+json"
}
