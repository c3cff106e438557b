//! Configuration module for UserSearch-RS
//!
//! Handles loading and validating settings from YAML files and environment variables.
//! Settings are built once and passed explicitly to the components that need them.

mod settings;

pub use settings::*;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Environment variable pointing at a settings file
pub const SETTINGS_PATH_VAR: &str = "USERSEARCH_SETTINGS_PATH";

/// Default locations checked for a settings file, in order
pub fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("usersearch.yml"),
        PathBuf::from("config/usersearch.yml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("usersearch-rs/usersearch.yml"));
    }
    paths
}

/// Load settings from file or use defaults
///
/// An explicit path must exist. Otherwise `USERSEARCH_SETTINGS_PATH` and the
/// default locations are tried in turn. Environment overrides are applied
/// last and the result is validated.
pub fn load(explicit: Option<&Path>) -> Result<Settings> {
    let path = find_settings_file(explicit)?;
    load_from(path.as_deref())
}

/// Load settings from `path`, or start from defaults when there is none
pub fn load_from(path: Option<&Path>) -> Result<Settings> {
    let mut settings = match path {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };

    settings.merge_env();
    settings.validate()?;
    Ok(settings)
}

/// Settings file that `load` would read, if any
pub fn find_settings_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("Settings file not found: {}", path.display());
        }
        return Ok(Some(path.to_path_buf()));
    }

    if let Ok(path) = std::env::var(SETTINGS_PATH_VAR) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(Some(path));
        }
    }

    Ok(default_paths().into_iter().find(|p| p.exists()))
}
