//! User directory module
//!
//! Defines the `UserDirectory` trait the pipeline talks to and the
//! implementation backed by the GitHub REST API.

mod github;
mod traits;

pub use github::GitHubDirectory;
pub use traits::*;
