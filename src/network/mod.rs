//! HTTP networking module
//!
//! Provides the transport used to talk to the remote user directory.

mod client;
mod types;
mod user_agent;

pub use client::HttpClient;
pub use types::{ApiRequest, ApiResponse, EndpointKind, TransportFailure};
pub use user_agent::{accept_json, default_user_agent};
