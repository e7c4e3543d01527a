//! HTTP transport for the orchestrator's JSON API.

mod config;
pub use config::{ClientConfig, DEFAULT_ADDRESS, ENV_ADDRESS};

mod errors;
pub use errors::ClientError;

mod http;
pub use http::{HttpClient, INDEX_HEADER};
