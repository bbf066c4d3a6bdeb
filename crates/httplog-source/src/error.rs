//! Error types for workload log sources.

use thiserror::Error;

/// Result type alias for log source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors that can occur while listing workloads or reading their logs.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("api returned {status} for {url}: {body}")]
    Api {
        status: u16,
        url: String,
        body: String,
    },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to load credentials from {path}: {source}")]
    Credentials {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("log stream failed: {0}")]
    Stream(String),
}
