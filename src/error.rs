//! Error types for the spider library.

use thiserror::Error;

/// Result type alias for spider operations.
pub type Result<T> = std::result::Result<T, SpiderError>;

/// Errors that can occur while probing, searching or editing configuration.
#[derive(Error, Debug)]
pub enum SpiderError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("HTTP {0}")]
    Status(u16),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Request timeout exceeded.
    #[error("Request timeout exceeded")]
    Timeout,

    /// No sources configured.
    #[error("No torrent sites configured")]
    NoSources,

    /// Invalid query.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// URL parsing error.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Filesystem error while reading or writing configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be (de)serialized.
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration is inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Site is not present in the configuration.
    #[error("site '{0}' not found")]
    SiteNotFound(String),

    /// Site already exists in the configuration.
    #[error("site '{0}' already exists. Use 'tspider config set-url' to update URL")]
    SiteExists(String),
}
