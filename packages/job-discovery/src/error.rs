//! Typed errors for the discovery library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

use crate::identity::PostingId;

/// Errors that can occur during ingestion and search.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Empty or malformed query, rejected before any I/O
    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },

    /// Fetching a discovered URL failed
    #[error("fetch failed: {0}")]
    FetchFailed(#[from] FetchError),

    /// A record with this identity is already stored
    #[error("duplicate identity: {identity}")]
    DuplicateIdentity { identity: PostingId },

    /// The persistence layer could not be reached
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// An extraction or scoring oracle call failed or returned garbage
    #[error("oracle failure: {0}")]
    OracleFailure(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Discovery provider failed
    #[error("search provider error: {0}")]
    Search(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Embedding generation failed or produced the wrong shape
    #[error("embedding error: {0}")]
    Embedding(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Operation was cancelled
    #[error("operation cancelled")]
    Cancelled,
}

impl DiscoveryError {
    /// Shorthand for an invalid query.
    pub fn invalid_query(reason: impl Into<String>) -> Self {
        Self::InvalidQuery {
            reason: reason.into(),
        }
    }

    /// Shorthand for an oracle failure carrying only a message.
    pub fn oracle(message: impl Into<String>) -> Self {
        Self::OracleFailure(message.into().into())
    }

    /// Shorthand for an unreachable store carrying only a message.
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable(message.into().into())
    }

    /// Whether the caller should retry the store operation.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

/// Errors that can occur while fetching a single URL.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP transport failed
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Server answered with a non-success status
    #[error("HTTP status {status}")]
    Status { status: u16 },

    /// Connection or read timeout
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Invalid URL format
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Only http and https are fetched
    #[error("unsupported URL scheme: {url}")]
    UnsupportedScheme { url: String },
}

/// Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;
