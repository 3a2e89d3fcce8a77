//! Fetching discovered URLs.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::FetchResult;

/// Raw response for one URL.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL as requested
    pub url: String,
    pub status: u16,
    pub body: String,
    pub content_type: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

impl FetchedPage {
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status,
            body: body.into(),
            content_type: None,
            fetched_at: Utc::now(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Only 2xx responses continue to extraction.
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

/// Retrieves raw content for a URL.
///
/// Implementations return the page for any HTTP status; the pipeline
/// decides what counts as success. Transport problems are errors.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchResult<FetchedPage>;
}
