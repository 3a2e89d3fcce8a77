//! Web search for URL discovery.
//!
//! The ingest flow asks a `WebSearcher` for candidate posting URLs and then
//! fetches each one. Only `http` and `https` URLs are ever returned, and
//! they are returned as the provider wrote them: identity is derived from
//! that exact string, and repeats are left for the identity layer to skip.

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::error::{DiscoveryError, Result};
use crate::security::SecretString;

/// Query used when the caller has nothing better.
pub const DEFAULT_DISCOVERY_QUERY: &str = "machine learning engineer remote";

/// Web search trait for open-world discovery.
///
/// # Implementations
///
/// - `TavilyWebSearcher` - Tavily API
/// - `MockWebSearcher` - For testing
#[async_trait]
pub trait WebSearcher: Send + Sync {
    /// Search the web for up to `limit` URLs relevant to the query.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>>;
}

/// Whether `raw` parses as an `http` or `https` URL.
pub fn is_fetchable(raw: &str) -> bool {
    Url::parse(raw).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}

/// Keep fetchable URLs in order, unmodified apart from surrounding whitespace.
pub fn fetchable_urls<'a>(raw: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    raw.into_iter()
        .map(str::trim)
        .filter(|s| is_fetchable(s))
        .map(str::to_string)
        .collect()
}

/// Mock web searcher for testing.
#[derive(Default)]
pub struct MockWebSearcher {
    results: std::sync::RwLock<std::collections::HashMap<String, Vec<String>>>,
}

impl MockWebSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register URL strings returned for a query. Non-http URLs are dropped.
    pub fn with_urls(self, query: &str, urls: &[&str]) -> Self {
        self.results
            .write()
            .unwrap()
            .insert(query.to_string(), fetchable_urls(urls.iter().copied()));
        self
    }
}

#[async_trait]
impl WebSearcher for MockWebSearcher {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        let mut urls = self
            .results
            .read()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default();
        urls.truncate(limit);
        Ok(urls)
    }
}

/// Tavily-backed web searcher.
pub struct TavilyWebSearcher {
    api_key: SecretString,
    client: reqwest::Client,
    endpoint: String,
}

impl TavilyWebSearcher {
    pub fn new(api_key: impl Into<SecretString>) -> Self {
        Self {
            api_key: api_key.into(),
            client: reqwest::Client::new(),
            endpoint: "https://api.tavily.com/search".to_string(),
        }
    }

    /// Point at a different endpoint (proxies, tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl WebSearcher for TavilyWebSearcher {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        #[derive(serde::Serialize)]
        struct Request<'a> {
            query: &'a str,
            search_depth: &'a str,
            max_results: usize,
        }

        #[derive(serde::Deserialize)]
        struct Response {
            #[serde(default)]
            results: Vec<TavilyResult>,
        }

        #[derive(serde::Deserialize)]
        struct TavilyResult {
            url: String,
        }

        let request = Request {
            query,
            search_depth: "basic",
            max_results: limit,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .json(&request)
            .send()
            .await
            .map_err(|e| DiscoveryError::Search(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::Search(
                format!("Tavily API error: {}", status).into(),
            ));
        }

        let body: Response = response
            .json()
            .await
            .map_err(|e| DiscoveryError::Search(Box::new(e)))?;

        let mut urls = fetchable_urls(body.results.iter().map(|r| r.url.as_str()));
        urls.truncate(limit);
        debug!(query = %query, found = urls.len(), "Tavily search complete");
        Ok(urls)
    }
}
