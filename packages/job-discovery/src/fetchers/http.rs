//! HTTP fetcher backed by reqwest.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

use crate::error::{FetchError, FetchResult};
use crate::traits::fetcher::{FetchedPage, Fetcher};

/// Browser-like agent; many job boards refuse obvious bots.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Fetches one page per call. Non-2xx responses are returned, not raised.
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

fn validate_url(url: &str) -> FetchResult<Url> {
    let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl {
        url: url.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(FetchError::UnsupportedScheme {
            url: url.to_string(),
        }),
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchResult<FetchedPage> {
        let parsed = validate_url(url)?;

        debug!(url = %url, timeout_ms = timeout.as_millis() as u64, "HTTP fetch starting");
        let response = self
            .client
            .get(parsed)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "HTTP request failed");
                if e.is_timeout() {
                    FetchError::Timeout {
                        url: url.to_string(),
                    }
                } else {
                    FetchError::Http(Box::new(e))
                }
            })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Http(Box::new(e))
            }
        })?;

        debug!(url = %url, status, bytes = body.len(), "HTTP fetch complete");

        let mut page = FetchedPage::new(url, status, body);
        if let Some(ct) = content_type {
            page = page.with_content_type(ct);
        }
        Ok(page)
    }
}
