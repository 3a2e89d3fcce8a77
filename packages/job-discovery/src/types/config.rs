//! Configuration for the ingest and search flows.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DiscoveryError, Result};

/// Largest retrieval depth accepted by [`SearchConfig::validate`].
pub const MAX_RETRIEVE_TOP_K: usize = 200;

/// What text is embedded for a new record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedSource {
    /// Canonical rendering of the extracted fields
    #[default]
    Fields,
    /// The fetched page body
    RawContent,
}

/// Configuration for the ingestion flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Per-URL fetch timeout.
    ///
    /// Default: 12 seconds.
    pub fetch_timeout: Duration,

    /// Per-URL extraction oracle timeout. Default: 60 seconds.
    pub extraction_timeout: Duration,

    /// URLs processed at once. Default: 4.
    pub concurrency: usize,

    /// Attempts on `StoreUnavailable` before the item is skipped. Default: 3.
    pub store_retries: u32,

    /// Delay between store attempts, doubled each time. Default: 200ms.
    pub store_retry_backoff: Duration,

    /// Text fed to the embedder. Default: extracted fields.
    pub embed_source: EmbedSource,

    /// URLs requested from the discovery collaborator. Default: 15.
    pub discovery_limit: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(12),
            extraction_timeout: Duration::from_secs(60),
            concurrency: 4,
            store_retries: 3,
            store_retry_backoff: Duration::from_millis(200),
            embed_source: EmbedSource::Fields,
            discovery_limit: 15,
        }
    }
}

impl IngestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_extraction_timeout(mut self, timeout: Duration) -> Self {
        self.extraction_timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_store_retries(mut self, retries: u32) -> Self {
        self.store_retries = retries;
        self
    }

    pub fn with_store_retry_backoff(mut self, backoff: Duration) -> Self {
        self.store_retry_backoff = backoff;
        self
    }

    pub fn with_embed_source(mut self, source: EmbedSource) -> Self {
        self.embed_source = source;
        self
    }

    pub fn with_discovery_limit(mut self, limit: usize) -> Self {
        self.discovery_limit = limit;
        self
    }
}

/// Configuration for the search flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Candidates pulled from the store before filtering.
    ///
    /// Must be in `1..=200`. Default: 20.
    pub retrieve_top_k: usize,

    /// Final result count K.
    ///
    /// `None` uses the profile's `number_of_jobs_wanted`.
    pub result_count: Option<usize>,

    /// Scoring oracle calls in flight at once. Default: 5.
    pub scoring_concurrency: usize,

    /// Timeout for a single scoring call, including any retries the
    /// oracle's client performs. Default: 30 seconds.
    pub scoring_timeout: Duration,

    /// Overall budget for the scoring stage. Default: none.
    pub search_deadline: Option<Duration>,

    /// Drop retrieved candidates below this cosine similarity.
    pub similarity_floor: Option<f32>,

    /// Attempts on `StoreUnavailable` during retrieval. Default: 3.
    pub store_retries: u32,

    /// Delay between store attempts, doubled each time. Default: 200ms.
    pub store_retry_backoff: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            retrieve_top_k: 20,
            result_count: None,
            scoring_concurrency: 5,
            scoring_timeout: Duration::from_secs(30),
            search_deadline: None,
            similarity_floor: None,
            store_retries: 3,
            store_retry_backoff: Duration::from_millis(200),
        }
    }
}

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retrieve_top_k(mut self, top_k: usize) -> Self {
        self.retrieve_top_k = top_k;
        self
    }

    pub fn with_result_count(mut self, k: usize) -> Self {
        self.result_count = Some(k);
        self
    }

    pub fn with_scoring_concurrency(mut self, concurrency: usize) -> Self {
        self.scoring_concurrency = concurrency.max(1);
        self
    }

    pub fn with_scoring_timeout(mut self, timeout: Duration) -> Self {
        self.scoring_timeout = timeout;
        self
    }

    pub fn with_search_deadline(mut self, deadline: Duration) -> Self {
        self.search_deadline = Some(deadline);
        self
    }

    pub fn with_similarity_floor(mut self, floor: f32) -> Self {
        self.similarity_floor = Some(floor);
        self
    }

    pub fn with_store_retries(mut self, retries: u32) -> Self {
        self.store_retries = retries;
        self
    }

    pub fn with_store_retry_backoff(mut self, backoff: Duration) -> Self {
        self.store_retry_backoff = backoff;
        self
    }

    /// Reject settings the pipeline cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.retrieve_top_k == 0 || self.retrieve_top_k > MAX_RETRIEVE_TOP_K {
            return Err(DiscoveryError::invalid_query(format!(
                "retrieve_top_k must be in 1..={}, got {}",
                MAX_RETRIEVE_TOP_K, self.retrieve_top_k
            )));
        }
        if self.result_count == Some(0) {
            return Err(DiscoveryError::invalid_query("result_count must be > 0"));
        }
        Ok(())
    }
}
