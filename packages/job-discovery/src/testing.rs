//! Testing utilities including mock implementations.
//!
//! Deterministic stand-ins for every collaborator, with call tracking, so
//! the pipeline can be exercised without network or LLM calls.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::{DiscoveryError, FetchError, FetchResult, Result};
use crate::identity::PostingId;
use crate::traits::{
    embedder::Embedder,
    fetcher::{FetchedPage, Fetcher},
    oracle::{ExtractionOracle, ScoringOracle},
    store::{PostingRecord, PostingStore, ScoredPosting},
};
use crate::types::{
    posting::{ExtractedFields, Posting},
    profile::Profile,
    rejection::RejectionMemory,
    result::OracleVerdict,
};

// =============================================================================
// Embedder
// =============================================================================

/// Embedder that derives vectors from a SHA-256 of the text.
///
/// Same text, same vector. Unrelated texts land far apart, so it is only
/// useful where similarity order does not matter.
#[derive(Default)]
pub struct MockEmbedder {
    dimension: usize,
    fail: bool,
    calls: AtomicUsize,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            ..Default::default()
        }
    }

    /// Every call fails with an embedding error.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "mock-sha256"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(DiscoveryError::Embedding("mock embedder failure".into()));
        }

        let hash = Sha256::digest(text.as_bytes());
        Ok((0..self.dimension)
            .map(|i| (hash[i % 32] as f32 / 127.5) - 1.0)
            .collect())
    }
}

// =============================================================================
// Extraction oracle
// =============================================================================

/// Extraction oracle with canned answers per URL.
///
/// Unregistered URLs get a posting titled with the first non-empty line of
/// the content.
#[derive(Default)]
pub struct MockExtractionOracle {
    fields: RwLock<HashMap<String, ExtractedFields>>,
    failures: RwLock<HashSet<String>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockExtractionOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fields(self, url: impl Into<String>, fields: ExtractedFields) -> Self {
        self.fields.write().unwrap().insert(url.into(), fields);
        self
    }

    pub fn with_failure(self, url: impl Into<String>) -> Self {
        self.failures.write().unwrap().insert(url.into());
        self
    }

    /// URLs extracted so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }
}

#[async_trait]
impl ExtractionOracle for MockExtractionOracle {
    async fn extract(&self, url: &str, content: &str) -> Result<ExtractedFields> {
        self.calls.write().unwrap().push(url.to_string());

        if self.failures.read().unwrap().contains(url) {
            return Err(DiscoveryError::oracle(format!("mock extraction failure for {}", url)));
        }
        if let Some(fields) = self.fields.read().unwrap().get(url) {
            return Ok(fields.clone());
        }

        Ok(ExtractedFields {
            title: content
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .unwrap_or_default()
                .to_string(),
            job_description: content.trim().to_string(),
            ..Default::default()
        })
    }
}

// =============================================================================
// Scoring oracle
// =============================================================================

/// Scoring oracle with canned verdicts per identity.
#[derive(Default)]
pub struct MockScoringOracle {
    verdicts: RwLock<HashMap<PostingId, OracleVerdict>>,
    default_verdict: Option<OracleVerdict>,
    failures: RwLock<HashSet<PostingId>>,
    delays: RwLock<HashMap<PostingId, Duration>>,
    calls: Arc<RwLock<Vec<PostingId>>>,
}

impl MockScoringOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verdict(self, id: impl Into<PostingId>, verdict: OracleVerdict) -> Self {
        self.verdicts.write().unwrap().insert(id.into(), verdict);
        self
    }

    /// Verdict for identities without a specific one.
    pub fn with_default(mut self, verdict: OracleVerdict) -> Self {
        self.default_verdict = Some(verdict);
        self
    }

    pub fn with_failure(self, id: impl Into<PostingId>) -> Self {
        self.failures.write().unwrap().insert(id.into());
        self
    }

    /// Sleep before answering for this identity.
    pub fn with_delay(self, id: impl Into<PostingId>, delay: Duration) -> Self {
        self.delays.write().unwrap().insert(id.into(), delay);
        self
    }

    /// Identities scored so far, in call order.
    pub fn calls(&self) -> Vec<PostingId> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    pub fn was_scored(&self, id: &PostingId) -> bool {
        self.calls.read().unwrap().contains(id)
    }
}

#[async_trait]
impl ScoringOracle for MockScoringOracle {
    async fn score(
        &self,
        posting: &Posting,
        _profile: &Profile,
        _rejections: &RejectionMemory,
    ) -> Result<OracleVerdict> {
        let id = &posting.identity;
        self.calls.write().unwrap().push(id.clone());

        let delay = self.delays.read().unwrap().get(id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failures.read().unwrap().contains(id) {
            return Err(DiscoveryError::oracle(format!("mock scoring failure for {}", id)));
        }

        self.verdicts
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .or_else(|| self.default_verdict.clone())
            .ok_or_else(|| DiscoveryError::oracle(format!("no mock verdict for {}", id)))
    }
}

// =============================================================================
// Fetcher
// =============================================================================

/// Fetcher serving registered pages; anything else is a transport error.
#[derive(Default)]
pub struct MockFetcher {
    pages: HashMap<String, (u16, String)>,
    delay: Option<Duration>,
    fetches: RwLock<HashMap<String, usize>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        self.pages.insert(url.into(), (status, body.into()));
        self
    }

    /// Sleep before every response.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fetch_count(&self, url: &str) -> usize {
        self.fetches.read().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        self.fetches.read().unwrap().values().sum()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> FetchResult<FetchedPage> {
        *self.fetches.write().unwrap().entry(url.to_string()).or_default() += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.pages.get(url) {
            Some((status, body)) => Ok(FetchedPage::new(url, *status, body.clone())
                .with_content_type("text/html")),
            None => Err(FetchError::Http(
                format!("connection refused: {}", url).into(),
            )),
        }
    }
}

// =============================================================================
// Store
// =============================================================================

/// Store wrapper that reports `StoreUnavailable` for the first N calls.
pub struct FlakyStore<S> {
    inner: S,
    failures_left: AtomicUsize,
    calls: AtomicUsize,
}

impl<S: PostingStore> FlakyStore<S> {
    pub fn new(inner: S, failures: usize) -> Self {
        Self {
            inner,
            failures_left: AtomicUsize::new(failures),
            calls: AtomicUsize::new(0),
        }
    }

    /// Never recovers.
    pub fn always_down(inner: S) -> Self {
        Self::new(inner, usize::MAX)
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn trip(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let tripped = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if tripped {
            return Err(DiscoveryError::store_unavailable("mock store is down"));
        }
        Ok(())
    }
}

#[async_trait]
impl<S: PostingStore> PostingStore for FlakyStore<S> {
    async fn exists(&self, id: &PostingId) -> Result<bool> {
        self.trip()?;
        self.inner.exists(id).await
    }

    async fn insert(&self, record: PostingRecord) -> Result<()> {
        self.trip()?;
        self.inner.insert(record).await
    }

    async fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
        min_similarity: Option<f32>,
    ) -> Result<Vec<ScoredPosting>> {
        self.trip()?;
        self.inner.query(embedding, top_k, min_similarity).await
    }

    async fn count(&self) -> Result<usize> {
        self.inner.count().await
    }

    async fn get(&self, id: &PostingId) -> Result<Option<PostingRecord>> {
        self.inner.get(id).await
    }
}
