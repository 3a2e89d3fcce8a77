//! Pipeline orchestrator - the entry point for both flows.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{DiscoveryError, Result};
use crate::fetchers::HttpFetcher;
use crate::pipeline::{
    filter::filter_rejected,
    ingest::{ingest_urls, IngestDeps, IngestReport},
    query::compose_query,
    rank::rank,
    retrieve::retrieve,
    score::score_candidates,
    IdentityLocks,
};
use crate::traits::{
    embedder::Embedder,
    fetcher::Fetcher,
    oracle::{ExtractionOracle, ScoringOracle},
    searcher::{WebSearcher, DEFAULT_DISCOVERY_QUERY},
    store::PostingStore,
};
use crate::types::{
    config::{IngestConfig, SearchConfig},
    profile::Profile,
    rejection::RejectionMemory,
    result::SearchResult,
};

/// Wires the store, embedder and oracles into the ingest and search flows.
///
/// # Example
///
/// ```rust,ignore
/// use job_discovery::{Pipeline, MemoryStore, HashEmbedder};
///
/// let pipeline = Pipeline::new(MemoryStore::new(), HashEmbedder::default(), extractor, scorer)
///     .with_searcher(searcher);
///
/// let report = pipeline.discover_and_ingest(None).await?;
/// let result = pipeline.search(&profile, &rejections).await;
/// println!("{}", serde_json::to_string_pretty(&result)?);
/// ```
pub struct Pipeline<S: PostingStore, E: Embedder> {
    store: Arc<S>,
    embedder: Arc<E>,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn ExtractionOracle>,
    scorer: Arc<dyn ScoringOracle>,
    searcher: Option<Arc<dyn WebSearcher>>,
    locks: IdentityLocks,
    ingest_config: IngestConfig,
    search_config: SearchConfig,
}

impl<S: PostingStore, E: Embedder> Pipeline<S, E> {
    /// Create a pipeline that fetches over HTTP and has no discovery source.
    pub fn new(
        store: S,
        embedder: E,
        extractor: impl ExtractionOracle + 'static,
        scorer: impl ScoringOracle + 'static,
    ) -> Self {
        Self {
            store: Arc::new(store),
            embedder: Arc::new(embedder),
            fetcher: Arc::new(HttpFetcher::new()),
            extractor: Arc::new(extractor),
            scorer: Arc::new(scorer),
            searcher: None,
            locks: IdentityLocks::new(),
            ingest_config: IngestConfig::default(),
            search_config: SearchConfig::default(),
        }
    }

    pub fn with_fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Arc::new(fetcher);
        self
    }

    pub fn with_searcher(mut self, searcher: impl WebSearcher + 'static) -> Self {
        self.searcher = Some(Arc::new(searcher));
        self
    }

    pub fn with_ingest_config(mut self, config: IngestConfig) -> Self {
        self.ingest_config = config;
        self
    }

    pub fn with_search_config(mut self, config: SearchConfig) -> Self {
        self.search_config = config;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn ingest_config(&self) -> &IngestConfig {
        &self.ingest_config
    }

    pub fn search_config(&self) -> &SearchConfig {
        &self.search_config
    }

    /// Number of stored postings.
    pub async fn count(&self) -> Result<usize> {
        self.store.count().await
    }

    // =========================================================================
    // Ingest
    // =========================================================================

    /// Ingest explicit URLs. Never fails as a whole; see the report.
    pub async fn ingest_urls(&self, urls: &[String]) -> IngestReport {
        let deps = IngestDeps {
            store: self.store.as_ref(),
            fetcher: self.fetcher.as_ref(),
            extractor: self.extractor.as_ref(),
            embedder: self.embedder.as_ref(),
            locks: &self.locks,
        };
        ingest_urls(urls, &self.ingest_config, deps).await
    }

    /// Ask the web searcher for URLs and ingest them.
    ///
    /// Fails only when no searcher is configured or the search itself fails.
    pub async fn discover_and_ingest(&self, query: Option<&str>) -> Result<IngestReport> {
        let searcher = self.searcher.as_ref().ok_or_else(|| {
            DiscoveryError::Config("no web searcher configured for discovery".into())
        })?;

        let query = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .unwrap_or(DEFAULT_DISCOVERY_QUERY);
        let urls = searcher
            .search(query, self.ingest_config.discovery_limit)
            .await?;

        info!(query = %query, discovered = urls.len(), "Discovery complete");
        Ok(self.ingest_urls(&urls).await)
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Search with a query composed from the profile.
    pub async fn search(&self, profile: &Profile, rejections: &RejectionMemory) -> SearchResult {
        self.search_with_cancel(profile, rejections, CancellationToken::new())
            .await
    }

    /// Search that stops scoring when `cancel` fires.
    pub async fn search_with_cancel(
        &self,
        profile: &Profile,
        rejections: &RejectionMemory,
        cancel: CancellationToken,
    ) -> SearchResult {
        let query = compose_query(profile);
        self.search_with_query(&query, profile, rejections, cancel)
            .await
    }

    /// Search with caller-supplied query text.
    ///
    /// Always returns a well-formed envelope. A request that cannot be run
    /// at all (empty query, invalid config, store down) comes back empty
    /// with `error` set.
    pub async fn search_with_query(
        &self,
        query: &str,
        profile: &Profile,
        rejections: &RejectionMemory,
        cancel: CancellationToken,
    ) -> SearchResult {
        let k = self
            .search_config
            .result_count
            .unwrap_or_else(|| profile.jobs_wanted());

        let hits = match retrieve(
            query,
            &self.search_config,
            self.store.as_ref(),
            self.embedder.as_ref(),
        )
        .await
        {
            Ok(hits) => hits,
            Err(e) => {
                warn!(query = %query, error = %e, "Retrieval failed");
                let mut result = SearchResult::empty(query);
                result.error = Some(e.to_string());
                return result;
            }
        };
        let num_total = hits.len();

        let filtered = filter_rejected(hits, rejections);
        let num_after_filtering = filtered.len();

        let postings = filtered.into_iter().map(|hit| hit.posting).collect();
        let outcome = score_candidates(
            postings,
            profile,
            rejections,
            self.scorer.as_ref(),
            &self.search_config,
            &cancel,
        )
        .await;
        let num_passed = outcome.passed.len();

        let jobs = rank(outcome.passed, k);

        let result = SearchResult {
            num_total,
            num_after_filtering,
            num_passed,
            num_inconsistent: outcome.num_inconsistent,
            num_after_ranking: jobs.len(),
            jobs,
            query_used: query.to_string(),
            cancelled: outcome.cancelled,
            error: None,
        };

        info!(
            query = %query,
            num_total = result.num_total,
            num_after_filtering = result.num_after_filtering,
            num_passed = result.num_passed,
            num_after_ranking = result.num_after_ranking,
            cancelled = result.cancelled,
            "Search complete"
        );
        result
    }
}
