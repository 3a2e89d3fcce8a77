//! Ingestion - fetch, extract, identify and store each discovered URL once.
//!
//! Per-URL state machine:
//! `Discovered → Fetched → Extracted → {Stored | Skipped(duplicate) | Skipped(fetch-failed)}`
//! plus `Failed` for extraction, embedding and store errors. No single URL
//! can abort the batch.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{DiscoveryError, FetchError};
use crate::identity::PostingId;
use crate::pipeline::{with_store_retry, IdentityLocks};
use crate::traits::{
    embedder::Embedder, fetcher::Fetcher, oracle::ExtractionOracle, store::PostingRecord,
    store::PostingStore,
};
use crate::types::{
    config::{EmbedSource, IngestConfig},
    posting::{ExtractedFields, Posting},
};

/// Collaborators used by one ingest run.
#[derive(Clone, Copy)]
pub struct IngestDeps<'a> {
    pub store: &'a dyn PostingStore,
    pub fetcher: &'a dyn Fetcher,
    pub extractor: &'a dyn ExtractionOracle,
    pub embedder: &'a dyn Embedder,
    pub locks: &'a IdentityLocks,
}

/// Stage at which a URL failed after being fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Extraction,
    Embedding,
    Store,
}

/// Terminal state of one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestOutcome {
    Stored { identity: PostingId },
    SkippedDuplicate { identity: PostingId },
    SkippedFetchFailed { reason: String },
    Failed { stage: FailureStage, reason: String },
}

/// Outcome for one input URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlOutcome {
    pub url: String,
    #[serde(flatten)]
    pub outcome: IngestOutcome,
}

/// Summary of an ingest run, outcomes in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub discovered: usize,
    pub inserted: usize,
    pub skipped_duplicate: usize,
    pub skipped_fetch_failed: usize,
    pub failed: usize,
    pub outcomes: Vec<UrlOutcome>,
}

impl IngestReport {
    fn record(&mut self, url: String, outcome: IngestOutcome) {
        match &outcome {
            IngestOutcome::Stored { .. } => self.inserted += 1,
            IngestOutcome::SkippedDuplicate { .. } => self.skipped_duplicate += 1,
            IngestOutcome::SkippedFetchFailed { .. } => self.skipped_fetch_failed += 1,
            IngestOutcome::Failed { .. } => self.failed += 1,
        }
        self.outcomes.push(UrlOutcome { url, outcome });
    }

    /// Whether every URL ended stored or as a benign skip.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.skipped_fetch_failed == 0
    }
}

/// Ingest a batch of URLs.
///
/// URLs run concurrently up to `config.concurrency`; identical URLs in the
/// batch are serialized on their identity lock, so only the first is stored.
pub async fn ingest_urls(urls: &[String], config: &IngestConfig, deps: IngestDeps<'_>) -> IngestReport {
    info!(urls = urls.len(), concurrency = config.concurrency, "Starting ingest");

    let mut results: Vec<(usize, IngestOutcome)> = stream::iter(urls.iter().cloned().enumerate())
        .map(move |(index, url)| async move { (index, ingest_one(&url, config, deps).await) })
        .buffer_unordered(config.concurrency.max(1))
        .collect()
        .await;
    results.sort_by_key(|(index, _)| *index);

    deps.locks.prune();

    let mut report = IngestReport {
        discovered: urls.len(),
        ..Default::default()
    };
    for (index, outcome) in results {
        report.record(urls[index].clone(), outcome);
    }

    info!(
        discovered = report.discovered,
        inserted = report.inserted,
        skipped_duplicate = report.skipped_duplicate,
        skipped_fetch_failed = report.skipped_fetch_failed,
        failed = report.failed,
        "Ingest complete"
    );
    report
}

/// Run one URL through the state machine.
pub async fn ingest_one(url: &str, config: &IngestConfig, deps: IngestDeps<'_>) -> IngestOutcome {
    let identity = PostingId::from_url(url);
    let _guard = deps.locks.lock(&identity).await;

    // Discovered: skip known identities before paying for fetch + extraction.
    let exists = with_store_retry("exists", config.store_retries, config.store_retry_backoff, || {
        deps.store.exists(&identity)
    })
    .await;
    match exists {
        Ok(true) => {
            debug!(url = %url, identity = %identity, "Already stored, skipping");
            return IngestOutcome::SkippedDuplicate { identity };
        }
        Ok(false) => {}
        Err(e) => {
            warn!(url = %url, error = %e, "Store unavailable for existence check");
            return IngestOutcome::Failed {
                stage: FailureStage::Store,
                reason: e.to_string(),
            };
        }
    }

    // Fetched
    let page = match fetch(deps.fetcher, url, config.fetch_timeout).await {
        Ok(page) if page.is_success() => page,
        Ok(page) => {
            warn!(url = %url, status = page.status, "Fetch returned non-success status");
            return IngestOutcome::SkippedFetchFailed {
                reason: FetchError::Status { status: page.status }.to_string(),
            };
        }
        Err(e) => {
            warn!(url = %url, error = %e, "Fetch failed");
            return IngestOutcome::SkippedFetchFailed {
                reason: e.to_string(),
            };
        }
    };

    // Extracted
    let fields = match extract(deps.extractor, url, &page.body, config.extraction_timeout).await {
        Ok(fields) => fields,
        Err(e) => {
            warn!(url = %url, error = %e, "Extraction failed");
            return IngestOutcome::Failed {
                stage: FailureStage::Extraction,
                reason: e.to_string(),
            };
        }
    };
    let posting = Posting::from_extraction(url, fields);

    let text = match config.embed_source {
        EmbedSource::Fields => posting.embedding_text(),
        EmbedSource::RawContent => page.body.clone(),
    };
    let embedding = match deps.embedder.embed(&text).await {
        Ok(embedding) => embedding,
        Err(e) => {
            warn!(url = %url, error = %e, "Embedding failed");
            return IngestOutcome::Failed {
                stage: FailureStage::Embedding,
                reason: e.to_string(),
            };
        }
    };

    let record = PostingRecord::new(posting, page.body, embedding);
    let inserted = with_store_retry("insert", config.store_retries, config.store_retry_backoff, || {
        deps.store.insert(record.clone())
    })
    .await;

    match inserted {
        Ok(()) => {
            info!(url = %url, identity = %identity, "Posting stored");
            IngestOutcome::Stored { identity }
        }
        Err(DiscoveryError::DuplicateIdentity { identity }) => {
            info!(url = %url, identity = %identity, "Posting stored concurrently elsewhere, skipping");
            IngestOutcome::SkippedDuplicate { identity }
        }
        Err(e) => {
            warn!(url = %url, error = %e, "Insert failed");
            IngestOutcome::Failed {
                stage: FailureStage::Store,
                reason: e.to_string(),
            }
        }
    }
}

async fn fetch(
    fetcher: &dyn Fetcher,
    url: &str,
    timeout: Duration,
) -> Result<crate::traits::fetcher::FetchedPage, FetchError> {
    match tokio::time::timeout(timeout, fetcher.fetch(url, timeout)).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout {
            url: url.to_string(),
        }),
    }
}

async fn extract(
    extractor: &dyn ExtractionOracle,
    url: &str,
    content: &str,
    timeout: Duration,
) -> Result<ExtractedFields, DiscoveryError> {
    tokio::time::timeout(timeout, extractor.extract(url, content))
        .await
        .map_err(|_| {
            DiscoveryError::oracle(format!(
                "extraction timed out after {}ms",
                timeout.as_millis()
            ))
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedders::HashEmbedder;
    use crate::stores::MemoryStore;
    use crate::testing::MockFetcher;
    use crate::traits::oracle::MockExtractionOracle;
    use crate::types::posting::ExtractedFields;

    fn extractor_returning(title: &'static str) -> MockExtractionOracle {
        let mut extractor = MockExtractionOracle::new();
        extractor.expect_extract().returning(move |_, _| {
            Ok(ExtractedFields {
                title: title.to_string(),
                ..Default::default()
            })
        });
        extractor
    }

    #[tokio::test]
    async fn test_stores_new_url() {
        let store = MemoryStore::new();
        let fetcher = MockFetcher::new().with_page("https://jobs.example.com/1", 200, "<h1>SRE</h1>");
        let extractor = extractor_returning("SRE");
        let embedder = HashEmbedder::new(32);
        let locks = IdentityLocks::new();
        let deps = IngestDeps {
            store: &store,
            fetcher: &fetcher,
            extractor: &extractor,
            embedder: &embedder,
            locks: &locks,
        };

        let report = ingest_urls(&["https://jobs.example.com/1".to_string()], &IngestConfig::default(), deps).await;

        assert_eq!(report.inserted, 1);
        assert!(report.is_success());
        let id = PostingId::from_url("https://jobs.example.com/1");
        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.posting.title, "SRE");
        assert_eq!(record.posting.apply_url, "https://jobs.example.com/1");
        assert_eq!(record.raw_content, "<h1>SRE</h1>");
    }

    #[tokio::test]
    async fn test_known_identity_skips_fetch_and_extraction() {
        let store = MemoryStore::new();
        let fetcher = MockFetcher::new().with_page("https://jobs.example.com/1", 200, "body");
        let mut extractor = MockExtractionOracle::new();
        extractor
            .expect_extract()
            .times(1)
            .returning(|_, _| Ok(ExtractedFields::default()));
        let embedder = HashEmbedder::new(32);
        let locks = IdentityLocks::new();
        let deps = IngestDeps {
            store: &store,
            fetcher: &fetcher,
            extractor: &extractor,
            embedder: &embedder,
            locks: &locks,
        };
        let urls = vec!["https://jobs.example.com/1".to_string()];

        let first = ingest_urls(&urls, &IngestConfig::default(), deps).await;
        let second = ingest_urls(&urls, &IngestConfig::default(), deps).await;

        assert_eq!(first.inserted, 1);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped_duplicate, 1);
        assert_eq!(fetcher.fetch_count("https://jobs.example.com/1"), 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_skipped_without_extraction() {
        let store = MemoryStore::new();
        let fetcher = MockFetcher::new()
            .with_page("https://jobs.example.com/gone", 404, "not found")
            .with_page("https://jobs.example.com/ok", 200, "ok");
        let mut extractor = MockExtractionOracle::new();
        extractor
            .expect_extract()
            .withf(|url, _| url.ends_with("/ok"))
            .times(1)
            .returning(|_, _| Ok(ExtractedFields::default()));
        let embedder = HashEmbedder::new(32);
        let locks = IdentityLocks::new();
        let deps = IngestDeps {
            store: &store,
            fetcher: &fetcher,
            extractor: &extractor,
            embedder: &embedder,
            locks: &locks,
        };
        let urls = vec![
            "https://jobs.example.com/gone".to_string(),
            "https://jobs.example.com/missing".to_string(),
            "https://jobs.example.com/ok".to_string(),
        ];

        let report = ingest_urls(&urls, &IngestConfig::default(), deps).await;

        assert_eq!(report.skipped_fetch_failed, 2);
        assert_eq!(report.inserted, 1);
        assert_eq!(report.outcomes[0].url, "https://jobs.example.com/gone");
        assert!(matches!(
            report.outcomes[0].outcome,
            IngestOutcome::SkippedFetchFailed { .. }
        ));
        assert!(matches!(report.outcomes[2].outcome, IngestOutcome::Stored { .. }));
    }

    #[tokio::test]
    async fn test_extraction_failure_does_not_abort_batch() {
        let store = MemoryStore::new();
        let fetcher = MockFetcher::new()
            .with_page("https://a.example/1", 200, "one")
            .with_page("https://a.example/2", 200, "two");
        let mut extractor = MockExtractionOracle::new();
        extractor.expect_extract().returning(|url, _| {
            if url.ends_with('1') {
                Err(DiscoveryError::oracle("malformed"))
            } else {
                Ok(ExtractedFields::default())
            }
        });
        let embedder = HashEmbedder::new(32);
        let locks = IdentityLocks::new();
        let deps = IngestDeps {
            store: &store,
            fetcher: &fetcher,
            extractor: &extractor,
            embedder: &embedder,
            locks: &locks,
        };
        let urls = vec!["https://a.example/1".to_string(), "https://a.example/2".to_string()];

        let report = ingest_urls(&urls, &IngestConfig::default(), deps).await;

        assert_eq!(report.failed, 1);
        assert_eq!(report.inserted, 1);
        assert!(matches!(
            report.outcomes[0].outcome,
            IngestOutcome::Failed {
                stage: FailureStage::Extraction,
                ..
            }
        ));
    }

    struct StalledExtractor;

    #[async_trait::async_trait]
    impl ExtractionOracle for StalledExtractor {
        async fn extract(&self, _url: &str, _content: &str) -> crate::error::Result<ExtractedFields> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_stalled_extraction_times_out_and_releases_identity() {
        let store = MemoryStore::new();
        let fetcher = MockFetcher::new().with_page("https://jobs.example.com/slow", 200, "body");
        let extractor = StalledExtractor;
        let embedder = HashEmbedder::new(32);
        let locks = IdentityLocks::new();
        let deps = IngestDeps {
            store: &store,
            fetcher: &fetcher,
            extractor: &extractor,
            embedder: &embedder,
            locks: &locks,
        };
        let config = IngestConfig::default()
            .with_fetch_timeout(Duration::from_millis(50))
            .with_extraction_timeout(Duration::from_millis(50));
        let urls = vec![
            "https://jobs.example.com/slow".to_string(),
            "https://jobs.example.com/slow".to_string(),
        ];

        let report = tokio::time::timeout(Duration::from_secs(3), ingest_urls(&urls, &config, deps))
            .await
            .expect("ingest must finish despite a stalled oracle");

        assert_eq!(report.failed, 2);
        assert_eq!(report.inserted, 0);
        for outcome in &report.outcomes {
            match &outcome.outcome {
                IngestOutcome::Failed { stage, reason } => {
                    assert_eq!(*stage, FailureStage::Extraction);
                    assert!(reason.contains("timed out"));
                }
                other => panic!("unexpected outcome {:?}", other),
            }
        }
        assert!(locks.is_empty());
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = UrlOutcome {
            url: "https://a.example/1".into(),
            outcome: IngestOutcome::SkippedDuplicate {
                identity: PostingId::from("abcd"),
            },
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["outcome"], "skipped_duplicate");
        assert_eq!(value["identity"], "abcd");
        assert_eq!(value["url"], "https://a.example/1");
    }
}
