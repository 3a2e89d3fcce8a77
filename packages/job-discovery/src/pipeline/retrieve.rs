//! Vector retrieval against the posting store.

use tracing::debug;

use crate::error::{DiscoveryError, Result};
use crate::pipeline::with_store_retry;
use crate::traits::{
    embedder::Embedder,
    store::{PostingStore, ScoredPosting},
};
use crate::types::config::SearchConfig;

/// Embed `query` and fetch the nearest postings.
///
/// Rejects an empty query or an out-of-range `retrieve_top_k` with
/// `InvalidQuery` before touching the embedder or the store.
pub async fn retrieve(
    query: &str,
    config: &SearchConfig,
    store: &dyn PostingStore,
    embedder: &dyn Embedder,
) -> Result<Vec<ScoredPosting>> {
    if query.trim().is_empty() {
        return Err(DiscoveryError::invalid_query("query text is empty"));
    }
    config.validate()?;

    let embedding = embedder.embed(query).await?;
    if embedding.len() != embedder.dimension() {
        return Err(DiscoveryError::Embedding(format!(
            "{} returned dimension {}, expected {}",
            embedder.name(),
            embedding.len(),
            embedder.dimension()
        )));
    }

    let hits = with_store_retry("query", config.store_retries, config.store_retry_backoff, || {
        store.query(&embedding, config.retrieve_top_k, config.similarity_floor)
    })
    .await?;

    debug!(
        top_k = config.retrieve_top_k,
        returned = hits.len(),
        "Retrieved candidates"
    );
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedders::HashEmbedder;
    use crate::identity::PostingId;
    use crate::stores::MemoryStore;
    use crate::testing::MockEmbedder;
    use crate::traits::store::PostingRecord;
    use crate::types::posting::Posting;

    async fn seeded_store(embedder: &HashEmbedder, titles: &[&str]) -> MemoryStore {
        let store = MemoryStore::new();
        for (i, title) in titles.iter().enumerate() {
            let url = format!("https://jobs.example.com/{}", i);
            let posting = Posting {
                identity: PostingId::from_url(&url),
                title: title.to_string(),
                apply_url: url,
                ..Default::default()
            };
            let embedding = embedder.embed_text(&posting.embedding_text());
            store
                .insert(PostingRecord::new(posting, "", embedding))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_empty_query_rejected_before_io() {
        let store = MemoryStore::new();
        let embedder = MockEmbedder::new(8);

        let err = retrieve("   ", &SearchConfig::default(), &store, &embedder)
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::InvalidQuery { .. }));
        assert_eq!(embedder.call_count(), 0);
    }

    #[tokio::test]
    async fn test_zero_top_k_rejected() {
        let store = MemoryStore::new();
        let embedder = MockEmbedder::new(8);
        let config = SearchConfig::default().with_retrieve_top_k(0);

        let err = retrieve("rust", &config, &store, &embedder).await.unwrap_err();
        assert!(matches!(err, DiscoveryError::InvalidQuery { .. }));
        assert_eq!(embedder.call_count(), 0);
    }

    #[tokio::test]
    async fn test_bounded_by_top_k() {
        let embedder = HashEmbedder::new(64);
        let store = seeded_store(
            &embedder,
            &["Rust engineer", "Python engineer", "Chef", "Rust developer"],
        )
        .await;
        let config = SearchConfig::default().with_retrieve_top_k(2);

        let hits = retrieve("rust engineer", &config, &store, &embedder).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].posting.title, "Rust engineer");
    }

    #[tokio::test]
    async fn test_empty_store_returns_nothing() {
        let store = MemoryStore::new();
        let embedder = HashEmbedder::new(16);

        let hits = retrieve("anything", &SearchConfig::default(), &store, &embedder)
            .await
            .unwrap();
        assert!(hits.is_empty());
    }
}
