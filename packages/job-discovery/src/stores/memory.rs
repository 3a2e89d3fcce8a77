//! In-memory posting store for tests and offline runs.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{DiscoveryError, Result};
use crate::identity::PostingId;
use crate::traits::store::{
    cosine_similarity, rank_by_similarity, PostingRecord, PostingStore, ScoredPosting,
};

/// In-memory storage for posting records.
///
/// Not durable. The existence check and the insert happen under one write
/// lock, so concurrent inserts of the same identity cannot both succeed.
/// The first insert fixes the embedding dimension.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<PostingId, PostingRecord>>,
    dimension: RwLock<Option<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require every embedding to have this length.
    pub fn with_dimension(self, dimension: usize) -> Self {
        *self.dimension.write().unwrap() = Some(dimension);
        self
    }

    /// Stored identities, sorted.
    pub fn identities(&self) -> Vec<PostingId> {
        let mut ids: Vec<_> = self.records.read().unwrap().keys().cloned().collect();
        ids.sort();
        ids
    }

    fn check_dimension(&self, len: usize) -> Result<()> {
        let mut dimension = self.dimension.write().unwrap();
        match *dimension {
            Some(expected) if expected != len => Err(DiscoveryError::Embedding(format!(
                "expected dimension {}, got {}",
                expected, len
            ))),
            Some(_) => Ok(()),
            None => {
                *dimension = Some(len);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl PostingStore for MemoryStore {
    async fn exists(&self, id: &PostingId) -> Result<bool> {
        Ok(self.records.read().unwrap().contains_key(id))
    }

    async fn insert(&self, record: PostingRecord) -> Result<()> {
        if record.embedding.is_empty() {
            return Err(DiscoveryError::Embedding("empty embedding".into()));
        }

        let mut records = self.records.write().unwrap();
        if records.contains_key(record.identity()) {
            return Err(DiscoveryError::DuplicateIdentity {
                identity: record.identity().clone(),
            });
        }
        self.check_dimension(record.embedding.len())?;

        records.insert(record.identity().clone(), record);
        Ok(())
    }

    async fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
        min_similarity: Option<f32>,
    ) -> Result<Vec<ScoredPosting>> {
        let hits = self
            .records
            .read()
            .unwrap()
            .values()
            .map(|record| ScoredPosting {
                posting: record.posting.clone(),
                similarity: cosine_similarity(embedding, &record.embedding),
            })
            .collect();

        Ok(rank_by_similarity(hits, top_k, min_similarity))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().unwrap().len())
    }

    async fn get(&self, id: &PostingId) -> Result<Option<PostingRecord>> {
        Ok(self.records.read().unwrap().get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::types::posting::Posting;

    fn record(url: &str, embedding: Vec<f32>) -> PostingRecord {
        let posting = Posting {
            identity: PostingId::from_url(url),
            apply_url: url.to_string(),
            ..Default::default()
        };
        PostingRecord::new(posting, "<html>", embedding)
    }

    #[tokio::test]
    async fn test_insert_then_exists() {
        let store = MemoryStore::new();
        let rec = record("https://a.com/1", vec![1.0, 0.0]);
        let id = rec.identity().clone();

        assert!(!store.exists(&id).await.unwrap());
        store.insert(rec).await.unwrap();
        assert!(store.exists(&id).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.get(&id).await.unwrap().unwrap().raw_content, "<html>");
    }

    #[tokio::test]
    async fn test_second_insert_is_duplicate() {
        let store = MemoryStore::new();
        store.insert(record("https://a.com/1", vec![1.0])).await.unwrap();

        let err = store
            .insert(record("https://a.com/1", vec![0.5]))
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::DuplicateIdentity { .. }));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_store_one() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.insert(record("https://a.com/race", vec![1.0, 1.0])).await
            }));
        }

        let mut ok = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let store = MemoryStore::new().with_dimension(3);
        let err = store
            .insert(record("https://a.com/1", vec![1.0, 0.0]))
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::Embedding(_)));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_query_orders_by_similarity() {
        let store = MemoryStore::new();
        store.insert(record("https://a.com/x", vec![1.0, 0.0])).await.unwrap();
        store.insert(record("https://a.com/y", vec![0.0, 1.0])).await.unwrap();
        store.insert(record("https://a.com/xy", vec![1.0, 1.0])).await.unwrap();

        let hits = store.query(&[1.0, 0.1], 2, None).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].posting.apply_url, "https://a.com/x");
        assert_eq!(hits[1].posting.apply_url, "https://a.com/xy");
        assert!(hits[0].similarity >= hits[1].similarity);
    }

    #[tokio::test]
    async fn test_query_empty_store() {
        let store = MemoryStore::new();
        assert!(store.query(&[1.0], 20, None).await.unwrap().is_empty());
    }
}
