//! SQLite posting store.
//!
//! A file-based backend for single-machine use. The primary key on
//! `identity` makes insert-if-absent atomic, whichever process writes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use tracing::debug;

use crate::error::{DiscoveryError, Result};
use crate::identity::PostingId;
use crate::traits::store::{
    cosine_similarity, rank_by_similarity, PostingRecord, PostingStore, ScoredPosting,
};
use crate::types::posting::Posting;

/// SQLite-based posting store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (and create if needed) a store.
    ///
    /// # Example URLs
    /// - `sqlite::memory:` - In-memory database (ephemeral)
    /// - `sqlite://jobpilot.db?mode=rwc` - Create if not exists
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(map_sqlx_error)?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// In-memory store for tests.
    ///
    /// Single connection, since every sqlite memory connection is its own
    /// database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(map_sqlx_error)?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS postings (
                identity TEXT PRIMARY KEY,
                raw_content TEXT NOT NULL,
                metadata TEXT NOT NULL,
                embedding BLOB NOT NULL,
                stored_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[derive(Debug, FromRow)]
struct PostingRow {
    identity: String,
    raw_content: String,
    metadata: String,
    embedding: Vec<u8>,
    stored_at: String,
}

impl PostingRow {
    fn into_record(self) -> Result<PostingRecord> {
        let mut posting: Posting = serde_json::from_str(&self.metadata)?;
        posting.identity = PostingId::from(self.identity);

        let stored_at = DateTime::parse_from_rfc3339(&self.stored_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| DiscoveryError::store_unavailable(format!("bad stored_at: {}", e)))?;

        Ok(PostingRecord {
            posting,
            raw_content: self.raw_content,
            embedding: decode_embedding(&self.embedding),
            stored_at,
        })
    }
}

fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn map_sqlx_error(e: sqlx::Error) -> DiscoveryError {
    DiscoveryError::StoreUnavailable(Box::new(e))
}

#[async_trait]
impl PostingStore for SqliteStore {
    async fn exists(&self, id: &PostingId) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM postings WHERE identity = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.is_some())
    }

    async fn insert(&self, record: PostingRecord) -> Result<()> {
        if record.embedding.is_empty() {
            return Err(DiscoveryError::Embedding("empty embedding".into()));
        }

        let metadata = serde_json::to_string(&record.posting)?;

        let result = sqlx::query(
            r#"
            INSERT INTO postings (identity, raw_content, metadata, embedding, stored_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.identity().as_str())
        .bind(&record.raw_content)
        .bind(&metadata)
        .bind(encode_embedding(&record.embedding))
        .bind(record.stored_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!(identity = %record.identity(), "Posting row inserted");
                Ok(())
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(DiscoveryError::DuplicateIdentity {
                    identity: record.identity().clone(),
                })
            }
            Err(e) => Err(map_sqlx_error(e)),
        }
    }

    async fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
        min_similarity: Option<f32>,
    ) -> Result<Vec<ScoredPosting>> {
        let rows: Vec<(String, String, Vec<u8>)> =
            sqlx::query_as("SELECT identity, metadata, embedding FROM postings")
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        let mut hits = Vec::with_capacity(rows.len());
        for (identity, metadata, bytes) in rows {
            let mut posting: Posting = serde_json::from_str(&metadata)?;
            posting.identity = PostingId::from(identity);
            let similarity = cosine_similarity(embedding, &decode_embedding(&bytes));
            hits.push(ScoredPosting {
                posting,
                similarity,
            });
        }

        Ok(rank_by_similarity(hits, top_k, min_similarity))
    }

    async fn count(&self) -> Result<usize> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM postings")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(count.max(0) as usize)
    }

    async fn get(&self, id: &PostingId) -> Result<Option<PostingRecord>> {
        let row: Option<PostingRow> = sqlx::query_as(
            "SELECT identity, raw_content, metadata, embedding, stored_at FROM postings WHERE identity = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(PostingRow::into_record).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> SqliteStore {
        SqliteStore::in_memory().await.unwrap()
    }

    fn record(url: &str, embedding: Vec<f32>) -> PostingRecord {
        let posting = Posting {
            identity: PostingId::from_url(url),
            title: "Platform Engineer".into(),
            skills_mentioned: vec!["Rust".into()],
            apply_url: url.to_string(),
            ..Default::default()
        };
        PostingRecord::new(posting, "<p>job</p>", embedding)
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = test_store().await;
        let rec = record("https://a.com/1", vec![0.1, 0.2, 0.3, 0.4]);
        let id = rec.identity().clone();

        store.insert(rec.clone()).await.unwrap();
        assert!(store.exists(&id).await.unwrap());

        let loaded = store.get(&id).await.unwrap().unwrap();
        assert_eq!(loaded.posting, rec.posting);
        assert_eq!(loaded.embedding, rec.embedding);
        assert_eq!(loaded.raw_content, "<p>job</p>");
    }

    #[tokio::test]
    async fn test_duplicate_maps_to_duplicate_identity() {
        let store = test_store().await;
        store.insert(record("https://a.com/1", vec![1.0])).await.unwrap();

        let err = store
            .insert(record("https://a.com/1", vec![1.0]))
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::DuplicateIdentity { .. }));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_query_similarity_order() {
        let store = test_store().await;
        store.insert(record("https://a.com/x", vec![1.0, 0.0])).await.unwrap();
        store.insert(record("https://a.com/y", vec![0.0, 1.0])).await.unwrap();

        let hits = store.query(&[0.1, 1.0], 5, None).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].posting.apply_url, "https://a.com/y");

        let floored = store.query(&[0.1, 1.0], 5, Some(0.5)).await.unwrap();
        assert_eq!(floored.len(), 1);
    }

    #[test]
    fn test_embedding_codec() {
        let v = vec![0.5f32, -1.25, 3.0];
        assert_eq!(decode_embedding(&encode_embedding(&v)), v);
    }
}
