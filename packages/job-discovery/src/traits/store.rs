//! Content store trait: at-most-one record per posting identity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::identity::PostingId;
use crate::types::posting::Posting;

/// One stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostingRecord {
    pub posting: Posting,

    /// The fetched body the posting was extracted from
    pub raw_content: String,

    pub embedding: Vec<f32>,

    pub stored_at: DateTime<Utc>,
}

impl PostingRecord {
    pub fn new(posting: Posting, raw_content: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            posting,
            raw_content: raw_content.into(),
            embedding,
            stored_at: Utc::now(),
        }
    }

    pub fn identity(&self) -> &PostingId {
        &self.posting.identity
    }
}

/// A retrieved posting with its similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPosting {
    pub posting: Posting,
    pub similarity: f32,
}

/// Persistent, searchable collection of postings.
///
/// Records are never updated or deleted.
#[async_trait]
pub trait PostingStore: Send + Sync {
    /// Whether a record with this identity exists.
    async fn exists(&self, id: &PostingId) -> Result<bool>;

    /// Insert if absent.
    ///
    /// Must be atomic with respect to concurrent inserts of the same
    /// identity: exactly one caller succeeds, the others get
    /// `DiscoveryError::DuplicateIdentity`.
    async fn insert(&self, record: PostingRecord) -> Result<()>;

    /// Nearest records by cosine similarity.
    ///
    /// At most `top_k` results, most similar first, ties by identity
    /// ascending. Results below `min_similarity` are dropped when it is set.
    async fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
        min_similarity: Option<f32>,
    ) -> Result<Vec<ScoredPosting>>;

    /// Number of stored records.
    async fn count(&self) -> Result<usize>;

    /// Fetch one record.
    async fn get(&self, id: &PostingId) -> Result<Option<PostingRecord>>;
}

/// Cosine similarity between two vectors.
///
/// Zero for mismatched lengths, empty input or a zero vector.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Order, floor and truncate similarity hits the way every store must.
pub fn rank_by_similarity(
    mut hits: Vec<ScoredPosting>,
    top_k: usize,
    min_similarity: Option<f32>,
) -> Vec<ScoredPosting> {
    if let Some(floor) = min_similarity {
        hits.retain(|h| h.similarity >= floor);
    }
    hits.retain(|h| !h.similarity.is_nan());

    hits.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then_with(|| a.posting.identity.cmp(&b.posting.identity))
    });
    hits.truncate(top_k);
    hits
}
