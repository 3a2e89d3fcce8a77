//! Text embedding trait.

use async_trait::async_trait;

use crate::error::Result;

/// Turns text into a fixed-size vector.
///
/// The same embedder must be used for ingestion and for search so that
/// query and record vectors live in one space.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Vector length produced by this embedder.
    fn dimension(&self) -> usize;

    /// Short name for logs.
    fn name(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, preserving order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}
