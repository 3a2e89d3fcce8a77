//! External oracles: field extraction and candidate scoring.
//!
//! Both are typically backed by an LLM. The pipeline treats their output
//! as untrusted: extraction fields are backfilled and scoring verdicts are
//! range-checked and consistency-checked before use.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    posting::{ExtractedFields, Posting},
    profile::Profile,
    rejection::RejectionMemory,
    result::OracleVerdict,
};

/// Extracts posting fields from raw page content.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExtractionOracle: Send + Sync {
    /// Pull structured fields out of `content` fetched from `url`.
    ///
    /// Implementations must not invent data; absent fields stay empty.
    async fn extract(&self, url: &str, content: &str) -> Result<ExtractedFields>;
}

/// Judges how well a posting fits a profile.
#[async_trait]
pub trait ScoringOracle: Send + Sync {
    async fn score(
        &self,
        posting: &Posting,
        profile: &Profile,
        rejections: &RejectionMemory,
    ) -> Result<OracleVerdict>;
}

#[async_trait]
impl<T: ExtractionOracle + ?Sized> ExtractionOracle for std::sync::Arc<T> {
    async fn extract(&self, url: &str, content: &str) -> Result<ExtractedFields> {
        (**self).extract(url, content).await
    }
}

#[async_trait]
impl<T: ScoringOracle + ?Sized> ScoringOracle for std::sync::Arc<T> {
    async fn score(
        &self,
        posting: &Posting,
        profile: &Profile,
        rejections: &RejectionMemory,
    ) -> Result<OracleVerdict> {
        (**self).score(posting, profile, rejections).await
    }
}
