//! OpenAI-backed oracles and embedder.
//!
//! # Example
//!
//! ```rust,ignore
//! use job_discovery::ai::{OpenAIEmbedder, OpenAIExtractor, OpenAIScorer};
//! use openai_client::OpenAIClient;
//!
//! let client = OpenAIClient::from_env()?;
//! let extractor = OpenAIExtractor::new(client.clone(), "gpt-4o-mini");
//! let scorer = OpenAIScorer::new(client.clone(), "gpt-4o-mini");
//! let embedder = OpenAIEmbedder::new(client, "text-embedding-3-small");
//! ```

use async_trait::async_trait;
use openai_client::{strip_code_blocks, ChatRequest, Message, OpenAIClient, OpenAIError};
use tracing::debug;

use crate::ai::prompts::{
    extraction_user_prompt, scoring_user_prompt, EXTRACTION_SYSTEM_PROMPT, SCORING_SYSTEM_PROMPT,
};
use crate::error::{DiscoveryError, Result};
use crate::traits::{
    embedder::Embedder,
    oracle::{ExtractionOracle, ScoringOracle},
};
use crate::types::{
    posting::{ExtractedFields, Posting},
    profile::Profile,
    rejection::RejectionMemory,
    result::OracleVerdict,
};

fn oracle_error(e: OpenAIError) -> DiscoveryError {
    DiscoveryError::OracleFailure(Box::new(e))
}

/// Extraction oracle using JSON-object mode and lenient parsing.
#[derive(Clone)]
pub struct OpenAIExtractor {
    client: OpenAIClient,
    model: String,
}

impl OpenAIExtractor {
    pub fn new(client: OpenAIClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl ExtractionOracle for OpenAIExtractor {
    async fn extract(&self, url: &str, content: &str) -> Result<ExtractedFields> {
        let request = ChatRequest::new(&self.model)
            .message(Message::system(EXTRACTION_SYSTEM_PROMPT))
            .message(Message::user(extraction_user_prompt(url, content)))
            .temperature(0.0)
            .json_mode();

        let response = self.client.chat_completion(request).await.map_err(oracle_error)?;
        let value: serde_json::Value = serde_json::from_str(strip_code_blocks(&response.content))
            .map_err(|e| DiscoveryError::oracle(format!("extraction reply is not JSON: {}", e)))?;

        debug!(url = %url, model = %self.model, "Extraction oracle replied");
        Ok(ExtractedFields::from_value(&value))
    }
}

/// Scoring oracle using strict structured output.
#[derive(Clone)]
pub struct OpenAIScorer {
    client: OpenAIClient,
    model: String,
}

impl OpenAIScorer {
    pub fn new(client: OpenAIClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl ScoringOracle for OpenAIScorer {
    async fn score(
        &self,
        posting: &Posting,
        profile: &Profile,
        rejections: &RejectionMemory,
    ) -> Result<OracleVerdict> {
        let user = scoring_user_prompt(posting, profile, rejections)?;
        self.client
            .extract::<OracleVerdict>(&self.model, SCORING_SYSTEM_PROMPT, user)
            .await
            .map_err(oracle_error)
    }
}

/// Embedder backed by the embeddings endpoint.
#[derive(Clone)]
pub struct OpenAIEmbedder {
    client: OpenAIClient,
    model: String,
    dimension: usize,
}

impl OpenAIEmbedder {
    /// `text-embedding-3-small` produces 1536 dimensions.
    pub fn new(client: OpenAIClient, model: impl Into<String>) -> Self {
        let model = model.into();
        let dimension = match model.as_str() {
            "text-embedding-3-large" => 3072,
            _ => 1536,
        };
        Self {
            client,
            model,
            dimension,
        }
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = self
            .client
            .create_embedding(text, &self.model)
            .await
            .map_err(|e| DiscoveryError::Embedding(e.to_string()))?;
        check_dimension(embedding, self.dimension)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.client
            .create_embeddings(texts, &self.model)
            .await
            .map_err(|e| DiscoveryError::Embedding(e.to_string()))?
            .into_iter()
            .map(|e| check_dimension(e, self.dimension))
            .collect()
    }
}

fn check_dimension(embedding: Vec<f32>, expected: usize) -> Result<Vec<f32>> {
    if embedding.len() != expected {
        return Err(DiscoveryError::Embedding(format!(
            "expected dimension {}, got {}",
            expected,
            embedding.len()
        )));
    }
    Ok(embedding)
}
