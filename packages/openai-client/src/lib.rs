//! Minimal OpenAI REST API client
//!
//! Chat completions (plain, JSON mode, strict structured output) and
//! embeddings. Every request goes through a [`RetryPolicy`] that retries
//! rate limits, server errors and network failures, never client errors.
//!
//! # Example
//!
//! ```rust,ignore
//! use openai_client::{OpenAIClient, ChatRequest, Message};
//!
//! let client = OpenAIClient::from_env()?;
//!
//! let response = client.chat_completion(
//!     ChatRequest::new("gpt-4o-mini").message(Message::user("Hello!")),
//! ).await?;
//!
//! let vectors = client
//!     .create_embeddings(&["senior rust engineer".into()], "text-embedding-3-small")
//!     .await?;
//! ```

pub mod error;
pub mod retry;
pub mod schema;
pub mod types;

pub use error::{OpenAIError, Result};
pub use retry::RetryPolicy;
pub use schema::StructuredOutput;
pub use types::*;

use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI API client.
#[derive(Clone)]
pub struct OpenAIClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    retry: RetryPolicy,
}

impl std::fmt::Debug for OpenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIClient")
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl OpenAIClient {
    /// Create a new OpenAI client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    /// Create from environment variable `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| OpenAIError::Config("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set a per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OpenAIError::Config(e.to_string()))?;
        Ok(self)
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Chat completion.
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        let start = std::time::Instant::now();

        let raw: types::ChatResponseRaw = self
            .retry
            .run("chat_completion", || self.post_json("chat/completions", &request))
            .await?;

        let content = raw
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| OpenAIError::Parse("No content in OpenAI response".into()))?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis() as u64,
            total_tokens = raw.usage.as_ref().map(|u| u.total_tokens),
            "OpenAI chat completion"
        );

        Ok(ChatResponse {
            content,
            usage: raw.usage,
        })
    }

    /// Type-safe structured output.
    ///
    /// The schema is generated from `T` and sent in strict mode; the reply is
    /// deserialized into `T`.
    pub async fn extract<T: StructuredOutput>(
        &self,
        model: &str,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Result<T> {
        let request = types::structured_request(
            model,
            system_prompt,
            user_prompt,
            T::type_name(),
            T::openai_schema(),
        );
        let response = self.chat_completion(request).await?;

        serde_json::from_str(strip_code_blocks(&response.content))
            .map_err(|e| OpenAIError::Parse(format!("Failed to deserialize response: {}", e)))
    }

    /// Create one embedding per input, in input order.
    pub async fn create_embeddings(&self, inputs: &[String], model: &str) -> Result<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let request = types::EmbeddingRequest {
            model,
            input: inputs,
        };

        let response: types::EmbeddingResponse = self
            .retry
            .run("create_embeddings", || self.post_json("embeddings", &request))
            .await?;

        if response.data.len() != inputs.len() {
            return Err(OpenAIError::Parse(format!(
                "Expected {} embeddings, got {}",
                inputs.len(),
                response.data.len()
            )));
        }

        let mut data = response.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    /// Create embedding for a single text.
    pub async fn create_embedding(&self, text: &str, model: &str) -> Result<Vec<f32>> {
        self.create_embeddings(&[text.to_string()], model)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| OpenAIError::Parse("No embedding from OpenAI".into()))
    }

    /// One POST attempt; status and transport errors are classified for retry.
    async fn post_json<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R> {
        let response = self
            .http_client
            .post(format!("{}/{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(path, error = %e, "OpenAI request failed");
                OpenAIError::from_reqwest(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(path, status = %status, error = %message, "OpenAI API error");
            return Err(OpenAIError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| OpenAIError::Parse(e.to_string()))
    }
}
