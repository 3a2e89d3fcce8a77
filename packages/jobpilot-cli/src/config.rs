use anyhow::{Context, Result};
use dotenvy::dotenv;
use job_discovery::SecretString;
use std::env;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://jobpilot.db?mode=rwc";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub openai_api_key: SecretString,
    pub tavily_api_key: Option<SecretString>,
    pub extraction_model: String,
    pub scoring_model: String,
    pub embedding_model: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("JOBPILOT_DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            openai_api_key: SecretString::from_env("OPENAI_API_KEY")
                .context("OPENAI_API_KEY must be set")?,
            tavily_api_key: SecretString::from_env("TAVILY_API_KEY").ok(),
            extraction_model: env::var("JOBPILOT_EXTRACTION_MODEL")
                .unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string()),
            scoring_model: env::var("JOBPILOT_SCORING_MODEL")
                .unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string()),
            embedding_model: env::var("JOBPILOT_EMBEDDING_MODEL")
                .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string()),
        })
    }

    /// The Tavily key, required for discovery.
    pub fn require_tavily(&self) -> Result<SecretString> {
        self.tavily_api_key
            .clone()
            .context("TAVILY_API_KEY must be set for discovery")
    }
}
