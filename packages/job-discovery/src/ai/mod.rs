//! LLM-backed collaborator implementations.
//!
//! Prompts are always built; the OpenAI implementations need the `openai`
//! feature.

pub mod prompts;

#[cfg(feature = "openai")]
mod openai;

#[cfg(feature = "openai")]
pub use openai::{OpenAIEmbedder, OpenAIExtractor, OpenAIScorer};
