//! Embedder implementations.
//!
//! The OpenAI embedder lives in `ai` behind the `openai` feature.

pub mod hash;

pub use hash::{HashEmbedder, DEFAULT_HASH_DIMENSION};
