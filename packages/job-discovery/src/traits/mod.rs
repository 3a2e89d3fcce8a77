//! Collaborator traits.
//!
//! Everything the pipeline talks to (storage, embeddings, the web, and the
//! LLM oracles) sits behind one of these so it can be swapped or mocked.

pub mod embedder;
pub mod fetcher;
pub mod oracle;
pub mod searcher;
pub mod store;
