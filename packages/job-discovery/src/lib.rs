//! Job Discovery & Ranking Library
//!
//! Turns discovered job pages into uniquely identified, embedded records and
//! ranks them against a user profile.
//!
//! # Flows
//!
//! **Ingest** - URL → fetch → extract → identity → store. Each posting
//! identity is stored at most once, however often or concurrently the same
//! URL is ingested. Per-URL failures are counted, never fatal.
//!
//! **Search** - profile + rejection memory → query → retrieval → rejection
//! filter → scoring oracle → ranking → [`SearchResult`] envelope. The envelope
//! is always well formed, including when nothing survives.
//!
//! # Usage
//!
//! ```rust,ignore
//! use job_discovery::{HashEmbedder, MemoryStore, Pipeline, Profile, RejectionMemory};
//! use job_discovery::testing::{MockExtractionOracle, MockScoringOracle};
//!
//! let pipeline = Pipeline::new(
//!     MemoryStore::new(),
//!     HashEmbedder::default(),
//!     MockExtractionOracle::new(),
//!     MockScoringOracle::new(),
//! );
//!
//! pipeline.ingest_urls(&urls).await;
//! let result = pipeline.search(&profile, &RejectionMemory::new()).await;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Collaborator abstractions (store, embedder, fetcher, oracles, web search)
//! - [`types`] - Postings, profiles, verdicts, configuration
//! - [`pipeline`] - The ingest and search stages and the [`Pipeline`] orchestrator
//! - [`stores`] - Storage implementations (MemoryStore, SqliteStore)
//! - [`embedders`] / [`fetchers`] - Offline embedder and HTTP fetcher
//! - [`ai`] - Prompts and OpenAI-backed oracles
//! - [`testing`] - Mock implementations for testing

pub mod ai;
pub mod embedders;
pub mod error;
pub mod fetchers;
pub mod identity;
pub mod pipeline;
pub mod security;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{DiscoveryError, FetchError, FetchResult, Result};
pub use identity::PostingId;
pub use traits::{
    embedder::Embedder,
    fetcher::{FetchedPage, Fetcher},
    oracle::{ExtractionOracle, ScoringOracle},
    searcher::{MockWebSearcher, TavilyWebSearcher, WebSearcher, DEFAULT_DISCOVERY_QUERY},
    store::{cosine_similarity, PostingRecord, PostingStore, ScoredPosting},
};
pub use types::{
    EmbedSource, ExtractedFields, IngestConfig, JobPreferences, OracleVerdict, Posting, Profile,
    RejectionMemory, ScoredCandidate, SearchConfig, SearchResult, Verdict, PASS_THRESHOLD,
};

// Re-export pipeline components
pub use pipeline::{
    filter::filter_rejected,
    ingest::{FailureStage, IngestOutcome, IngestReport, UrlOutcome},
    query::{compose_query, FALLBACK_QUERY},
    rank::rank,
    score::{is_inconsistent, ScoringOutcome},
    search::Pipeline,
    IdentityLocks,
};

pub use embedders::HashEmbedder;
pub use fetchers::HttpFetcher;
pub use security::SecretString;
pub use stores::MemoryStore;

#[cfg(feature = "sqlite")]
pub use stores::SqliteStore;

#[cfg(feature = "openai")]
pub use ai::{OpenAIEmbedder, OpenAIExtractor, OpenAIScorer};

// Re-export for downstream cancellation
pub use tokio_util::sync::CancellationToken;
