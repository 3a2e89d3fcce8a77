//! Core data types for discovery and ranking.

pub mod config;
pub(crate) mod lenient;
pub mod posting;
pub mod profile;
pub mod rejection;
pub mod result;

pub use config::{EmbedSource, IngestConfig, SearchConfig, MAX_RETRIEVE_TOP_K};
pub use posting::{ExtractedFields, Posting};
pub use profile::{Contact, Education, Experience, JobPreferences, Profile, DEFAULT_JOBS_WANTED};
pub use rejection::RejectionMemory;
pub use result::{OracleVerdict, ScoredCandidate, SearchResult, Verdict, PASS_THRESHOLD};
