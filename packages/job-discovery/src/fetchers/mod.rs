//! Fetcher implementations.

pub mod http;

pub use http::{HttpFetcher, DEFAULT_USER_AGENT};
