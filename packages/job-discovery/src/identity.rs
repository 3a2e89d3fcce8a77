//! Posting identity derived from the canonical apply URL.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Number of hex characters kept from the SHA-256 digest.
pub const IDENTITY_LEN: usize = 16;

/// Stable primary key of a posting.
///
/// Built with [`PostingId::from_url`] inside the library. Identities coming
/// from outside (rejection memory, stored rows) are taken verbatim.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct PostingId(String);

impl PostingId {
    /// First [`IDENTITY_LEN`] hex chars of SHA-256 over the URL's UTF-8 bytes.
    ///
    /// The URL is hashed as given; no normalization happens here.
    pub fn from_url(url: &str) -> Self {
        let digest = Sha256::digest(url.as_bytes());
        let mut hex = format!("{:x}", digest);
        hex.truncate(IDENTITY_LEN);
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PostingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PostingId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PostingId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for PostingId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
