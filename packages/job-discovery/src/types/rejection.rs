//! Identities the user has declined.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::identity::PostingId;

/// Append-only set of rejected posting identities.
///
/// The pipeline only reads it. Deserializes from a list whose items are
/// either identity strings or objects carrying a `job_id` key, so a list of
/// previously rejected postings can be fed back directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RejectionMemory {
    ids: BTreeSet<PostingId>,
}

impl RejectionMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rejection. Returns false if it was already known.
    pub fn insert(&mut self, id: impl Into<PostingId>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn contains(&self, id: &PostingId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PostingId> {
        self.ids.iter()
    }
}

impl<I: Into<PostingId>> FromIterator<I> for RejectionMemory {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RejectionEntry {
    Id(PostingId),
    Posting { job_id: PostingId },
}

impl<'de> Deserialize<'de> for RejectionMemory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<RejectionEntry>::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .map(|entry| match entry {
                RejectionEntry::Id(id) | RejectionEntry::Posting { job_id: id } => id,
            })
            .filter(|id| !id.is_empty())
            .collect())
    }
}
