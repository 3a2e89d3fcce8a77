//! The two end-to-end flows and their stages.
//!
//! Ingest: URL → fetch → extract → identity → store (at most once).
//! Search: profile → query → retrieve → reject filter → score → rank.

pub mod filter;
pub mod ingest;
pub mod query;
pub mod rank;
pub mod retrieve;
pub mod score;
pub mod search;

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::OwnedMutexGuard;
use tracing::warn;

use crate::error::Result;
use crate::identity::PostingId;

/// Run a store operation, retrying only while it reports `StoreUnavailable`.
///
/// `attempts` is the total number of tries (at least one). The delay
/// doubles after each failed try.
pub(crate) async fn with_store_retry<T, F, Fut>(
    operation: &str,
    attempts: u32,
    backoff: Duration,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = attempts.max(1);
    let mut delay = backoff;
    let mut attempt = 1;

    loop {
        match op().await {
            Err(e) if e.is_store_unavailable() && attempt < attempts => {
                warn!(
                    operation,
                    attempt,
                    max_attempts = attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Store unavailable, retrying"
                );
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// Per-identity async locks.
///
/// Serializes the exists → insert sequence for one identity inside this
/// process. Stores still enforce uniqueness for writers in other processes.
#[derive(Default)]
pub struct IdentityLocks {
    locks: Mutex<HashMap<PostingId, Arc<tokio::sync::Mutex<()>>>>,
}

impl IdentityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`.
    pub async fn lock(&self, id: &PostingId) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .lock()
            .unwrap()
            .entry(id.clone())
            .or_default()
            .clone();
        lock.lock_owned().await
    }

    /// Drop locks nobody holds or waits on.
    pub fn prune(&self) {
        self.locks
            .lock()
            .unwrap()
            .retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
