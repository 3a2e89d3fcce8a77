//! Scoring fan-out and the pass/score consistency check.
//!
//! Oracle calls run concurrently up to `scoring_concurrency`, each under
//! `scoring_timeout`. Verdicts are matched back to candidates by identity.
//! A failed, timed-out or out-of-range call drops only its own candidate.
//! Cancellation or the overall deadline stops waiting; candidates without a
//! verdict by then are excluded.

use std::collections::HashMap;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{DiscoveryError, Result};
use crate::identity::PostingId;
use crate::traits::oracle::ScoringOracle;
use crate::types::{
    config::SearchConfig,
    posting::Posting,
    profile::Profile,
    rejection::RejectionMemory,
    result::{ScoredCandidate, Verdict, PASS_THRESHOLD},
};

/// Rationale keywords that justify `pass = false` despite a passing score.
pub const HARD_MISMATCH_KEYWORDS: &[&str] = &[
    "location",
    "remote",
    "on-site",
    "onsite",
    "role",
    "industry",
    "rejected",
    "mismatch",
];

/// Result of scoring one filtered candidate list.
#[derive(Debug, Default)]
pub struct ScoringOutcome {
    /// Candidates with `pass == true`, in input order
    pub passed: Vec<ScoredCandidate>,
    /// Verdicts received, pass or fail
    pub num_scored: usize,
    pub num_inconsistent: usize,
    /// Calls that errored, timed out or returned an invalid score
    pub num_failed: usize,
    /// Stopped by cancellation or deadline before every verdict arrived
    pub cancelled: bool,
}

/// Whether the rationale names a hard preference conflict.
pub fn is_hard_mismatch(rationale: &str) -> bool {
    let lowered = rationale.to_lowercase();
    HARD_MISMATCH_KEYWORDS.iter().any(|k| lowered.contains(k))
}

/// Whether `pass` and `score` disagree.
///
/// `pass` with a score under the threshold is always inconsistent. A
/// failing verdict with a passing score is fine only when the rationale
/// names a hard mismatch.
pub fn is_inconsistent(verdict: &Verdict) -> bool {
    if verdict.pass {
        verdict.score < PASS_THRESHOLD
    } else {
        verdict.score >= PASS_THRESHOLD && !is_hard_mismatch(&verdict.rationale)
    }
}

async fn score_one(
    oracle: &dyn ScoringOracle,
    posting: &Posting,
    profile: &Profile,
    rejections: &RejectionMemory,
    config: &SearchConfig,
) -> Result<Verdict> {
    let call = oracle.score(posting, profile, rejections);
    let verdict = tokio::time::timeout(config.scoring_timeout, call)
        .await
        .map_err(|_| {
            DiscoveryError::oracle(format!(
                "scoring timed out after {}ms",
                config.scoring_timeout.as_millis()
            ))
        })??;
    verdict.validate()
}

/// Score every candidate and keep the ones the oracle passes.
pub async fn score_candidates(
    candidates: Vec<Posting>,
    profile: &Profile,
    rejections: &RejectionMemory,
    oracle: &dyn ScoringOracle,
    config: &SearchConfig,
    cancel: &CancellationToken,
) -> ScoringOutcome {
    let mut outcome = ScoringOutcome::default();
    if candidates.is_empty() {
        return outcome;
    }

    let mut verdicts: HashMap<PostingId, Verdict> = HashMap::with_capacity(candidates.len());
    {
        let mut results = stream::iter(candidates.iter().cloned())
            .map(move |posting| async move {
                let result = score_one(oracle, &posting, profile, rejections, config).await;
                (posting.identity, result)
            })
            .buffer_unordered(config.scoring_concurrency.max(1));

        let deadline = async {
            match config.search_deadline {
                Some(budget) => tokio::time::sleep(budget).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    outcome.cancelled = true;
                    break;
                }
                _ = &mut deadline => {
                    outcome.cancelled = true;
                    break;
                }
                next = results.next() => match next {
                    Some((identity, Ok(verdict))) => {
                        debug!(
                            identity = %identity,
                            pass = verdict.pass,
                            score = verdict.score,
                            "Scored candidate"
                        );
                        verdicts.insert(identity, verdict);
                    }
                    Some((identity, Err(e))) => {
                        warn!(identity = %identity, error = %e, "Scoring failed, dropping candidate");
                        outcome.num_failed += 1;
                    }
                    None => break,
                },
            }
        }
    }

    if outcome.cancelled {
        warn!(
            scored = verdicts.len(),
            total = candidates.len(),
            "Scoring stopped early, ranking completed verdicts only"
        );
    }

    outcome.num_scored = verdicts.len();
    for posting in candidates {
        let Some(verdict) = verdicts.remove(&posting.identity) else {
            continue;
        };

        let inconsistent = is_inconsistent(&verdict);
        if inconsistent {
            outcome.num_inconsistent += 1;
            warn!(
                identity = %posting.identity,
                pass = verdict.pass,
                score = verdict.score,
                rationale = %verdict.rationale,
                "Score inconsistent with pass, trusting pass"
            );
        }

        if verdict.pass {
            let mut candidate = ScoredCandidate::new(posting, verdict);
            candidate.inconsistent = inconsistent;
            outcome.passed.push(candidate);
        }
    }

    info!(
        scored = outcome.num_scored,
        passed = outcome.passed.len(),
        failed = outcome.num_failed,
        inconsistent = outcome.num_inconsistent,
        cancelled = outcome.cancelled,
        "Scoring complete"
    );
    outcome
}
