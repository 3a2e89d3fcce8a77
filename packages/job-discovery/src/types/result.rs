//! Scoring verdicts and the search result envelope.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{DiscoveryError, Result};
use crate::types::posting::Posting;

/// Scores at or above this are a pass unless a hard mismatch applies.
pub const PASS_THRESHOLD: u8 = 60;

/// Raw verdict as produced by a scoring oracle.
///
/// `score` is wide on purpose so out-of-range answers can be detected
/// instead of silently wrapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OracleVerdict {
    /// Whether the posting should be shown to the user
    pub pass: bool,
    /// Match quality from 0 to 100
    pub score: i64,
    /// One or two sentences explaining the score
    pub rationale: String,
}

impl OracleVerdict {
    pub fn new(pass: bool, score: i64, rationale: impl Into<String>) -> Self {
        Self {
            pass,
            score,
            rationale: rationale.into(),
        }
    }

    /// Range-check the score. Out-of-range scores are an oracle failure.
    pub fn validate(self) -> Result<Verdict> {
        let score = u8::try_from(self.score)
            .ok()
            .filter(|s| *s <= 100)
            .ok_or_else(|| {
                DiscoveryError::oracle(format!("score {} outside 0..=100", self.score))
            })?;

        Ok(Verdict {
            pass: self.pass,
            score,
            rationale: self.rationale,
        })
    }
}

/// A range-checked verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub pass: bool,
    pub score: u8,
    pub rationale: String,
}

/// A posting with its verdict attached, alive for one search only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub posting: Posting,
    pub score: u8,
    pub pass: bool,
    pub rationale: String,
    /// Set when `pass` and `score` disagree
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub inconsistent: bool,
}

impl ScoredCandidate {
    pub fn new(posting: Posting, verdict: Verdict) -> Self {
        Self {
            posting,
            score: verdict.score,
            pass: verdict.pass,
            rationale: verdict.rationale,
            inconsistent: false,
        }
    }
}

/// Output of one search invocation.
///
/// Always well formed, including on the zero-result and cancelled paths:
/// `num_after_ranking == jobs.len() <= num_after_filtering <= num_total`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub jobs: Vec<ScoredCandidate>,
    pub num_total: usize,
    pub num_after_filtering: usize,
    /// Candidates the oracle passed, before truncation to K
    pub num_passed: usize,
    /// Candidates whose pass and score disagreed
    pub num_inconsistent: usize,
    pub num_after_ranking: usize,
    pub query_used: String,
    /// Scoring stopped early; `jobs` holds only completed verdicts
    #[serde(default)]
    pub cancelled: bool,
    /// Set when the request failed before retrieval finished
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResult {
    /// Empty envelope for a query that produced nothing.
    pub fn empty(query_used: impl Into<String>) -> Self {
        Self {
            query_used: query_used.into(),
            ..Default::default()
        }
    }

    /// Whether the count chain holds.
    pub fn counts_consistent(&self) -> bool {
        self.num_after_ranking == self.jobs.len()
            && self.num_after_ranking <= self.num_passed
            && self.num_passed <= self.num_after_filtering
            && self.num_after_filtering <= self.num_total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_accepts_bounds() {
        assert_eq!(OracleVerdict::new(true, 100, "").validate().unwrap().score, 100);
        assert_eq!(OracleVerdict::new(false, 0, "").validate().unwrap().score, 0);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        for score in [-1, 101, 255, 1_000] {
            let err = OracleVerdict::new(true, score, "x").validate().unwrap_err();
            assert!(matches!(err, DiscoveryError::OracleFailure(_)), "{}", score);
        }
    }

    #[test]
    fn test_candidate_flattens_posting() {
        let posting = Posting {
            title: "SRE".into(),
            ..Default::default()
        };
        let candidate = ScoredCandidate::new(
            posting,
            Verdict {
                pass: true,
                score: 80,
                rationale: "good fit".into(),
            },
        );

        let value = serde_json::to_value(&candidate).unwrap();
        assert_eq!(value["title"], json!("SRE"));
        assert_eq!(value["score"], json!(80));
        assert_eq!(value["pass"], json!(true));
        assert!(value.get("posting").is_none());
        assert!(value.get("inconsistent").is_none());
    }

    #[test]
    fn test_empty_envelope() {
        let result = SearchResult::empty("rust jobs");
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["jobs"], json!([]));
        assert_eq!(value["num_total"], json!(0));
        assert_eq!(value["num_after_filtering"], json!(0));
        assert_eq!(value["num_after_ranking"], json!(0));
        assert_eq!(value["query_used"], json!("rust jobs"));
        assert!(result.counts_consistent());
    }
}
