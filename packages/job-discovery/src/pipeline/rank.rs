//! Final ranking.

use crate::types::result::ScoredCandidate;

/// Keep the `k` highest scores.
///
/// Stable: equal scores keep their input order, so identical inputs always
/// rank identically.
pub fn rank(mut candidates: Vec<ScoredCandidate>, k: usize) -> Vec<ScoredCandidate> {
    candidates.sort_by(|a, b| b.score.cmp(&a.score));
    candidates.truncate(k);
    candidates
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::identity::PostingId;
    use crate::types::{posting::Posting, result::Verdict};

    fn scored(id: &str, score: u8) -> ScoredCandidate {
        ScoredCandidate::new(
            Posting {
                identity: PostingId::from(id),
                ..Default::default()
            },
            Verdict {
                pass: true,
                score,
                rationale: String::new(),
            },
        )
    }

    #[test]
    fn test_ties_keep_input_order() {
        let ranked = rank(vec![scored("a", 90), scored("b", 60), scored("c", 90)], 2);
        let ids: Vec<_> = ranked.iter().map(|c| c.posting.identity.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_k_larger_than_input() {
        let ranked = rank(vec![scored("a", 10), scored("b", 70)], 10);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].posting.identity.as_str(), "b");
    }

    #[test]
    fn test_zero_k_is_empty() {
        assert!(rank(vec![scored("a", 10)], 0).is_empty());
    }

    proptest! {
        #[test]
        fn prop_rank_is_bounded_sorted_and_deterministic(
            scores in prop::collection::vec(0u8..=100, 0..40),
            k in 0usize..50,
        ) {
            let input: Vec<_> = scores
                .iter()
                .enumerate()
                .map(|(i, s)| scored(&format!("{:04}", i), *s))
                .collect();

            let first = rank(input.clone(), k);
            let second = rank(input.clone(), k);

            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.len(), k.min(input.len()));
            for pair in first.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
                if pair[0].score == pair[1].score {
                    prop_assert!(pair[0].posting.identity < pair[1].posting.identity);
                }
            }
        }
    }
}
