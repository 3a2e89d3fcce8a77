//! Rejection filter.

use crate::traits::store::ScoredPosting;
use crate::types::rejection::RejectionMemory;

/// Drop candidates the user already rejected, keeping relative order.
///
/// Total and pure: the output is always a subsequence of the input.
pub fn filter_rejected(
    candidates: Vec<ScoredPosting>,
    rejections: &RejectionMemory,
) -> Vec<ScoredPosting> {
    if rejections.is_empty() {
        return candidates;
    }
    candidates
        .into_iter()
        .filter(|c| !rejections.contains(&c.posting.identity))
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::identity::PostingId;
    use crate::types::posting::Posting;

    fn candidate(id: &str) -> ScoredPosting {
        ScoredPosting {
            posting: Posting {
                identity: PostingId::from(id),
                ..Default::default()
            },
            similarity: 0.5,
        }
    }

    fn ids(candidates: &[ScoredPosting]) -> Vec<String> {
        candidates
            .iter()
            .map(|c| c.posting.identity.to_string())
            .collect()
    }

    #[test]
    fn test_removes_rejected_preserving_order() {
        let rejections: RejectionMemory = ["b", "d"].into_iter().collect();
        let out = filter_rejected(
            vec![candidate("a"), candidate("b"), candidate("c"), candidate("d")],
            &rejections,
        );
        assert_eq!(ids(&out), vec!["a", "c"]);
    }

    #[test]
    fn test_empty_memory_is_identity() {
        let out = filter_rejected(vec![candidate("a"), candidate("b")], &RejectionMemory::new());
        assert_eq!(ids(&out), vec!["a", "b"]);
    }

    proptest! {
        #[test]
        fn prop_output_is_subsequence_without_rejected(
            input in prop::collection::vec("[a-e]", 0..30),
            rejected in prop::collection::vec("[a-e]", 0..5),
        ) {
            let rejections: RejectionMemory = rejected.iter().map(String::as_str).collect();
            let candidates: Vec<_> = input.iter().map(|id| candidate(id)).collect();

            let out = ids(&filter_rejected(candidates, &rejections));

            prop_assert!(out.len() <= input.len());
            for id in &out {
                prop_assert!(!rejected.contains(id));
            }
            let expected: Vec<_> = input.iter().filter(|id| !rejected.contains(id)).cloned().collect();
            prop_assert_eq!(out, expected);
        }
    }
}
