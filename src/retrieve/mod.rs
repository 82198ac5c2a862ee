//! Claim retrieval pipeline.
//!
//! A question and an observing entity go in; rendered, in-character
//! knowledge comes out. Stages: semantic candidate search
//! ([`candidates::find_top_claims`]), relation-claim augmentation
//! ([`relations::find_relation_claims`]), deduplication
//! ([`dedup_claims`]), and reference-chain assembly
//! ([`chain::build_chains`]). Every stage reads the graph through the
//! typed [`crate::graph::GraphStore`] adapter; nothing here writes.

pub mod candidates;
pub mod chain;
pub mod relations;

pub use candidates::find_top_claims;
pub use chain::build_chains;
pub use relations::find_relation_claims;

use std::collections::HashSet;

use crate::error::RetrieveError;
use crate::model::{ClaimId, ClaimKind, Veracity};

/// Result type for retrieval operations.
pub type RetrieveResult<T> = std::result::Result<T, RetrieveError>;

/// A claim surfaced by candidate search or relation augmentation.
#[derive(Debug, Clone)]
pub struct CandidateClaim {
    pub id: ClaimId,
    pub content: String,
    pub veracity: Veracity,
    pub kind: Option<ClaimKind>,
    /// Semantic similarity to the question. Relation-augmented candidates
    /// carry 0.0: they were found by structural overlap, not semantic rank.
    pub score: f32,
}

/// One rendered reference chain, ready for prompt assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainResult {
    /// Concatenated rendered text of every claim in the chain, dependencies
    /// first.
    pub text: String,
    /// Veracity of the originating claim.
    pub veracity: Veracity,
    /// Whether any claim in the chain is relation-tagged.
    pub is_relation: bool,
    /// Number of claims in the chain.
    pub chain_length: usize,
}

/// Everything the dialogue layer needs for one question.
#[derive(Debug, Clone)]
pub struct RetrievalOutput {
    /// Chains where no claim is relation-tagged, in production order.
    pub knowledge_chains: Vec<ChainResult>,
    /// Chains containing at least one relation-tagged claim.
    pub relation_chains: Vec<ChainResult>,
    /// The assembled prompt.
    pub prompt: String,
}

/// Merge candidate lists, keeping the first occurrence of each claim id.
pub fn dedup_claims(claims: Vec<CandidateClaim>) -> Vec<CandidateClaim> {
    let mut seen = HashSet::new();
    claims.into_iter().filter(|c| seen.insert(c.id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: u64, score: f32) -> CandidateClaim {
        CandidateClaim {
            id: ClaimId::new(id).unwrap(),
            content: format!("claim {id}"),
            veracity: Veracity::Truth,
            kind: None,
            score,
        }
    }

    #[test]
    fn dedup_keeps_first_seen_order() {
        let merged = dedup_claims(vec![
            candidate(1, 0.9),
            candidate(2, 0.8),
            candidate(1, 0.0),
            candidate(3, 0.0),
            candidate(2, 0.0),
        ]);
        let ids: Vec<u64> = merged.iter().map(|c| c.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        // First occurrence wins, so claim 1 keeps its semantic score.
        assert_eq!(merged[0].score, 0.9);
    }

    #[test]
    fn dedup_length_equals_distinct_ids() {
        let lists = vec![candidate(5, 0.5), candidate(5, 0.4), candidate(5, 0.3)];
        assert_eq!(dedup_claims(lists).len(), 1);
    }

    #[test]
    fn dedup_of_empty_list_is_empty() {
        assert!(dedup_claims(Vec::new()).is_empty());
    }
}
