//! Candidate retrieval: semantic search scoped to what an entity can know.
//!
//! The access scope (direct beliefs plus group beliefs) is intersected with
//! an over-fetched nearest-neighbor search over all claim embeddings. The
//! over-fetch compensates for the scope filter running after the similarity
//! search rather than before it.

use std::collections::HashSet;

use crate::embed::{ClaimIndex, Embedder};
use crate::graph::GraphStore;
use crate::model::EntityId;

use super::{CandidateClaim, RetrieveResult};

/// Find the top-`top_k` claims most relevant to the question among those the
/// entity can access.
///
/// An empty access scope short-circuits to an empty result without touching
/// the vector index.
pub fn find_top_claims(
    store: &dyn GraphStore,
    index: &ClaimIndex,
    embedder: &dyn Embedder,
    entity: EntityId,
    question: &str,
    top_k: usize,
    overfetch_factor: usize,
) -> RetrieveResult<Vec<CandidateClaim>> {
    let scope: HashSet<_> = store.accessible_claim_ids(entity)?.into_iter().collect();
    if scope.is_empty() {
        tracing::debug!(%entity, "access scope is empty, skipping vector search");
        return Ok(Vec::new());
    }

    let query = embedder.embed_query(question)?;
    let matches = index.search(&query, top_k * overfetch_factor)?;
    tracing::debug!(
        %entity,
        raw = matches.len(),
        scope = scope.len(),
        "vector search complete"
    );

    let mut out = Vec::with_capacity(top_k);
    for m in matches {
        if out.len() == top_k {
            break;
        }
        if !scope.contains(&m.claim) {
            continue;
        }
        let Some(claim) = store.claim(m.claim)? else {
            // Stale index point for a deleted claim; scope should have
            // caught this already.
            tracing::warn!(claim = %m.claim, "index hit for a claim missing from the store");
            continue;
        };
        out.push(CandidateClaim {
            id: claim.id,
            content: claim.content,
            veracity: claim.veracity,
            kind: claim.kind,
            score: m.score,
        });
    }
    Ok(out)
}
