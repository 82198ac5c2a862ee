//! Reference-chain assembly.
//!
//! Each candidate claim is expanded into its reference chain: the claims
//! reachable by following outgoing reference edges, bounded by a maximum
//! depth so cycles cannot loop forever. Chains are ordered deepest-first so
//! a claim's dependencies are rendered before the claim itself. Candidates
//! that already appear inside another candidate's chain are suppressed as
//! top-level chains, and a claim placed into any finalized chain leaves the
//! pool for the rest of the pass.

use std::collections::{HashMap, HashSet, VecDeque};

use rayon::prelude::*;

use crate::graph::GraphStore;
use crate::model::{Claim, ClaimId, EntityId, Knowledge};
use crate::render::render_claim;

use super::{CandidateClaim, ChainResult, RetrieveResult};

/// A claim in a reference chain, with the observer's resolved weights.
#[derive(Debug, Clone)]
pub struct ChainNode {
    pub claim: Claim,
    /// Shortest hop count from the chain's originating claim.
    pub depth: usize,
    /// The observer's belief/stance toward this claim: direct edge if one
    /// exists, otherwise inherited from the first group that holds one.
    pub knowledge: Option<Knowledge>,
}

/// Compute the reference chain for one claim, deepest-first.
///
/// Breadth-first over outgoing claim references, visiting each claim at most
/// once and stopping at `max_depth` hops. A cyclic reference graph
/// terminates because visited claims are never re-queued.
pub fn reference_chain(
    store: &dyn GraphStore,
    observer: EntityId,
    groups: &[EntityId],
    start: ClaimId,
    max_depth: usize,
) -> RetrieveResult<Vec<ChainNode>> {
    let mut visited = HashSet::from([start]);
    let mut discovered = vec![(start, 0usize)];
    let mut queue = VecDeque::from([(start, 0usize)]);

    while let Some((claim, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        for next in store.claim_references_of(claim)? {
            if visited.insert(next) {
                discovered.push((next, depth + 1));
                queue.push_back((next, depth + 1));
            }
        }
    }

    // Deepest first; discovery order breaks ties deterministically.
    discovered.sort_by(|a, b| b.1.cmp(&a.1));

    let mut chain = Vec::with_capacity(discovered.len());
    for (id, depth) in discovered {
        let Some(claim) = store.claim(id)? else {
            continue;
        };
        let knowledge = resolve_knowledge(store, observer, groups, id)?;
        chain.push(ChainNode { claim, depth, knowledge });
    }
    Ok(chain)
}

/// The observer's applicable belief/stance pair for a claim: a direct edge
/// wins; otherwise the first group holding one supplies it.
fn resolve_knowledge(
    store: &dyn GraphStore,
    observer: EntityId,
    groups: &[EntityId],
    claim: ClaimId,
) -> RetrieveResult<Option<Knowledge>> {
    if let Some(direct) = store.knowledge_between(observer, claim)? {
        return Ok(Some(direct));
    }
    for &group in groups {
        if let Some(inherited) = store.knowledge_between(group, claim)? {
            return Ok(Some(inherited));
        }
    }
    Ok(None)
}

/// Assemble and render chains for a deduplicated candidate set.
///
/// Chains are precomputed once per candidate (in parallel; they only read
/// shared graph state) and reused for both the subsumption check and the
/// final assembly.
pub fn build_chains(
    store: &dyn GraphStore,
    observer: EntityId,
    candidates: &[CandidateClaim],
    max_depth: usize,
) -> RetrieveResult<Vec<ChainResult>> {
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let groups = store.groups_of(observer)?;
    let chains: HashMap<ClaimId, Vec<ChainNode>> = candidates
        .par_iter()
        .map(|c| {
            reference_chain(store, observer, &groups, c.id, max_depth).map(|chain| (c.id, chain))
        })
        .collect::<RetrieveResult<_>>()?;

    // A candidate sitting inside another candidate's chain is subsumed: it
    // will be rendered there, not as a chain of its own.
    let candidate_ids: HashSet<ClaimId> = candidates.iter().map(|c| c.id).collect();
    let mut subsumed = HashSet::new();
    for candidate in candidates {
        for node in &chains[&candidate.id] {
            if node.claim.id != candidate.id && candidate_ids.contains(&node.claim.id) {
                subsumed.insert(node.claim.id);
            }
        }
    }

    let mut processed: HashSet<ClaimId> = HashSet::new();
    let mut results = Vec::new();

    for candidate in candidates {
        if subsumed.contains(&candidate.id) || processed.contains(&candidate.id) {
            continue;
        }

        let chain: Vec<&ChainNode> = chains[&candidate.id]
            .iter()
            .filter(|node| !processed.contains(&node.claim.id))
            .collect();
        if chain.is_empty() {
            continue;
        }
        for node in &chain {
            processed.insert(node.claim.id);
        }

        let rendered: Vec<String> = chain
            .iter()
            .map(|node| {
                render_claim(
                    &node.claim.content,
                    node.claim.negative.as_deref(),
                    node.knowledge.map(|k| k.belief),
                    node.knowledge.map(|k| k.stance),
                )
            })
            .collect();

        results.push(ChainResult {
            text: rendered.join(" "),
            veracity: candidate.veracity,
            is_relation: chain.iter().any(|node| node.claim.is_relation()),
            chain_length: chain.len(),
        });
    }

    tracing::debug!(
        candidates = candidates.len(),
        chains = results.len(),
        subsumed = subsumed.len(),
        "chain assembly complete"
    );
    Ok(results)
}
