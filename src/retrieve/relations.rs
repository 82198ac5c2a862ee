//! Relation-claim augmentation: structural corroboration of candidates.
//!
//! Semantic search surfaces isolated facts. Relational context — who is
//! related to whom — usually lives in claims that tie together several
//! entities the candidates already mention. This stage collects the entities
//! referenced by the candidate set, then pulls in the observer's
//! relation-tagged claims that reference enough of them.

use std::collections::HashSet;

use crate::graph::GraphStore;
use crate::model::{ClaimId, EntityId};

use super::{CandidateClaim, RetrieveResult};

/// Find relation claims in the entity's scope that reference at least
/// `min_refs` of the entities mentioned by the candidate claims.
///
/// Matches carry a synthetic score of 0.0: they were found by structural
/// overlap, not semantic rank.
pub fn find_relation_claims(
    store: &dyn GraphStore,
    entity: EntityId,
    candidate_ids: &[ClaimId],
    min_refs: usize,
) -> RetrieveResult<Vec<CandidateClaim>> {
    if candidate_ids.is_empty() {
        return Ok(Vec::new());
    }

    let referenced = store.referenced_entities(candidate_ids)?;
    if referenced.len() < min_refs {
        tracing::debug!(
            mentioned = referenced.len(),
            min_refs,
            "too few referenced entities for relation augmentation"
        );
        return Ok(Vec::new());
    }
    let mentioned: HashSet<EntityId> = referenced.iter().map(|r| r.id).collect();

    let mut out = Vec::new();
    for claim in store.accessible_relation_claims(entity)? {
        let ref_count = store
            .entity_references_of(claim.id)?
            .into_iter()
            .filter(|id| mentioned.contains(id))
            .collect::<HashSet<_>>()
            .len();
        if ref_count >= min_refs {
            out.push(CandidateClaim {
                id: claim.id,
                content: claim.content,
                veracity: claim.veracity,
                kind: claim.kind,
                score: 0.0,
            });
        }
    }
    tracing::debug!(found = out.len(), "relation augmentation complete");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{MemoryGraph, RefTarget};
    use crate::model::{ClaimKind, EntityKind, Knowledge, Veracity};

    struct World {
        store: MemoryGraph,
        elin: EntityId,
        alrik: EntityId,
        maria: EntityId,
    }

    impl World {
        fn new() -> Self {
            let store = MemoryGraph::new();
            let elin = store.add_entity(EntityKind::Npc, "Elin").unwrap().id;
            let alrik = store.add_entity(EntityKind::Npc, "Alrik").unwrap().id;
            let maria = store.add_entity(EntityKind::Npc, "Maria").unwrap().id;
            Self { store, elin, alrik, maria }
        }

        fn fact(&self, content: &str, mentions: &[EntityId]) -> ClaimId {
            let claim = self.store.add_claim(content, Veracity::Truth).unwrap();
            for &target in mentions {
                self.store.link_reference(claim.id, RefTarget::Entity(target)).unwrap();
            }
            claim.id
        }

        fn relation_claim(&self, holder: EntityId, content: &str, mentions: &[EntityId]) -> ClaimId {
            let claim = self.store.add_claim(content, Veracity::Truth).unwrap();
            self.store
                .update_claim(claim.id, |c| c.kind = Some(ClaimKind::Relation))
                .unwrap();
            for &target in mentions {
                self.store.link_reference(claim.id, RefTarget::Entity(target)).unwrap();
            }
            self.store.link_knowledge(holder, claim.id, Knowledge::new(1.0, 1.0)).unwrap();
            claim.id
        }
    }

    #[test]
    fn relation_claims_tying_mentioned_entities_are_found() {
        let w = World::new();
        let candidate = w.fact("Alrik argued with Maria at dinner.", &[w.alrik, w.maria]);
        let relation =
            w.relation_claim(w.elin, "Alrik is married to Maria.", &[w.alrik, w.maria]);

        let found = find_relation_claims(&w.store, w.elin, &[candidate], 2).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, relation);
        assert_eq!(found[0].score, 0.0);
    }

    #[test]
    fn claims_below_min_refs_are_skipped() {
        let w = World::new();
        let candidate = w.fact("Alrik argued with Maria.", &[w.alrik, w.maria]);
        // Only one of the mentioned entities appears in this relation claim.
        w.relation_claim(w.elin, "Alrik is Elin's father.", &[w.alrik]);

        let found = find_relation_claims(&w.store, w.elin, &[candidate], 2).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn too_few_mentioned_entities_short_circuits() {
        let w = World::new();
        let candidate = w.fact("Alrik left early.", &[w.alrik]);
        w.relation_claim(w.elin, "Alrik is married to Maria.", &[w.alrik, w.maria]);

        let found = find_relation_claims(&w.store, w.elin, &[candidate], 2).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn empty_candidate_set_yields_nothing() {
        let w = World::new();
        let found = find_relation_claims(&w.store, w.elin, &[], 2).unwrap();
        assert!(found.is_empty());
    }
}
