//! In-memory graph store backed by petgraph with dual-indexing.
//!
//! Nodes are entities and claims; edges carry the relation payloads. A
//! `StableDiGraph` keeps node indices valid across deletions so cascades
//! stay cheap, and `DashMap` side indexes give O(1) lookups by id and name.

use std::collections::HashSet;
use std::sync::RwLock;

use dashmap::DashMap;
use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;

use crate::error::GraphError;
use crate::model::{
    Affect, Claim, ClaimId, Entity, EntityId, EntityKind, Knowledge, NodeIdAllocator,
    StructuralKind, Veracity,
};

use super::{EntityRef, GraphResult, GraphStore, RefTarget};

/// Node payload: which id family the node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKey {
    Entity(EntityId),
    Claim(ClaimId),
}

/// Edge payloads. Knowledge and affective pairs are stored as two edges,
/// matching how they are created and deleted: always together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeKind {
    /// Entity → Claim: internal conviction in [-1, 1].
    Belief { intensity: f32 },
    /// Entity → Claim: willingness to voice the belief, in [-1, 1].
    Stance { intensity: f32 },
    /// NPC → Group membership.
    MemberOf,
    /// Claim → Claim or Claim → Entity dependency/mention.
    Reference,
    /// Claim → Claim: truth conditioned on another claim. Preserved in the
    /// schema, not traversed by retrieval.
    BasedOn,
    /// NPC → NPC structural relation with a secrecy scalar.
    Structural { kind: StructuralKind, secrecy: f32 },
    /// NPC → NPC internal feeling in [-1, 1].
    Affection { intensity: f32 },
    /// NPC → NPC outward expression in [-1, 1].
    Demeanour { intensity: f32 },
}

/// In-memory property graph implementing [`GraphStore`].
pub struct MemoryGraph {
    /// The directed graph; stable indices survive node removal.
    graph: RwLock<StableDiGraph<NodeKey, EdgeKind>>,
    /// EntityId → NodeIndex.
    entity_nodes: DashMap<EntityId, NodeIndex>,
    /// ClaimId → NodeIndex.
    claim_nodes: DashMap<ClaimId, NodeIndex>,
    /// Entity payloads.
    entities: DashMap<EntityId, Entity>,
    /// Claim payloads.
    claims: DashMap<ClaimId, Claim>,
    /// Natural-key index: name → EntityId.
    names: DashMap<String, EntityId>,
    /// Shared id allocator for entities and claims.
    ids: NodeIdAllocator,
}

impl MemoryGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self {
            graph: RwLock::new(StableDiGraph::new()),
            entity_nodes: DashMap::new(),
            claim_nodes: DashMap::new(),
            entities: DashMap::new(),
            claims: DashMap::new(),
            names: DashMap::new(),
            ids: NodeIdAllocator::new(),
        }
    }

    // -- authoring ----------------------------------------------------------

    /// Create an entity. Names are natural keys: duplicates are rejected.
    pub fn add_entity(&self, kind: EntityKind, name: &str) -> GraphResult<Entity> {
        if self.names.contains_key(name) {
            return Err(GraphError::DuplicateEntity { name: name.to_string() });
        }
        let id = self.ids.next_entity();
        let entity = Entity::new(id, kind, name);

        let idx = self
            .graph
            .write()
            .expect("graph lock poisoned")
            .add_node(NodeKey::Entity(id));
        self.entity_nodes.insert(id, idx);
        self.names.insert(name.to_string(), id);
        self.entities.insert(id, entity.clone());
        Ok(entity)
    }

    /// Create a claim with no embedding. The id is assigned here and never
    /// changes.
    pub fn add_claim(&self, content: &str, veracity: Veracity) -> GraphResult<Claim> {
        let id = self.ids.next_claim();
        let claim = Claim::new(id, content, veracity);

        let idx = self
            .graph
            .write()
            .expect("graph lock poisoned")
            .add_node(NodeKey::Claim(id));
        self.claim_nodes.insert(id, idx);
        self.claims.insert(id, claim.clone());
        Ok(claim)
    }

    /// Mutate a claim in place (kind, negative text, embedding, content).
    pub fn update_claim(
        &self,
        id: ClaimId,
        mutate: impl FnOnce(&mut Claim),
    ) -> GraphResult<()> {
        let mut entry = self
            .claims
            .get_mut(&id)
            .ok_or(GraphError::UnknownClaim { id: id.get() })?;
        mutate(entry.value_mut());
        Ok(())
    }

    /// Create (or replace) the belief/stance pair between a holder and a
    /// claim. Holder must be an NPC or Group.
    pub fn link_knowledge(
        &self,
        holder: EntityId,
        claim: ClaimId,
        knowledge: Knowledge,
    ) -> GraphResult<()> {
        let holder_kind = self.entity_kind(holder)?;
        if !matches!(holder_kind, EntityKind::Npc | EntityKind::Group) {
            return Err(GraphError::InvalidEndpoint { kind: "knowledge", side: "holder" });
        }
        let from = self.entity_node(holder)?;
        let to = self.claim_node(claim)?;

        let mut graph = self.graph.write().expect("graph lock poisoned");
        remove_edges_between(&mut graph, from, to, |e| {
            matches!(e, EdgeKind::Belief { .. } | EdgeKind::Stance { .. })
        });
        graph.add_edge(from, to, EdgeKind::Belief { intensity: knowledge.belief });
        graph.add_edge(from, to, EdgeKind::Stance { intensity: knowledge.stance });
        Ok(())
    }

    /// Delete the belief/stance pair between a holder and a claim.
    pub fn unlink_knowledge(&self, holder: EntityId, claim: ClaimId) -> GraphResult<()> {
        let from = self.entity_node(holder)?;
        let to = self.claim_node(claim)?;
        let mut graph = self.graph.write().expect("graph lock poisoned");
        remove_edges_between(&mut graph, from, to, |e| {
            matches!(e, EdgeKind::Belief { .. } | EdgeKind::Stance { .. })
        });
        Ok(())
    }

    /// Make an NPC a member of a group.
    pub fn link_member(&self, npc: EntityId, group: EntityId) -> GraphResult<()> {
        if self.entity_kind(npc)? != EntityKind::Npc {
            return Err(GraphError::InvalidEndpoint { kind: "membership", side: "member" });
        }
        if self.entity_kind(group)? != EntityKind::Group {
            return Err(GraphError::InvalidEndpoint { kind: "membership", side: "group" });
        }
        let from = self.entity_node(npc)?;
        let to = self.entity_node(group)?;
        self.graph
            .write()
            .expect("graph lock poisoned")
            .add_edge(from, to, EdgeKind::MemberOf);
        Ok(())
    }

    /// Declare that a claim's content depends on or mentions a target.
    pub fn link_reference(&self, claim: ClaimId, target: RefTarget) -> GraphResult<()> {
        let from = self.claim_node(claim)?;
        let to = match target {
            RefTarget::Claim(id) => self.claim_node(id)?,
            RefTarget::Entity(id) => {
                // Groups are not referenceable: claims mention concrete
                // NPCs, objects, and places.
                if self.entity_kind(id)? == EntityKind::Group {
                    return Err(GraphError::InvalidEndpoint { kind: "reference", side: "target" });
                }
                self.entity_node(id)?
            }
        };
        self.graph
            .write()
            .expect("graph lock poisoned")
            .add_edge(from, to, EdgeKind::Reference);
        Ok(())
    }

    /// Declare that one claim's truth is conditioned on another.
    pub fn link_based_on(&self, claim: ClaimId, basis: ClaimId) -> GraphResult<()> {
        let from = self.claim_node(claim)?;
        let to = self.claim_node(basis)?;
        self.graph
            .write()
            .expect("graph lock poisoned")
            .add_edge(from, to, EdgeKind::BasedOn);
        Ok(())
    }

    /// Create a structural relation between two NPCs. Writes both directed
    /// edges, each side carrying its correct type (`ParentTo`/`ChildTo` for
    /// asymmetric kinds, the same type for symmetric ones).
    pub fn link_structural(
        &self,
        a: EntityId,
        b: EntityId,
        kind: StructuralKind,
        secrecy: f32,
    ) -> GraphResult<()> {
        for (side, id) in [("a", a), ("b", b)] {
            if self.entity_kind(id)? != EntityKind::Npc {
                return Err(GraphError::InvalidEndpoint { kind: "structural", side });
            }
        }
        let na = self.entity_node(a)?;
        let nb = self.entity_node(b)?;
        let mut graph = self.graph.write().expect("graph lock poisoned");
        graph.add_edge(na, nb, EdgeKind::Structural { kind, secrecy });
        graph.add_edge(nb, na, EdgeKind::Structural { kind: kind.inverse(), secrecy });
        Ok(())
    }

    /// Create (or replace) the affection/demeanour pair from one NPC to
    /// another. Directed: the reverse feeling is a separate pair.
    pub fn link_affect(&self, from: EntityId, to: EntityId, affect: Affect) -> GraphResult<()> {
        for (side, id) in [("from", from), ("to", to)] {
            if self.entity_kind(id)? != EntityKind::Npc {
                return Err(GraphError::InvalidEndpoint { kind: "affective", side });
            }
        }
        let na = self.entity_node(from)?;
        let nb = self.entity_node(to)?;
        let mut graph = self.graph.write().expect("graph lock poisoned");
        remove_edges_between(&mut graph, na, nb, |e| {
            matches!(e, EdgeKind::Affection { .. } | EdgeKind::Demeanour { .. })
        });
        graph.add_edge(na, nb, EdgeKind::Affection { intensity: affect.affection });
        graph.add_edge(na, nb, EdgeKind::Demeanour { intensity: affect.demeanour });
        Ok(())
    }

    /// Delete a claim. All edges touching it (knowledge, references, basis
    /// links) are removed with the node.
    pub fn remove_claim(&self, id: ClaimId) -> GraphResult<()> {
        let (_, idx) = self
            .claim_nodes
            .remove(&id)
            .ok_or(GraphError::UnknownClaim { id: id.get() })?;
        self.graph.write().expect("graph lock poisoned").remove_node(idx);
        self.claims.remove(&id);
        Ok(())
    }

    /// Delete an entity. All edges touching it are removed with the node.
    pub fn remove_entity(&self, id: EntityId) -> GraphResult<()> {
        let (_, idx) = self
            .entity_nodes
            .remove(&id)
            .ok_or(GraphError::UnknownEntity { id: id.get() })?;
        self.graph.write().expect("graph lock poisoned").remove_node(idx);
        if let Some((_, entity)) = self.entities.remove(&id) {
            self.names.remove(&entity.name);
        }
        Ok(())
    }

    /// Number of claims currently stored.
    pub fn claim_count(&self) -> usize {
        self.claims.len()
    }

    /// Number of entities currently stored.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    // -- internals ----------------------------------------------------------

    fn entity_node(&self, id: EntityId) -> GraphResult<NodeIndex> {
        self.entity_nodes
            .get(&id)
            .map(|e| *e.value())
            .ok_or(GraphError::UnknownEntity { id: id.get() })
    }

    fn claim_node(&self, id: ClaimId) -> GraphResult<NodeIndex> {
        self.claim_nodes
            .get(&id)
            .map(|e| *e.value())
            .ok_or(GraphError::UnknownClaim { id: id.get() })
    }

    fn entity_kind(&self, id: EntityId) -> GraphResult<EntityKind> {
        self.entities
            .get(&id)
            .map(|e| e.value().kind)
            .ok_or(GraphError::UnknownEntity { id: id.get() })
    }

    /// Claims the holder has a direct belief edge to, in edge order.
    fn direct_belief_claims(&self, holder: NodeIndex) -> Vec<ClaimId> {
        let graph = self.graph.read().expect("graph lock poisoned");
        graph
            .edges_directed(holder, Direction::Outgoing)
            .filter(|e| matches!(e.weight(), EdgeKind::Belief { .. }))
            .filter_map(|e| match graph.node_weight(e.target()) {
                Some(NodeKey::Claim(id)) => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// The holder itself plus every group it belongs to, holder first.
    fn knowledge_holders(&self, entity: EntityId) -> GraphResult<Vec<NodeIndex>> {
        let mut holders = vec![self.entity_node(entity)?];
        for group in self.groups_of(entity)? {
            holders.push(self.entity_node(group)?);
        }
        Ok(holders)
    }
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryGraph")
            .field("entities", &self.entities.len())
            .field("claims", &self.claims.len())
            .finish()
    }
}

impl GraphStore for MemoryGraph {
    fn entity_by_name(&self, name: &str) -> GraphResult<Option<Entity>> {
        Ok(self
            .names
            .get(name)
            .and_then(|id| self.entities.get(id.value()).map(|e| e.value().clone())))
    }

    fn claim(&self, id: ClaimId) -> GraphResult<Option<Claim>> {
        Ok(self.claims.get(&id).map(|c| c.value().clone()))
    }

    fn groups_of(&self, entity: EntityId) -> GraphResult<Vec<EntityId>> {
        let idx = self.entity_node(entity)?;
        let graph = self.graph.read().expect("graph lock poisoned");
        Ok(graph
            .edges_directed(idx, Direction::Outgoing)
            .filter(|e| matches!(e.weight(), EdgeKind::MemberOf))
            .filter_map(|e| match graph.node_weight(e.target()) {
                Some(NodeKey::Entity(id)) => Some(*id),
                _ => None,
            })
            .collect())
    }

    fn accessible_claim_ids(&self, entity: EntityId) -> GraphResult<Vec<ClaimId>> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for holder in self.knowledge_holders(entity)? {
            for id in self.direct_belief_claims(holder) {
                if !seen.insert(id) {
                    continue;
                }
                let has_embedding = self
                    .claims
                    .get(&id)
                    .is_some_and(|c| c.value().embedding.is_some());
                if has_embedding {
                    out.push(id);
                }
            }
        }
        Ok(out)
    }

    fn accessible_relation_claims(&self, entity: EntityId) -> GraphResult<Vec<Claim>> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for holder in self.knowledge_holders(entity)? {
            for id in self.direct_belief_claims(holder) {
                if !seen.insert(id) {
                    continue;
                }
                if let Some(claim) = self.claims.get(&id) {
                    if claim.value().is_relation() {
                        out.push(claim.value().clone());
                    }
                }
            }
        }
        Ok(out)
    }

    fn referenced_entities(&self, claims: &[ClaimId]) -> GraphResult<Vec<EntityRef>> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for &claim in claims {
            for id in self.entity_references_of(claim)? {
                if !seen.insert(id) {
                    continue;
                }
                if let Some(entity) = self.entities.get(&id) {
                    out.push(EntityRef {
                        id,
                        kind: entity.value().kind,
                        name: entity.value().name.clone(),
                    });
                }
            }
        }
        Ok(out)
    }

    fn entity_references_of(&self, claim: ClaimId) -> GraphResult<Vec<EntityId>> {
        let idx = self.claim_node(claim)?;
        let graph = self.graph.read().expect("graph lock poisoned");
        Ok(graph
            .edges_directed(idx, Direction::Outgoing)
            .filter(|e| matches!(e.weight(), EdgeKind::Reference))
            .filter_map(|e| match graph.node_weight(e.target()) {
                Some(NodeKey::Entity(id)) => Some(*id),
                _ => None,
            })
            .collect())
    }

    fn claim_references_of(&self, claim: ClaimId) -> GraphResult<Vec<ClaimId>> {
        let idx = self.claim_node(claim)?;
        let graph = self.graph.read().expect("graph lock poisoned");
        Ok(graph
            .edges_directed(idx, Direction::Outgoing)
            .filter(|e| matches!(e.weight(), EdgeKind::Reference))
            .filter_map(|e| match graph.node_weight(e.target()) {
                Some(NodeKey::Claim(id)) => Some(*id),
                _ => None,
            })
            .collect())
    }

    fn knowledge_between(
        &self,
        holder: EntityId,
        claim: ClaimId,
    ) -> GraphResult<Option<Knowledge>> {
        let from = self.entity_node(holder)?;
        let to = self.claim_node(claim)?;
        let graph = self.graph.read().expect("graph lock poisoned");

        let mut belief = None;
        let mut stance = None;
        for edge in graph.edges_connecting(from, to) {
            match edge.weight() {
                EdgeKind::Belief { intensity } => belief = Some(*intensity),
                EdgeKind::Stance { intensity } => stance = Some(*intensity),
                _ => {}
            }
        }
        // Pair invariant: stance is always written alongside belief.
        Ok(belief.map(|b| Knowledge { belief: b, stance: stance.unwrap_or(b) }))
    }
}

/// Remove every edge between `from` and `to` matching the predicate.
fn remove_edges_between(
    graph: &mut StableDiGraph<NodeKey, EdgeKind>,
    from: NodeIndex,
    to: NodeIndex,
    matches: impl Fn(&EdgeKind) -> bool,
) {
    let doomed: Vec<_> = graph
        .edges_connecting(from, to)
        .filter(|e| matches(e.weight()))
        .map(|e| e.id())
        .collect();
    for edge in doomed {
        graph.remove_edge(edge);
    }
}
