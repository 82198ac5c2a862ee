//! Graph store abstraction: typed adapter methods over a property graph.
//!
//! The retrieval pipeline never constructs query text. Every operation it
//! needs is an explicit method on [`GraphStore`], so any backend — the
//! bundled in-memory graph, a relational store with adjacency tables, or a
//! true graph database — can satisfy it with typed records.

pub mod memory;

pub use memory::MemoryGraph;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::model::{Claim, ClaimId, Entity, EntityId, EntityKind, Knowledge};

/// Result type for graph operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// Target of a claim's reference edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefTarget {
    /// The claim depends on another claim.
    Claim(ClaimId),
    /// The claim mentions an entity (NPC, object, or place).
    Entity(EntityId),
}

/// Lightweight record for an entity mentioned by a claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub id: EntityId,
    pub kind: EntityKind,
    pub name: String,
}

/// Read interface the retrieval pipeline runs against.
///
/// Implementations must be safe to share across threads: chain assembly
/// issues independent read-only traversals in parallel.
pub trait GraphStore: Send + Sync {
    /// Fetch an entity by its unique name.
    fn entity_by_name(&self, name: &str) -> GraphResult<Option<Entity>>;

    /// Fetch a claim by id.
    fn claim(&self, id: ClaimId) -> GraphResult<Option<Claim>>;

    /// Groups the entity is a member of.
    fn groups_of(&self, entity: EntityId) -> GraphResult<Vec<EntityId>>;

    /// The entity's access scope: ids of every claim it holds a belief edge
    /// to, plus claims held by any of its groups. Claims without an embedding
    /// are excluded — they cannot participate in candidate search.
    fn accessible_claim_ids(&self, entity: EntityId) -> GraphResult<Vec<ClaimId>>;

    /// Relation-tagged claims in the entity's access scope. No embedding
    /// requirement: these are matched structurally, not semantically.
    fn accessible_relation_claims(&self, entity: EntityId) -> GraphResult<Vec<Claim>>;

    /// Entities (NPCs, objects, places) referenced by any of the given
    /// claims, deduplicated.
    fn referenced_entities(&self, claims: &[ClaimId]) -> GraphResult<Vec<EntityRef>>;

    /// Entity ids a single claim references.
    fn entity_references_of(&self, claim: ClaimId) -> GraphResult<Vec<EntityId>>;

    /// Claim ids a single claim references (one hop of the reference graph).
    fn claim_references_of(&self, claim: ClaimId) -> GraphResult<Vec<ClaimId>>;

    /// The belief/stance pair the holder has toward a claim, if any.
    fn knowledge_between(&self, holder: EntityId, claim: ClaimId)
    -> GraphResult<Option<Knowledge>>;
}
