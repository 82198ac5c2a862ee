//! Core data model for the narrative-knowledge graph.
//!
//! Entities and claims are the two node families. Entities are NPCs, groups,
//! objects, and places, keyed by a unique name. Claims are the units of
//! narrative fact: an assertion with an objective veracity, an optional
//! negated phrasing, and an embedding vector for semantic retrieval. Edges
//! (knowledge, reference, structural, affective) live in the graph layer.

use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Unique, niche-optimized identifier for an entity.
///
/// Uses `NonZeroU64` so that `Option<EntityId>` is the same size as
/// `EntityId` (0 serves as the `None` discriminant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct EntityId(NonZeroU64);

impl EntityId {
    /// Create an `EntityId` from a raw `u64`. Returns `None` if `raw` is zero.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(EntityId)
    }

    /// Get the underlying `u64` value.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ent:{}", self.0)
    }
}

/// Unique identifier for a claim. Opaque, assigned at creation, immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ClaimId(NonZeroU64);

impl ClaimId {
    /// Create a `ClaimId` from a raw `u64`. Returns `None` if `raw` is zero.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(ClaimId)
    }

    /// Get the underlying `u64` value.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl std::fmt::Display for ClaimId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "claim:{}", self.0)
    }
}

/// What kind of entity a node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// A character.
    Npc,
    /// A collection of NPCs sharing knowledge.
    Group,
    /// A physical object.
    Object,
    /// A location.
    Place,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Npc => write!(f, "NPC"),
            EntityKind::Group => write!(f, "Group"),
            EntityKind::Object => write!(f, "Object"),
            EntityKind::Place => write!(f, "Place"),
        }
    }
}

/// An entity in the narrative world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier.
    pub id: EntityId,
    /// What kind of entity this is.
    pub kind: EntityKind,
    /// Unique name, used as the natural key.
    pub name: String,
    /// When this entity was created (seconds since UNIX epoch).
    pub created_at: u64,
}

impl Entity {
    /// Create a new entity with the current timestamp.
    pub fn new(id: EntityId, kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            created_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        }
    }
}

/// Whether an assertion is objectively true in the fiction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Veracity {
    Truth,
    Lie,
}

impl std::fmt::Display for Veracity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Veracity::Truth => write!(f, "truth"),
            Veracity::Lie => write!(f, "lie"),
        }
    }
}

/// Optional tag on a claim. Absence means a plain factual claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimKind {
    /// The claim describes a relationship between entities. Relation claims
    /// are separated from plain facts at render and prompt time.
    Relation,
}

/// The central unit of narrative fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    /// Unique identifier.
    pub id: ClaimId,
    /// Display text: the assertion as stated.
    pub content: String,
    /// Whether the assertion is objectively true in the fiction.
    pub veracity: Veracity,
    /// Optional tag; `None` means a plain factual claim.
    pub kind: Option<ClaimKind>,
    /// Alternate text used when an observer's belief is inverted.
    pub negative: Option<String>,
    /// Embedding vector computed from `content`. Claims without an embedding
    /// are excluded from candidate search.
    pub embedding: Option<Vec<f32>>,
}

impl Claim {
    /// Create a new plain claim with no embedding yet.
    pub fn new(id: ClaimId, content: impl Into<String>, veracity: Veracity) -> Self {
        Self {
            id,
            content: content.into(),
            veracity,
            kind: None,
            negative: None,
            embedding: None,
        }
    }

    /// Tag the claim as a relation claim.
    pub fn with_kind(mut self, kind: ClaimKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Attach the negated phrasing.
    pub fn with_negative(mut self, negative: impl Into<String>) -> Self {
        self.negative = Some(negative.into());
        self
    }

    /// Attach the embedding vector.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Whether the claim is tagged as a relation claim.
    pub fn is_relation(&self) -> bool {
        self.kind == Some(ClaimKind::Relation)
    }
}

/// A belief/stance pair linking an entity to a claim.
///
/// `belief` is internal conviction: negative means the entity disbelieves
/// (or believes the negation); magnitude is confidence. `stance` is external
/// willingness to voice the belief: negative means the entity would argue
/// against it; magnitude is openness. The two are independently settable but
/// always created and deleted together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Knowledge {
    /// Internal conviction in [-1, 1].
    pub belief: f32,
    /// External willingness to voice the belief, in [-1, 1].
    pub stance: f32,
}

impl Knowledge {
    /// Create a knowledge pair, clamping both intensities to [-1, 1].
    pub fn new(belief: f32, stance: f32) -> Self {
        Self {
            belief: belief.clamp(-1.0, 1.0),
            stance: stance.clamp(-1.0, 1.0),
        }
    }
}

/// Structural NPC↔NPC relation types.
///
/// Symmetric kinds are their own inverse; asymmetric pairs are always stored
/// as two directed edges, one per side, each with the correct type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructuralKind {
    SiblingWith,
    FriendsWith,
    Dating,
    MarriedTo,
    DivorcedFrom,
    ParentTo,
    ChildTo,
}

impl StructuralKind {
    /// The type carried by the reverse edge of this relation.
    pub fn inverse(self) -> Self {
        match self {
            StructuralKind::ParentTo => StructuralKind::ChildTo,
            StructuralKind::ChildTo => StructuralKind::ParentTo,
            symmetric => symmetric,
        }
    }
}

/// A directed NPC→NPC affective pair: `affection` is the internal feeling,
/// `demeanour` the outward expression, both in [-1, 1]. Always co-created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affect {
    pub affection: f32,
    pub demeanour: f32,
}

impl Affect {
    /// Create an affective pair, clamping both values to [-1, 1].
    pub fn new(affection: f32, demeanour: f32) -> Self {
        Self {
            affection: affection.clamp(-1.0, 1.0),
            demeanour: demeanour.clamp(-1.0, 1.0),
        }
    }
}

/// Thread-safe node ID allocator shared by entities and claims.
///
/// Starts at 1 so that the zero niche stays free for `NonZeroU64`.
#[derive(Debug)]
pub struct NodeIdAllocator {
    next: AtomicU64,
}

impl NodeIdAllocator {
    /// Create a new allocator starting at 1.
    pub fn new() -> Self {
        Self { next: AtomicU64::new(1) }
    }

    /// Allocate the next raw id.
    pub fn next_raw(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Allocate a fresh entity id.
    pub fn next_entity(&self) -> EntityId {
        EntityId::new(self.next_raw()).expect("allocator starts at 1")
    }

    /// Allocate a fresh claim id.
    pub fn next_claim(&self) -> ClaimId {
        ClaimId::new(self.next_raw()).expect("allocator starts at 1")
    }
}

impl Default for NodeIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
