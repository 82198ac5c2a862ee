//! Engine facade: top-level API for the loreweave system.
//!
//! The `Engine` owns the graph store, the claim vector index, and the
//! embedder, and exposes the authoring interface (create entities and
//! claims, link edges) plus the retrieval pipeline
//! ([`Engine::retrieve_and_render`]). The optional chat client turns
//! assembled prompts into in-character replies.

use std::sync::Arc;

use crate::embed::{ClaimIndex, Embedder, HashEmbedder};
use crate::error::{EngineError, LoreResult, RetrieveError};
use crate::graph::{GraphStore, MemoryGraph, RefTarget};
use crate::llm::OllamaClient;
use crate::model::{
    Affect, ClaimId, ClaimKind, EntityId, EntityKind, Knowledge, StructuralKind, Veracity,
};
use crate::prompt::build_prompt;
use crate::retrieve::{
    RetrievalOutput, build_chains, dedup_claims, find_relation_claims, find_top_claims,
};

/// Configuration for the loreweave engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Claim embedding dimension. Must match the embedder's output size.
    pub embedding_dim: usize,
    /// Maximum expected claims (capacity hint for the vector index).
    pub max_claims: usize,
    /// How many candidate claims semantic search keeps.
    pub top_k: usize,
    /// How many referenced entities a relation claim must share with the
    /// candidate set to be pulled in.
    pub min_refs: usize,
    /// Depth bound for reference-chain traversal.
    pub max_chain_depth: usize,
    /// Over-fetch multiplier for the vector search, compensating for the
    /// access-scope filter running after the similarity search.
    pub overfetch_factor: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            embedding_dim: 256,
            max_claims: 100_000,
            top_k: 3,
            min_refs: 2,
            max_chain_depth: 5,
            overfetch_factor: 3,
        }
    }
}

/// The loreweave narrative-knowledge engine.
///
/// Owns the graph store, the claim vector index, the embedder, and an
/// optional chat client.
pub struct Engine {
    config: EngineConfig,
    graph: Arc<MemoryGraph>,
    index: ClaimIndex,
    embedder: Box<dyn Embedder>,
    llm: Option<OllamaClient>,
}

impl Engine {
    /// Create an engine with the default deterministic hashing embedder.
    pub fn new(config: EngineConfig) -> LoreResult<Self> {
        let embedder = Box::new(HashEmbedder::new(config.embedding_dim));
        Self::with_embedder(config, embedder)
    }

    /// Create an engine with a custom embedding backend.
    pub fn with_embedder(config: EngineConfig, embedder: Box<dyn Embedder>) -> LoreResult<Self> {
        if config.embedding_dim == 0 {
            return Err(EngineError::InvalidConfig {
                message: "embedding_dim must be > 0".into(),
            }
            .into());
        }
        if embedder.dimension() != config.embedding_dim {
            return Err(EngineError::InvalidConfig {
                message: format!(
                    "embedder outputs {} dimensions, config expects {}",
                    embedder.dimension(),
                    config.embedding_dim
                ),
            }
            .into());
        }
        if config.top_k == 0 || config.overfetch_factor == 0 {
            return Err(EngineError::InvalidConfig {
                message: "top_k and overfetch_factor must be > 0".into(),
            }
            .into());
        }

        tracing::info!(
            dim = config.embedding_dim,
            top_k = config.top_k,
            min_refs = config.min_refs,
            max_chain_depth = config.max_chain_depth,
            "initializing loreweave engine"
        );

        let index = ClaimIndex::new(config.embedding_dim, config.max_claims);
        Ok(Self {
            config,
            graph: Arc::new(MemoryGraph::new()),
            index,
            embedder,
            llm: None,
        })
    }

    /// Attach a chat client for [`Engine::generate_reply`].
    pub fn with_llm(mut self, llm: OllamaClient) -> Self {
        self.llm = Some(llm);
        self
    }

    // -- authoring ----------------------------------------------------------

    /// Create an entity. Names are unique natural keys.
    pub fn create_entity(&self, kind: EntityKind, name: &str) -> LoreResult<EntityId> {
        Ok(self.graph.add_entity(kind, name)?.id)
    }

    /// Create a claim and embed its content for retrieval.
    pub fn create_claim(&self, content: &str, veracity: Veracity) -> LoreResult<ClaimId> {
        let claim = self.graph.add_claim(content, veracity)?;
        let vector = self.embedder.embed_document(content)?;
        self.graph
            .update_claim(claim.id, |c| c.embedding = Some(vector.clone()))?;
        self.index.insert(claim.id, &vector)?;
        Ok(claim.id)
    }

    /// Create a relation-tagged claim and embed its content.
    pub fn create_relation_claim(&self, content: &str, veracity: Veracity) -> LoreResult<ClaimId> {
        let id = self.create_claim(content, veracity)?;
        self.graph.update_claim(id, |c| c.kind = Some(ClaimKind::Relation))?;
        Ok(id)
    }

    /// Set the phrasing used when an observer's belief is inverted.
    pub fn set_negative(&self, claim: ClaimId, negative: &str) -> LoreResult<()> {
        let negative = negative.to_string();
        self.graph.update_claim(claim, |c| c.negative = Some(negative))?;
        Ok(())
    }

    /// Recompute a claim's embedding from its current content.
    pub fn refresh_embedding(&self, claim: ClaimId) -> LoreResult<()> {
        let record = self
            .graph
            .claim(claim)?
            .ok_or(crate::error::GraphError::UnknownClaim { id: claim.get() })?;
        let vector = self.embedder.embed_document(&record.content)?;
        self.graph
            .update_claim(claim, |c| c.embedding = Some(vector.clone()))?;
        self.index.insert(claim, &vector)?;
        Ok(())
    }

    /// Create (or replace) the belief/stance pair between a holder and a
    /// claim.
    pub fn link_knowledge(
        &self,
        holder: EntityId,
        claim: ClaimId,
        belief: f32,
        stance: f32,
    ) -> LoreResult<()> {
        Ok(self
            .graph
            .link_knowledge(holder, claim, Knowledge::new(belief, stance))?)
    }

    /// Delete the belief/stance pair between a holder and a claim.
    pub fn unlink_knowledge(&self, holder: EntityId, claim: ClaimId) -> LoreResult<()> {
        Ok(self.graph.unlink_knowledge(holder, claim)?)
    }

    /// Make an NPC a member of a group, sharing the group's knowledge.
    pub fn link_member(&self, npc: EntityId, group: EntityId) -> LoreResult<()> {
        Ok(self.graph.link_member(npc, group)?)
    }

    /// Declare that a claim depends on or mentions a target.
    pub fn link_reference(&self, claim: ClaimId, target: RefTarget) -> LoreResult<()> {
        Ok(self.graph.link_reference(claim, target)?)
    }

    /// Declare that one claim's truth is conditioned on another.
    pub fn link_based_on(&self, claim: ClaimId, basis: ClaimId) -> LoreResult<()> {
        Ok(self.graph.link_based_on(claim, basis)?)
    }

    /// Create a structural relation between two NPCs (both directions).
    pub fn link_structural(
        &self,
        a: EntityId,
        b: EntityId,
        kind: StructuralKind,
        secrecy: f32,
    ) -> LoreResult<()> {
        Ok(self.graph.link_structural(a, b, kind, secrecy)?)
    }

    /// Create (or replace) the affection/demeanour pair from one NPC to
    /// another.
    pub fn link_affect(
        &self,
        from: EntityId,
        to: EntityId,
        affection: f32,
        demeanour: f32,
    ) -> LoreResult<()> {
        Ok(self.graph.link_affect(from, to, Affect::new(affection, demeanour))?)
    }

    /// Delete a claim and every edge touching it.
    pub fn delete_claim(&self, claim: ClaimId) -> LoreResult<()> {
        Ok(self.graph.remove_claim(claim)?)
    }

    /// Delete an entity and every edge touching it.
    pub fn delete_entity(&self, entity: EntityId) -> LoreResult<()> {
        Ok(self.graph.remove_entity(entity)?)
    }

    /// The underlying graph store.
    pub fn graph(&self) -> &MemoryGraph {
        &self.graph
    }

    // -- retrieval ----------------------------------------------------------

    /// Run the full retrieval pipeline for one question.
    ///
    /// Candidate search → relation augmentation → dedup → chain assembly →
    /// prompt. An unknown entity name is an error; an entity that simply
    /// knows nothing relevant yields empty chains and a placeholder prompt.
    pub fn retrieve_and_render(
        &self,
        entity_name: &str,
        question: &str,
    ) -> LoreResult<RetrievalOutput> {
        let store: &dyn GraphStore = self.graph.as_ref();
        let entity = store
            .entity_by_name(entity_name)?
            .ok_or_else(|| RetrieveError::EntityNotFound { name: entity_name.to_string() })?;

        tracing::info!(entity = %entity.name, question, "retrieving claims");

        let candidates = find_top_claims(
            store,
            &self.index,
            self.embedder.as_ref(),
            entity.id,
            question,
            self.config.top_k,
            self.config.overfetch_factor,
        )?;
        let candidate_ids: Vec<ClaimId> = candidates.iter().map(|c| c.id).collect();

        let augmented =
            find_relation_claims(store, entity.id, &candidate_ids, self.config.min_refs)?;

        let mut merged = candidates;
        merged.extend(augmented);
        let unique = dedup_claims(merged);

        let chains = build_chains(store, entity.id, &unique, self.config.max_chain_depth)?;
        tracing::info!(
            candidates = unique.len(),
            chains = chains.len(),
            "retrieval complete"
        );

        let prompt = build_prompt(&entity.name, &chains, question);
        let (relation_chains, knowledge_chains) =
            chains.into_iter().partition(|c| c.is_relation);

        Ok(RetrievalOutput { knowledge_chains, relation_chains, prompt })
    }

    /// Retrieve, render, and hand the prompt to the chat backend.
    pub fn generate_reply(&self, entity_name: &str, question: &str) -> LoreResult<String> {
        let llm = self.llm.as_ref().ok_or(EngineError::LlmNotConfigured)?;
        let output = self.retrieve_and_render(entity_name, question)?;
        Ok(llm.generate(&output.prompt)?)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("graph", &self.graph)
            .field("index", &self.index)
            .finish()
    }
}
