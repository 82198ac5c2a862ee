//! # loreweave
//!
//! A narrative-knowledge graph engine for game NPCs. Entities (NPCs, groups,
//! objects, places) hold *claims* — facts, lies, and relations — weighted per
//! entity by a belief/stance pair. A retrieval pipeline selects the claims
//! relevant to a player's question, assembles their reference chains, renders
//! each claim in character, and produces a prompt for a language model.
//!
//! ## Architecture
//!
//! - **Data model** (`model`): entities, claims, knowledge edges, relations
//! - **Graph store** (`graph`): typed [`graph::GraphStore`] adapter with an
//!   in-memory petgraph backend
//! - **Embeddings** (`embed`): document/query encoding plus an HNSW index
//!   over claim vectors
//! - **Retrieval** (`retrieve`): candidate search → relation augmentation →
//!   dedup → reference-chain assembly
//! - **Rendering** (`render`, `prompt`): belief/stance-driven phrasing and
//!   prompt assembly
//!
//! ## Library usage
//!
//! ```no_run
//! use loreweave::engine::{Engine, EngineConfig};
//! use loreweave::model::{EntityKind, Veracity};
//!
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//! let bruno = engine.create_entity(EntityKind::Npc, "Bruno").unwrap();
//! let claim = engine
//!     .create_claim("Maria is Bruno's mother.", Veracity::Truth)
//!     .unwrap();
//! engine.link_knowledge(bruno, claim, 0.9, 0.8).unwrap();
//! let out = engine.retrieve_and_render("Bruno", "Who is your mother?").unwrap();
//! println!("{}", out.prompt);
//! ```

pub mod embed;
pub mod engine;
pub mod error;
pub mod graph;
pub mod llm;
pub mod model;
pub mod prompt;
pub mod render;
pub mod retrieve;

/// Install the default tracing subscriber for host applications.
///
/// Respects `RUST_LOG`; falls back to `info`. Safe to call once at startup.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,hnsw_rs=warn")),
        )
        .init();
}
