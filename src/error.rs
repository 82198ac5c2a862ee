//! Rich diagnostic error types for the loreweave engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]`
//! derives, providing error codes and help text. Component-local failures
//! (missing embeddings, empty access scopes) are absorbed by the pipeline and
//! never appear here; only conditions the caller must act on become errors.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the loreweave engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full
/// diagnostic chain (error codes, help text) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum LoreError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Embed(#[from] EmbedError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Retrieve(#[from] RetrieveError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),
}

// ---------------------------------------------------------------------------
// Graph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("entity already exists: {name}")]
    #[diagnostic(
        code(lore::graph::duplicate_entity),
        help(
            "Entity names are natural keys and must be unique. \
             Look the entity up with `entity_by_name` instead of creating it again."
        )
    )]
    DuplicateEntity { name: String },

    #[error("unknown entity: {id}")]
    #[diagnostic(
        code(lore::graph::unknown_entity),
        help("The entity id has no node in the graph. It may have been deleted.")
    )]
    UnknownEntity { id: u64 },

    #[error("unknown claim: {id}")]
    #[diagnostic(
        code(lore::graph::unknown_claim),
        help("The claim id has no node in the graph. It may have been deleted.")
    )]
    UnknownClaim { id: u64 },

    #[error("{kind} edges require an NPC on the {side} side")]
    #[diagnostic(
        code(lore::graph::invalid_endpoint),
        help(
            "Structural and affective relations connect NPCs, knowledge edges \
             start at an NPC or Group, and membership links an NPC to a Group. \
             Check the entity kinds on both ends."
        )
    )]
    InvalidEndpoint { kind: &'static str, side: &'static str },
}

// ---------------------------------------------------------------------------
// Embedding errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EmbedError {
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    #[diagnostic(
        code(lore::embed::dim_mismatch),
        help(
            "All claim vectors must share the configured embedding dimension. \
             Check `EngineConfig::embedding_dim` against the embedding model's \
             output size, then re-embed the mismatched claim."
        )
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("HNSW index error: {message}")]
    #[diagnostic(
        code(lore::embed::index),
        help("The HNSW approximate nearest-neighbor index encountered an internal error.")
    )]
    Index { message: String },

    #[error("embedding backend request failed: {message}")]
    #[diagnostic(
        code(lore::embed::backend),
        help(
            "The embedding service is unreachable or returned an error. \
             Check that Ollama is running and the embedding model is pulled."
        )
    )]
    Backend { message: String },

    #[error("failed to parse embedding response: {message}")]
    #[diagnostic(
        code(lore::embed::parse),
        help("The embedding service returned an unexpected response format.")
    )]
    Parse { message: String },
}

// ---------------------------------------------------------------------------
// Retrieval errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum RetrieveError {
    #[error("entity not found: {name}")]
    #[diagnostic(
        code(lore::retrieve::entity_not_found),
        help(
            "No entity with this name exists in the graph. Entity names are \
             exact-match natural keys; check spelling and capitalization."
        )
    )]
    EntityNotFound { name: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Embed(#[from] EmbedError),
}

// ---------------------------------------------------------------------------
// LLM errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum LlmError {
    #[error("language model backend is not available at {url}")]
    #[diagnostic(
        code(lore::llm::unavailable),
        help("Start Ollama with `ollama serve`, or configure a different base URL.")
    )]
    Unavailable { url: String },

    #[error("language model request failed: {message}")]
    #[diagnostic(
        code(lore::llm::request_failed),
        help("Check that the backend is running and the configured model is pulled.")
    )]
    RequestFailed { message: String },

    #[error("failed to parse language model response: {message}")]
    #[diagnostic(
        code(lore::llm::parse_error),
        help("The model returned an unexpected response format.")
    )]
    ParseError { message: String },
}

// ---------------------------------------------------------------------------
// Engine errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("invalid configuration: {message}")]
    #[diagnostic(
        code(lore::engine::invalid_config),
        help("Check the EngineConfig fields. {message}")
    )]
    InvalidConfig { message: String },

    #[error("no language model client configured")]
    #[diagnostic(
        code(lore::engine::llm_not_configured),
        help(
            "Reply generation needs a chat backend. Construct the engine with \
             `Engine::with_llm(...)` or call `retrieve_and_render` directly \
             and hand the prompt to your own client."
        )
    )]
    LlmNotConfigured,
}

/// Convenience alias for functions returning loreweave results.
pub type LoreResult<T> = std::result::Result<T, LoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_error_converts_to_lore_error() {
        let err = GraphError::DuplicateEntity { name: "Bruno".into() };
        let lore: LoreError = err.into();
        assert!(matches!(lore, LoreError::Graph(GraphError::DuplicateEntity { .. })));
    }

    #[test]
    fn retrieve_error_wraps_embed_error() {
        let embed = EmbedError::DimensionMismatch { expected: 1024, actual: 384 };
        let retrieve: RetrieveError = embed.into();
        assert!(matches!(retrieve, RetrieveError::Embed(EmbedError::DimensionMismatch { .. })));
    }

    #[test]
    fn error_display_messages_are_descriptive() {
        let err = EmbedError::DimensionMismatch { expected: 1024, actual: 384 };
        let msg = format!("{err}");
        assert!(msg.contains("1024"));
        assert!(msg.contains("384"));
    }
}
