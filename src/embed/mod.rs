//! Text embedding: document/query encoding behind a narrow trait.
//!
//! Documents (claim contents) and queries (player questions) use distinct
//! encodings, following the mxbai-embed-large convention: documents are
//! embedded as-is, queries get a retrieval prefix. The prefix must match
//! between indexing time and query time or recall degrades silently.

pub mod index;

pub use index::{ClaimIndex, ClaimMatch};

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::error::EmbedError;

/// Result type for embedding operations.
pub type EmbedResult<T> = std::result::Result<T, EmbedError>;

/// Query-side encoding prefix (mxbai-embed-large convention; documents are
/// embedded without a prefix).
pub const QUERY_PREFIX: &str = "Represent this sentence for searching relevant passages: ";

/// Converts text into fixed-length vectors for retrieval.
pub trait Embedder: Send + Sync {
    /// Output vector length.
    fn dimension(&self) -> usize;

    /// Embed a document (claim content) for indexing.
    fn embed_document(&self, text: &str) -> EmbedResult<Vec<f32>>;

    /// Embed a search query. Applies the query-side encoding prefix.
    fn embed_query(&self, text: &str) -> EmbedResult<Vec<f32>>;
}

/// Deterministic hashing embedder for offline use and tests.
///
/// Folds token hashes into a fixed-length bag-of-words vector and
/// L2-normalizes it. Texts sharing tokens land near each other, which is
/// enough to exercise the retrieval pipeline without a model server.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    /// Create a hashing embedder with the given output dimension.
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn encode(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dim];
        for token in tokenize(text) {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let h = hasher.finish();
            let slot = (h % self.dim as u64) as usize;
            // Sign bit from a higher hash bit spreads tokens over both
            // halves of the axis, reducing accidental collisions.
            let sign = if h & (1 << 63) == 0 { 1.0 } else { -1.0 };
            vector[slot] += sign;
        }
        l2_normalize(&mut vector);
        vector
    }
}

impl Embedder for HashEmbedder {
    fn dimension(&self) -> usize {
        self.dim
    }

    fn embed_document(&self, text: &str) -> EmbedResult<Vec<f32>> {
        Ok(self.encode(text))
    }

    fn embed_query(&self, text: &str) -> EmbedResult<Vec<f32>> {
        Ok(self.encode(&format!("{QUERY_PREFIX}{text}")))
    }
}

/// Configuration for the Ollama embedding backend.
#[derive(Debug, Clone)]
pub struct OllamaEmbedderConfig {
    /// Base URL for the Ollama API.
    pub base_url: String,
    /// Embedding model name.
    pub model: String,
    /// Output dimension of the model.
    pub dimension: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OllamaEmbedderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".into(),
            model: "mxbai-embed-large".into(),
            dimension: 1024,
            timeout_secs: 30,
        }
    }
}

/// Embedding client for the Ollama REST API.
pub struct OllamaEmbedder {
    config: OllamaEmbedderConfig,
    agent: ureq::Agent,
}

impl OllamaEmbedder {
    /// Create a new client with the given configuration.
    pub fn new(config: OllamaEmbedderConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build();
        Self { config, agent }
    }

    fn request(&self, prompt: &str) -> EmbedResult<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.config.base_url);
        let response = self
            .agent
            .post(&url)
            .send_json(serde_json::json!({
                "model": self.config.model,
                "prompt": prompt,
            }))
            .map_err(|e| EmbedError::Backend { message: e.to_string() })?;

        let body: serde_json::Value = response
            .into_json()
            .map_err(|e| EmbedError::Parse { message: e.to_string() })?;

        let vector: Vec<f32> = body["embedding"]
            .as_array()
            .ok_or_else(|| EmbedError::Parse {
                message: "response is missing the `embedding` array".into(),
            })?
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect();

        if vector.len() != self.config.dimension {
            return Err(EmbedError::DimensionMismatch {
                expected: self.config.dimension,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }
}

impl Embedder for OllamaEmbedder {
    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn embed_document(&self, text: &str) -> EmbedResult<Vec<f32>> {
        self.request(text)
    }

    fn embed_query(&self, text: &str) -> EmbedResult<Vec<f32>> {
        self.request(&format!("{QUERY_PREFIX}{text}"))
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_embedder_is_deterministic() {
        let e = HashEmbedder::new(64);
        let a = e.embed_document("Maria is Bruno's mother.").unwrap();
        let b = e.embed_document("Maria is Bruno's mother.").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn query_encoding_differs_from_document_encoding() {
        let e = HashEmbedder::new(64);
        let doc = e.embed_document("who is your mother").unwrap();
        let query = e.embed_query("who is your mother").unwrap();
        assert_ne!(doc, query);
    }

    #[test]
    fn overlapping_texts_are_closer_than_disjoint_ones() {
        let e = HashEmbedder::new(128);
        let base = e.embed_document("maria mother bruno").unwrap();
        let near = e.embed_document("maria mother kitchen").unwrap();
        let far = e.embed_document("harvest mill autumn").unwrap();
        let dot = |a: &[f32], b: &[f32]| -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() };
        assert!(dot(&base, &near) > dot(&base, &far));
    }

    #[test]
    fn vectors_are_unit_length() {
        let e = HashEmbedder::new(64);
        let v = e.embed_document("the mill burned down in autumn").unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }
}
