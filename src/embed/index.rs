//! Claim vector index: HNSW approximate nearest-neighbor search.
//!
//! Maps claim ids to embedding vectors and answers top-k cosine-similarity
//! queries. Re-embedding a claim inserts a fresh HNSW point for the same
//! claim id; search deduplicates by claim, keeping the best score.

use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use anndists::dist::DistCosine;
use dashmap::DashMap;
use hnsw_rs::hnsw::Hnsw;

use crate::error::EmbedError;
use crate::model::ClaimId;

use super::EmbedResult;

/// A search hit from the claim index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClaimMatch {
    /// The matching claim.
    pub claim: ClaimId,
    /// Cosine similarity (1.0 = identical direction).
    pub score: f32,
}

/// HNSW-backed vector index over claim embeddings.
pub struct ClaimIndex {
    /// The ANN index. Point payloads are internal ids mapped back to claims.
    hnsw: RwLock<Hnsw<'static, f32, DistCosine>>,
    /// HNSW internal id → claim id.
    id_to_claim: DashMap<usize, ClaimId>,
    /// Next HNSW internal id to assign.
    next_id: AtomicUsize,
    /// Expected vector dimension.
    dim: usize,
}

// Safety: Hnsw uses internal synchronization via atomics/locks.
// The RwLock wrapper provides the outer synchronization needed.
unsafe impl Send for ClaimIndex {}
unsafe impl Sync for ClaimIndex {}

impl ClaimIndex {
    /// Create a new empty index.
    ///
    /// `max_claims` is a capacity hint for the HNSW layer structure.
    pub fn new(dim: usize, max_claims: usize) -> Self {
        // max_nb_connection 16 and ef_construction 200 are the standard
        // defaults for moderate dimensions; layer count follows log2 of the
        // expected element count.
        let max_layer = (max_claims as f64).log2().ceil() as usize;
        let max_layer = max_layer.clamp(4, 16);
        let hnsw = Hnsw::new(max_layer, max_claims, 16, 200, DistCosine {});

        Self {
            hnsw: RwLock::new(hnsw),
            id_to_claim: DashMap::new(),
            next_id: AtomicUsize::new(0),
            dim,
        }
    }

    /// Index a claim's embedding vector.
    pub fn insert(&self, claim: ClaimId, vector: &[f32]) -> EmbedResult<()> {
        if vector.len() != self.dim {
            return Err(EmbedError::DimensionMismatch {
                expected: self.dim,
                actual: vector.len(),
            });
        }

        let internal = self.next_id.fetch_add(1, Ordering::Relaxed);
        // insert takes &self; the read guard is enough.
        let hnsw = self.hnsw.read().map_err(|_| EmbedError::Index {
            message: "HNSW lock poisoned".into(),
        })?;
        hnsw.insert((vector, internal));
        drop(hnsw);

        self.id_to_claim.insert(internal, claim);
        Ok(())
    }

    /// Search for the `k` claims most similar to the query vector.
    ///
    /// Returns matches sorted by descending similarity, one per claim.
    pub fn search(&self, query: &[f32], k: usize) -> EmbedResult<Vec<ClaimMatch>> {
        if query.len() != self.dim {
            return Err(EmbedError::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }
        if self.id_to_claim.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let ef_search = (k * 2).max(32);
        let hnsw = self.hnsw.read().map_err(|_| EmbedError::Index {
            message: "HNSW lock poisoned".into(),
        })?;
        let neighbours = hnsw.search(query, k, ef_search);
        drop(hnsw);

        let mut matches: Vec<ClaimMatch> = Vec::with_capacity(neighbours.len());
        for n in neighbours {
            let Some(claim) = self.id_to_claim.get(&n.d_id).map(|c| *c.value()) else {
                continue;
            };
            let score = 1.0 - n.distance;
            // Re-embedded claims have multiple points; keep the best.
            match matches.iter_mut().find(|m| m.claim == claim) {
                Some(existing) => existing.score = existing.score.max(score),
                None => matches.push(ClaimMatch { claim, score }),
            }
        }
        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        Ok(matches)
    }

    /// Number of indexed points (re-embeddings count separately).
    pub fn len(&self) -> usize {
        self.id_to_claim.len()
    }

    /// Whether the index holds no points.
    pub fn is_empty(&self) -> bool {
        self.id_to_claim.is_empty()
    }
}

impl std::fmt::Debug for ClaimIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimIndex")
            .field("dim", &self.dim)
            .field("points", &self.id_to_claim.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim(id: u64) -> ClaimId {
        ClaimId::new(id).unwrap()
    }

    fn unit(mut v: Vec<f32>) -> Vec<f32> {
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        for x in v.iter_mut() {
            *x /= norm;
        }
        v
    }

    #[test]
    fn search_ranks_by_similarity() {
        let index = ClaimIndex::new(4, 100);
        index.insert(claim(1), &unit(vec![1.0, 0.0, 0.0, 0.0])).unwrap();
        index.insert(claim(2), &unit(vec![0.0, 1.0, 0.0, 0.0])).unwrap();
        index.insert(claim(3), &unit(vec![0.9, 0.1, 0.0, 0.0])).unwrap();

        let hits = index.search(&unit(vec![1.0, 0.0, 0.0, 0.0]), 3).unwrap();
        assert_eq!(hits[0].claim, claim(1));
        assert_eq!(hits[1].claim, claim(3));
        assert!(hits[0].score > hits[1].score);
        assert!(hits[1].score > hits[2].score);
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let index = ClaimIndex::new(4, 100);
        let err = index.insert(claim(1), &[1.0, 0.0]).unwrap_err();
        assert!(matches!(err, EmbedError::DimensionMismatch { expected: 4, actual: 2 }));
    }

    #[test]
    fn empty_index_returns_no_matches() {
        let index = ClaimIndex::new(4, 100);
        let hits = index.search(&[1.0, 0.0, 0.0, 0.0], 5).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn reembedded_claim_appears_once() {
        let index = ClaimIndex::new(4, 100);
        index.insert(claim(1), &unit(vec![1.0, 0.0, 0.0, 0.0])).unwrap();
        index.insert(claim(1), &unit(vec![0.9, 0.1, 0.0, 0.0])).unwrap();

        let hits = index.search(&unit(vec![1.0, 0.0, 0.0, 0.0]), 4).unwrap();
        assert_eq!(hits.iter().filter(|m| m.claim == claim(1)).count(), 1);
    }
}
