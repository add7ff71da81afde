//! HNSW vector index with cosine distance.
//!
//! Uses rust-cv/hnsw, which supports incremental insertion and has no
//! native dependencies (WASM-compatible). HNSW has no true deletion, so
//! re-embedding a page on revisit tombstones the old graph position and
//! inserts the new vector; tombstoned positions are filtered out of
//! search results.

use super::{validate_dimension, DocId, StoreError, VectorHit};
use hnsw::{Hnsw, Searcher};
use space::{Metric, Neighbor};
use std::collections::{HashMap, HashSet};

/// Minimum ef_search parameter for HNSW queries.
///
/// ef_search trades recall for speed; we use `max(k * 2, MIN_EF_SEARCH)`
/// to scale with the requested result count while keeping a quality
/// floor. The HNSW paper recommends ef_search >= k.
const MIN_EF_SEARCH: usize = 50;

/// Scale factor between f32 cosine distance in [0, 2] and the u32 units
/// the hnsw crate requires its metric to produce.
const DISTANCE_SCALE: f32 = u32::MAX as f32 / 2.0;

/// Cosine distance metric over owned, heap-stable embeddings.
///
/// Computes `1 - cosine_similarity`, scaled to u32 as the crate requires.
struct CosineDistance;

impl Metric<Box<[f32]>> for CosineDistance {
    type Unit = u32;

    fn distance(&self, a: &Box<[f32]>, b: &Box<[f32]>) -> u32 {
        let a_slice: &[f32] = a;
        let b_slice: &[f32] = b;

        let dot: f32 = a_slice
            .iter()
            .zip(b_slice.iter())
            .map(|(&x, &y)| x * y)
            .sum();
        let mag_a: f32 = a_slice.iter().map(|x| x * x).sum::<f32>().sqrt();
        let mag_b: f32 = b_slice.iter().map(|y| y * y).sum::<f32>().sqrt();

        if mag_a == 0.0 || mag_b == 0.0 {
            return u32::MAX; // maximum distance for zero vectors
        }

        let cosine_sim = dot / (mag_a * mag_b);
        let distance = 1.0 - cosine_sim; // similarity -> distance in [0, 2]

        (distance * DISTANCE_SCALE) as u32
    }
}

/// Vector index mapping document ids to embeddings.
///
/// Holds the HNSW graph plus the bookkeeping to support URL-keyed upserts:
/// a position map from [`DocId`] to its live graph slot, and a tombstone
/// set for slots replaced by a re-embed.
pub struct VectorIndex {
    /// HNSW graph. M=16 / M0=32 per the Malkov & Yashunin paper's
    /// recommendation for balanced recall and memory.
    index: Hnsw<CosineDistance, Box<[f32]>, rand::rngs::StdRng, 16, 32>,
    /// Searcher scratch state, mutated during queries
    searcher: Searcher<u32>,
    /// Graph slot -> document id, in insertion order
    doc_ids: Vec<DocId>,
    /// Document id -> live graph slot
    positions: HashMap<DocId, usize>,
    /// Replaced graph slots, filtered from results
    tombstones: HashSet<usize>,
    /// Embedding dimensionality
    dimension: usize,
}

impl VectorIndex {
    /// Creates an empty index for `dimension`-length embeddings.
    pub fn new(dimension: usize) -> Self {
        Self {
            index: Hnsw::new(CosineDistance),
            searcher: Searcher::default(),
            doc_ids: Vec::new(),
            positions: HashMap::new(),
            tombstones: HashSet::new(),
            dimension,
        }
    }

    /// Inserts or replaces the embedding for `doc_id`.
    ///
    /// A previous embedding for the same document is tombstoned; the new
    /// vector gets a fresh graph slot. Incremental, no rebuild.
    pub fn upsert(&mut self, doc_id: DocId, embedding: Vec<f32>) -> Result<(), StoreError> {
        validate_dimension(self.dimension, embedding.len())?;

        if let Some(&old_slot) = self.positions.get(&doc_id) {
            self.tombstones.insert(old_slot);
        }

        let slot = self.doc_ids.len();
        self.doc_ids.push(doc_id);
        self.positions.insert(doc_id, slot);
        self.index
            .insert(embedding.into_boxed_slice(), &mut self.searcher);
        Ok(())
    }

    /// Returns up to `k` nearest documents as (id, cosine distance) hits,
    /// closest first. Distance is in [0, 2]; smaller is more similar.
    pub fn search(
        &mut self,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<VectorHit>, StoreError> {
        validate_dimension(self.dimension, query_embedding.len())?;

        if self.doc_ids.is_empty() {
            return Ok(vec![]);
        }

        // Over-fetch so tombstoned slots don't eat into the requested k.
        let fetch = std::cmp::min(k + self.tombstones.len(), self.doc_ids.len());
        let mut neighbors = vec![
            Neighbor {
                index: !0,
                distance: !0
            };
            fetch
        ];

        let ef_search = std::cmp::max(fetch * 2, MIN_EF_SEARCH);
        let query_box = query_embedding.to_vec().into_boxed_slice();
        self.index
            .nearest(&query_box, ef_search, &mut self.searcher, &mut neighbors);

        let results = neighbors
            .into_iter()
            .filter(|n| n.index != !0) // unfilled entries
            .filter(|n| !self.tombstones.contains(&n.index))
            .map(|neighbor| VectorHit {
                doc_id: self.doc_ids[neighbor.index],
                distance: (neighbor.distance as f32 / DISTANCE_SCALE).clamp(0.0, 2.0),
            })
            .take(k)
            .collect();
        Ok(results)
    }

    /// Drops the embedding for `doc_id`, if any.
    ///
    /// Used when a row loses its embedding (e.g. bulk re-ingestion while
    /// the embedder is down) so the index never returns documents whose
    /// row has no vector.
    pub fn remove(&mut self, doc_id: DocId) {
        if let Some(slot) = self.positions.remove(&doc_id) {
            self.tombstones.insert(slot);
        }
    }

    /// Number of live (non-tombstoned) embeddings.
    pub fn len(&self) -> usize {
        self.doc_ids.len() - self.tombstones.len()
    }

    /// Whether the index holds no live embeddings.
    #[allow(dead_code)] // Public API
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
