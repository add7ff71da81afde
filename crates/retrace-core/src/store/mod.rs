//! Document store trait and in-memory reference implementation.
//!
//! The store holds one row per visited URL and exposes exactly the two
//! query shapes the ranking core ever issues: lexical search and vector
//! search. Everything else about persistence (on-disk format, IndexedDB,
//! SQLite) is a backend concern behind the [`DocumentStore`] trait.
//!
//! # Implementations
//!
//! - [`MemoryStore`] - in-memory store backed by a BM25 lexical index and
//!   an HNSW cosine index; reference implementation and test backend.
//! - Persistent backends (IndexedDB on web, an embedded KV store on
//!   desktop) plug in behind the same trait.

mod lexical;
mod memory;
mod vector;

pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returns the current Unix timestamp in milliseconds.
///
/// Uses `instant::SystemTime` which works on both WASM and native
/// platforms. If the system time is before UNIX_EPOCH (extremely
/// unlikely), returns 0 instead of panicking.
pub fn current_millis() -> u64 {
    instant::SystemTime::now()
        .duration_since(instant::SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Stable document identifier, assigned by the store on first insert and
/// immutable thereafter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct DocId(u64);

impl DocId {
    /// Creates a DocId from a raw u64 value.
    ///
    /// Useful for deserialization or testing; stores assign real ids.
    pub fn from_u64(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw u64 value of this id.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// One visited page. One row per distinct URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Store-assigned identifier, immutable after first insert
    pub id: DocId,
    /// Unique key; all upserts target this field
    pub url: String,
    /// Page title as captured
    pub title: String,
    /// Cleaned page body; input to both lexical indexing and embedding
    pub text: String,
    /// Optional digest; carried in result payloads, never used in ranking
    pub summary: Option<String>,
    /// Unit-length dense vector, regenerated whenever title/text change.
    /// `None` when the page was ingested while the embedder was down.
    pub embedding: Option<Vec<f32>>,
    /// Millisecond timestamp of the first visit; set once
    pub first_visit_at: u64,
    /// Millisecond timestamp of the most recent visit
    pub last_visit_at: u64,
    /// Number of visits; starts at 1, monotonically incremented
    pub visit_count: u32,
}

/// Desired state of a page row, passed to [`DocumentStore::upsert`].
///
/// Carries everything except the id: the store preserves the existing id
/// for a known URL and assigns a fresh one otherwise. The ingestion layer
/// computes counters and timestamps (it owns the visit lifecycle); the
/// store only merges by URL and maintains its indexes.
#[derive(Debug, Clone)]
pub struct PageRecord {
    /// Unique key the upsert targets
    pub url: String,
    /// Page title
    pub title: String,
    /// Cleaned page body
    pub text: String,
    /// Optional digest
    pub summary: Option<String>,
    /// Unit-length embedding, if one could be computed
    pub embedding: Option<Vec<f32>>,
    /// First-visit timestamp (ms)
    pub first_visit_at: u64,
    /// Last-visit timestamp (ms)
    pub last_visit_at: u64,
    /// Visit counter, `>= 1`
    pub visit_count: u32,
}

/// One hit from the lexical branch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LexicalHit {
    /// Matched document
    pub doc_id: DocId,
    /// Raw relevance score (BM25-like, higher is better). 0.0 for
    /// empty-query browse results, where order is the only signal.
    pub score: f32,
}

/// One hit from the vector branch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorHit {
    /// Matched document
    pub doc_id: DocId,
    /// Cosine distance in [0, 2]; smaller is more similar
    pub distance: f32,
}

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend/database failure
    #[error("Database error: {0}")]
    DatabaseError(String),
    /// Serialization/deserialization failure
    #[error("Serialization error: {0}")]
    SerializationError(String),
    /// Vector dimension mismatch (expected vs actual)
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected embedding dimension
        expected: usize,
        /// Actual embedding dimension received
        actual: usize,
    },
}

/// Validates that an embedding has the expected dimension.
pub(crate) fn validate_dimension(expected: usize, actual: usize) -> Result<(), StoreError> {
    if actual == expected {
        Ok(())
    } else {
        Err(StoreError::DimensionMismatch { expected, actual })
    }
}

/// Store contract consumed by the ranking core.
///
/// All search reads are snapshot-consistent against the store's current
/// state; concurrent ingestion may interleave with a search but must not
/// corrupt or block it. Ingestion is serialized through a single store
/// owner, so "last writer wins" is the only conflict policy needed.
#[async_trait::async_trait(?Send)]
pub trait DocumentStore {
    /// Full-text relevance search, best-first.
    ///
    /// An empty (or whitespace-only) query means "browse", not "search":
    /// the store returns all documents ordered by `last_visit_at`
    /// descending with a raw score of 0.0.
    async fn lexical_search(&self, query: &str, limit: usize)
        -> Result<Vec<LexicalHit>, StoreError>;

    /// Nearest-neighbor search over embeddings, closest-first.
    ///
    /// Distance is cosine distance in [0, 2] (smaller = more similar).
    /// Documents without an embedding are never returned.
    async fn vector_search(
        &self,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<VectorHit>, StoreError>;

    /// Inserts or replaces the row for `page.url` and updates indexes.
    ///
    /// Returns the stored document, with the preserved or freshly
    /// assigned id.
    async fn upsert(&self, page: PageRecord) -> Result<Document, StoreError>;

    /// Looks up a document by URL.
    async fn get(&self, url: &str) -> Result<Option<Document>, StoreError>;

    /// Fetches documents by id for result hydration.
    ///
    /// Missing ids are skipped, not errors; output order follows input
    /// order of the ids that were found.
    async fn get_batch(&self, ids: &[DocId]) -> Result<Vec<Document>, StoreError>;

    /// Number of documents in the store.
    async fn document_count(&self) -> Result<usize, StoreError>;

    /// Removes every document and resets all indexes (explicit bulk clear,
    /// the only deletion path).
    async fn clear(&self) -> Result<(), StoreError>;
}
