//! Hybrid search over the personal history store.
//!
//! This module implements the two-stage retrieval pipeline:
//! - **Candidate generation**: lexical (BM25) and vector (HNSW cosine)
//!   branches probed concurrently
//! - **Weighted Reciprocal Rank Fusion** to merge the two rankings
//! - **Multi-signal reranking** (relevance, similarity, recency,
//!   popularity) over the fused candidate set
//!
//! # Architecture
//!
//! - `types`: modes, options, config, candidates, result payloads
//! - `candidates`: concurrent branch probes with per-branch degradation
//! - `fusion`: weighted RRF merge of the two ranked lists
//! - `rerank`: second-stage scorer plus the optional cross-encoder seam
//! - `engine`: [`HistorySearchEngine`] orchestrating the four modes
//!
//! # Modes
//!
//! A search call runs in one of four mutually exclusive modes: `text`
//! (lexical only), `vector` (semantic only), `hybrid-rrf` (both branches
//! fused), and `hybrid-rerank` (fused then reranked, the default).
//! Degradations are silent by design: a dead embedder or a failed branch
//! narrows the result set instead of erroring, and the response carries a
//! `vector_search_available` flag so callers can surface the degradation.

pub mod candidates;
mod engine;
pub mod fusion;
pub mod rerank;
pub mod types;

pub use engine::HistorySearchEngine;
pub use rerank::CrossEncoder;
pub use types::{
    Candidate, RankedDocument, RerankWeights, SearchConfig, SearchError, SearchMode,
    SearchOptions, SearchResponse,
};
