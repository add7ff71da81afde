//! Core search types: modes, options, candidates, and result payloads.

use crate::config;
use crate::store::{DocId, Document};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Retrieval strategy for one search call.
///
/// Pure per-call dispatch, not a stateful machine: each call selects one
/// of four mutually exclusive pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Lexical branch only, store ranking returned directly
    Text,
    /// Vector branch only; yields empty results when no embedding is
    /// available (degraded mode, not an error)
    Vector,
    /// Both branches merged with reciprocal rank fusion, no reranking
    HybridRrf,
    /// Both branches, fusion, then the multi-signal reranker
    #[default]
    HybridRerank,
}

impl SearchMode {
    /// Wire name of this mode, matching [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Text => "text",
            SearchMode::Vector => "vector",
            SearchMode::HybridRrf => "hybrid-rrf",
            SearchMode::HybridRerank => "hybrid-rerank",
        }
    }
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = SearchError;

    /// Parses a mode string at the API boundary.
    ///
    /// An unknown mode is a programmer error and fails loudly, unlike
    /// the runtime degradations which are absorbed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(SearchMode::Text),
            "vector" => Ok(SearchMode::Vector),
            "hybrid-rrf" => Ok(SearchMode::HybridRrf),
            "hybrid-rerank" => Ok(SearchMode::HybridRerank),
            other => Err(SearchError::UnknownMode(other.to_string())),
        }
    }
}

/// Per-call search parameters.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Retrieval strategy (default: hybrid with reranking)
    pub mode: SearchMode,
    /// Page size; must be > 0
    pub limit: usize,
    /// Number of ranked results to skip before the page starts
    pub offset: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            mode: SearchMode::default(),
            limit: config::DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

/// Engine-level tuning knobs, preloaded with the [`config`] defaults.
///
/// All ranking constants are parameters here rather than hardcoded at
/// call sites.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Hits fetched per retrieval branch before fusion
    pub candidate_size: usize,
    /// Per-branch time budget (native targets only)
    pub branch_timeout: Duration,
    /// RRF smoothing constant k
    pub rrf_k: usize,
    /// Trust split toward the vector branch in fusion; lexical gets the
    /// complement
    pub vector_weight: f32,
    /// Reranker signal weights and decay parameters
    pub rerank: RerankWeights,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            candidate_size: config::DEFAULT_CANDIDATE_SIZE,
            branch_timeout: Duration::from_secs(config::BRANCH_TIMEOUT_SECS),
            rrf_k: super::fusion::RRF_K,
            vector_weight: config::DEFAULT_VECTOR_WEIGHT,
            rerank: RerankWeights::default(),
        }
    }
}

/// Weights and decay parameters for the multi-signal reranker.
///
/// The four signal weights need not sum to 1; with the defaults they do,
/// which keeps final scores roughly in [0, 1].
#[derive(Debug, Clone)]
pub struct RerankWeights {
    /// Weight of normalized vector similarity (semantic intent)
    pub vector: f32,
    /// Weight of normalized lexical relevance (exact-term precision)
    pub lexical: f32,
    /// Weight of the recency-decay signal
    pub recency: f32,
    /// Weight of the visit-count popularity signal
    pub popularity: f32,
    /// Half-life of the recency decay, in days
    pub half_life_days: f32,
    /// Additive bonus for a case-insensitive query substring in the title
    pub title_bonus: f32,
}

impl Default for RerankWeights {
    fn default() -> Self {
        Self {
            vector: 0.5,
            lexical: 0.3,
            recency: 0.1,
            popularity: 0.1,
            half_life_days: config::RECENCY_HALF_LIFE_DAYS,
            title_bonus: config::TITLE_MATCH_BONUS,
        }
    }
}

/// Ephemeral per-query ranking state for one document.
///
/// Produced by fusion from the two branch lists, consumed by the
/// reranker; never persisted. Ranks are 0-based positions in their
/// source list; `None` means the document was not a hit in that branch.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// The document under consideration
    pub doc: Document,
    /// 0-based position in the lexical result list
    pub lexical_rank: Option<usize>,
    /// Raw lexical relevance score
    pub lexical_score: Option<f32>,
    /// 0-based position in the vector result list
    pub vector_rank: Option<usize>,
    /// Cosine distance from the vector branch (smaller = more similar)
    pub vector_distance: Option<f32>,
    /// Reciprocal-rank-fusion score
    pub fused_score: f32,
    /// Reranker output; equals `fused_score` until reranking runs
    pub final_score: f32,
}

/// One entry of the final ranked page, shaped for downstream UI/chat
/// consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedDocument {
    /// Document id
    pub id: DocId,
    /// Page URL
    pub url: String,
    /// Page title
    pub title: String,
    /// Leading slice of the page body
    pub snippet: String,
    /// Optional digest
    pub summary: Option<String>,
    /// Host portion of the URL, when parseable
    pub domain: Option<String>,
    /// Millisecond timestamp of the most recent visit
    pub last_visit_at: u64,
    /// Visit counter
    pub visit_count: u32,
    /// Mode-dependent score: raw lexical relevance (`text`), similarity
    /// (`vector`), fused score (`hybrid-rrf`), or final rerank score
    /// (`hybrid-rerank`)
    pub score: f32,
}

/// Search call result.
#[derive(Debug, Clone)]
pub struct SearchResponse {
    /// Ranked page of results; empty is a valid "no results" outcome
    pub results: Vec<RankedDocument>,
    /// Whether the vector branch was usable for this call. `false` means
    /// the engine degraded to lexical-only retrieval.
    pub vector_search_available: bool,
}

/// Errors surfaced to search callers.
///
/// Only programmer errors reach here; expected degradations (embedder
/// down, one branch failing) are absorbed internally and logged.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    /// Mode string not one of the four defined modes
    #[error("Unknown search mode: {0}")]
    UnknownMode(String),
    /// Structurally invalid request (e.g. zero limit)
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    /// Storage backend failure during ingestion
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl From<crate::store::StoreError> for SearchError {
    fn from(e: crate::store::StoreError) -> Self {
        SearchError::StorageError(e.to_string())
    }
}
