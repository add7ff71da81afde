//! Production configuration constants.
//!
//! These are the defaults observed to work well for a personal-history
//! corpus (tens of thousands of pages at most). All of them are also
//! exposed as fields on the runtime config structs in [`crate::search`],
//! so callers can tune without recompiling; the constants here exist so
//! that defaults are defined in exactly one place.

/// Embedding vector dimension.
///
/// The sentence-embedding models used for client-side history search
/// (MiniLM-class) produce 384-dimensional vectors. Must match the
/// embedding provider's output.
pub const EMBEDDING_DIM: usize = 384;

/// Whether embeddings are L2-normalized.
///
/// Embeddings are unit length at creation time, which keeps cosine
/// distance well defined and lets dot product stand in for cosine
/// similarity.
pub const EMBEDDINGS_NORMALIZED: bool = true;

/// Candidates fetched from each retrieval branch per query.
///
/// Both the lexical and the vector branch return at most this many hits
/// before fusion. 200 gives the reranker enough headroom without making
/// candidate hydration noticeable on constrained hardware.
pub const DEFAULT_CANDIDATE_SIZE: usize = 200;

/// Trust apportioned to the vector branch during rank fusion.
///
/// Exact-keyword lexical search tends to be noisier on short queries, so
/// fusion is biased toward semantic similarity. The lexical branch gets
/// the complement (0.4). Tunable, not a fixed requirement.
pub const DEFAULT_VECTOR_WEIGHT: f32 = 0.6;

/// Default result page size when the caller does not specify a limit.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Upper bound on how long a retrieval branch may run before it is
/// treated as failed and contributes an empty list.
///
/// This may run on constrained hardware; degrading to partial results
/// beats hanging a search indefinitely.
pub const BRANCH_TIMEOUT_SECS: u64 = 5;

/// Recency half-life used by the reranker, in days.
///
/// Visit recency decays as `exp(-days / half_life)`: very recent visits
/// dominate and the signal fades smoothly instead of cutting off.
/// Distinct from any retention-window concept in capture plumbing.
pub const RECENCY_HALF_LIFE_DAYS: f32 = 30.0;

/// Additive bonus when the query appears in a page title
/// (case-insensitive substring).
///
/// A cheap precision boost that pure rank fusion can miss.
pub const TITLE_MATCH_BONUS: f32 = 0.05;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_weight_is_a_valid_split() {
        assert!(DEFAULT_VECTOR_WEIGHT > 0.0 && DEFAULT_VECTOR_WEIGHT < 1.0);
    }

    #[test]
    fn candidate_size_leaves_rerank_headroom() {
        assert!(DEFAULT_CANDIDATE_SIZE >= 2 * DEFAULT_PAGE_SIZE);
    }
}
