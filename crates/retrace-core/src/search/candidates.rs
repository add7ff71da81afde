//! Candidate generation: the two first-stage retrieval branches.
//!
//! Issues the lexical and vector queries concurrently (they are
//! independent read-only probes against the same store) and absorbs
//! per-branch failures: a branch that errors or exceeds its time budget
//! contributes an empty list instead of aborting the search.

use crate::store::{DocumentStore, LexicalHit, VectorHit};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// The two independently ranked candidate lists for one query.
///
/// Each list is ordered best-first by the store's own ranking (lexical:
/// relevance descending; vector: distance ascending).
#[derive(Debug, Default)]
pub struct CandidateLists {
    /// Lexical branch hits
    pub lexical: Vec<LexicalHit>,
    /// Vector branch hits; empty when no query vector was available
    pub vector: Vec<VectorHit>,
}

/// Fetches up to `branch_limit` candidates from each branch.
///
/// - `query == None` skips the lexical branch (vector-only mode);
///   `Some("")` is the browse query and still runs it.
/// - `query_vector == None` skips the vector branch entirely: degraded
///   mode, not a failure.
/// - A branch that returns an error or exceeds `branch_timeout` is
///   logged and treated as empty; the other branch proceeds
///   independently.
pub async fn generate<S: DocumentStore>(
    store: &S,
    query: Option<&str>,
    query_vector: Option<&[f32]>,
    branch_limit: usize,
    branch_timeout: Duration,
) -> CandidateLists {
    let lexical_branch = async {
        let Some(query) = query else {
            return Vec::new();
        };
        match bounded(branch_timeout, store.lexical_search(query, branch_limit)).await {
            Some(Ok(hits)) => hits,
            Some(Err(e)) => {
                warn!(error = %e, "Lexical branch failed, treating as empty");
                Vec::new()
            }
            None => {
                warn!(budget_ms = branch_timeout.as_millis() as u64, "Lexical branch timed out");
                Vec::new()
            }
        }
    };

    let vector_branch = async {
        let Some(vector) = query_vector else {
            return Vec::new();
        };
        match bounded(branch_timeout, store.vector_search(vector, branch_limit)).await {
            Some(Ok(hits)) => hits,
            Some(Err(e)) => {
                warn!(error = %e, "Vector branch failed, treating as empty");
                Vec::new()
            }
            None => {
                warn!(budget_ms = branch_timeout.as_millis() as u64, "Vector branch timed out");
                Vec::new()
            }
        }
    };

    let (lexical, vector) = futures::join!(lexical_branch, vector_branch);
    debug!(
        lexical_hits = lexical.len(),
        vector_hits = vector.len(),
        "Candidate generation complete"
    );

    CandidateLists { lexical, vector }
}

/// Runs `future` under a time budget on native targets.
///
/// Requires a tokio runtime on native. WASM has no preemptible timer
/// here, so the budget is a no-op and the host may race the whole
/// search future instead.
#[cfg(not(target_arch = "wasm32"))]
async fn bounded<F: Future>(budget: Duration, future: F) -> Option<F::Output> {
    tokio::time::timeout(budget, future).await.ok()
}

#[cfg(target_arch = "wasm32")]
async fn bounded<F: Future>(_budget: Duration, future: F) -> Option<F::Output> {
    Some(future.await)
}
