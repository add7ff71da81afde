//! Error types for embedding operations.
//!
//! Search and store errors live next to their modules
//! ([`crate::search::SearchError`], [`crate::store::StoreError`]); the
//! embedding taxonomy is shared between the provider trait and the
//! capability wrapper, so it lives here.

use thiserror::Error;

/// Errors that can occur while producing an embedding.
///
/// Per the degradation policy, none of these reach a search caller: the
/// engine absorbs them and falls back to lexical-only retrieval. They are
/// surfaced to ingestion callers, which may choose to retry.
#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    /// Model not loaded or backend not ready
    #[error("Embedding backend unavailable: {0}")]
    Unavailable(String),
    /// Inference ran and failed
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    /// Provider returned a vector of the wrong length
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected embedding dimension
        expected: usize,
        /// Actual embedding dimension received
        actual: usize,
    },
}

impl From<String> for EmbeddingError {
    fn from(s: String) -> Self {
        EmbeddingError::InferenceFailed(s)
    }
}
