//! Embedding provider trait and availability capability.
//!
//! The embedding backend (an in-browser model or a local inference
//! process) may be partially unavailable: still loading, failed to load,
//! or disabled by the user. Rather than scattering null-checks through
//! ranking code, availability is modeled once as the [`Embedder`]
//! capability: callers match on it (or call [`Embedder::try_embed`]) and
//! every downstream component simply receives "a vector or not".

use crate::error::EmbeddingError;
use tracing::warn;

/// A backend that turns text into a fixed-dimension dense vector.
///
/// Implementations wrap whatever inference stack the host provides.
/// `embed` is a suspension point (model inference may take tens of
/// milliseconds) and may fail; failures are expected, not fatal.
#[async_trait::async_trait(?Send)]
pub trait EmbeddingProvider {
    /// Embeds `text` into a dense vector of [`dimension`](Self::dimension) length.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Output dimensionality of this provider.
    fn dimension(&self) -> usize {
        crate::config::EMBEDDING_DIM
    }
}

/// Embedding capability: either a usable provider or a reason it is missing.
///
/// The candidate generator's vector branch checks this once per call.
/// `Unavailable` is a degraded mode, never an error surfaced to search
/// callers; the reason string is exposed so a UI can explain the
/// capability gap.
pub enum Embedder {
    /// Backend is loaded and can be invoked.
    Available(Box<dyn EmbeddingProvider>),
    /// Backend cannot be invoked right now.
    Unavailable {
        /// Human-readable explanation (e.g. "model still downloading")
        reason: String,
    },
}

impl Embedder {
    /// Wraps a ready provider.
    pub fn available<P: EmbeddingProvider + 'static>(provider: P) -> Self {
        Embedder::Available(Box::new(provider))
    }

    /// Marks the capability as missing with an explanation.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Embedder::Unavailable {
            reason: reason.into(),
        }
    }

    /// Whether vector search is currently possible.
    pub fn is_available(&self) -> bool {
        matches!(self, Embedder::Available(_))
    }

    /// Why the capability is missing, if it is.
    pub fn unavailable_reason(&self) -> Option<&str> {
        match self {
            Embedder::Available(_) => None,
            Embedder::Unavailable { reason } => Some(reason),
        }
    }

    /// Embeds `text`, absorbing every failure mode into `None`.
    ///
    /// Returns a unit-normalized vector on success. Unavailability,
    /// inference failure, and wrong-dimension output are all logged and
    /// collapsed to `None`: the caller proceeds without a vector rather
    /// than propagating an error.
    pub async fn try_embed(&self, text: &str) -> Option<Vec<f32>> {
        let provider = match self {
            Embedder::Available(provider) => provider,
            Embedder::Unavailable { reason } => {
                warn!(reason = %reason, "Embedding unavailable, skipping vector branch");
                return None;
            }
        };

        match provider.embed(text).await {
            Ok(mut vector) => {
                if vector.len() != provider.dimension() {
                    warn!(
                        expected = provider.dimension(),
                        actual = vector.len(),
                        "Embedding has wrong dimension, discarding"
                    );
                    return None;
                }
                normalize(&mut vector);
                Some(vector)
            }
            Err(e) => {
                warn!(error = %e, "Embedding failed, proceeding without vector");
                None
            }
        }
    }
}

/// Scales `vector` to unit length in place.
///
/// Zero vectors are left untouched (there is no direction to preserve);
/// they rank last in any cosine comparison anyway.
pub fn normalize(vector: &mut [f32]) {
    let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for x in vector.iter_mut() {
            *x /= magnitude;
        }
    }
}
