//! # Retrace Core
//!
//! Platform-independent retrieval core for a client-side browsing-history
//! search engine. Pages the user visits are ingested into a document store;
//! queries run through a two-stage hybrid pipeline: lexical and vector
//! candidate generation, reciprocal rank fusion, and a multi-signal reranker.
//!
//! Everything runs in-process with no server. The embedding backend is an
//! optional capability: when it is unavailable the engine degrades to
//! lexical-only retrieval instead of failing.
//!
//! ## Modules
//!
//! - [`search`] - Hybrid search (candidate generation + weighted RRF + reranking)
//! - [`store`] - Document store trait and in-memory reference implementation
//! - [`ingest`] - Visit ingestion lifecycle (create / revisit / re-embed)
//! - [`embedding`] - Embedding provider trait and availability capability
//! - [`queue`] - Summarization backlog work queue
//! - [`retry`] - Generic retry-with-backoff for flaky transports
//! - [`config`] - Production tuning constants
//! - [`error`] - Embedding error types
//!
//! ## Concurrency model
//!
//! Single-threaded cooperative. The only internal concurrency is the two
//! candidate-generation branches, which are issued together and awaited
//! together. On native targets the per-branch time budget uses the host's
//! tokio runtime; on WASM the budget is a no-op and the host may race the
//! search future itself.

pub mod config;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod queue;
pub mod retry;
pub mod search;
pub mod store;

pub use embedding::{Embedder, EmbeddingProvider};
pub use ingest::PageVisit;
pub use queue::{QueueStatus, SummaryQueue};
pub use retry::{with_retry, RetryPolicy};
pub use search::{
    CrossEncoder, HistorySearchEngine, RankedDocument, RerankWeights, SearchConfig, SearchError,
    SearchMode, SearchOptions, SearchResponse,
};
pub use store::{DocId, Document, DocumentStore, MemoryStore, PageRecord, StoreError};
