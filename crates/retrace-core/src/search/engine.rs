// HistorySearchEngine - mode dispatch over the two-stage pipeline

use super::candidates::generate;
use super::fusion::weighted_reciprocal_rank_fusion;
use super::rerank::{apply_cross_encoder, rerank, CrossEncoder};
use super::types::{
    Candidate, RankedDocument, SearchConfig, SearchError, SearchMode, SearchOptions,
    SearchResponse,
};
use crate::embedding::Embedder;
use crate::store::{current_millis, DocId, Document, DocumentStore};
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

/// Maximum snippet length, in characters.
const SNIPPET_CHARS: usize = 240;

/// Search engine over a personal browsing-history store.
///
/// Owns the store, the embedding capability, and the tuning config, and
/// dispatches each search call to one of four retrieval pipelines (see
/// [`SearchMode`]). The engine itself holds no per-query state; every
/// call ranks against the store's current contents.
///
/// Error policy: the only errors a search call returns are programmer
/// errors (a zero page size; an unknown mode is rejected even earlier,
/// at [`SearchMode`] parse time). A missing embedder, a failed branch,
/// or an empty store all produce valid, possibly empty, responses.
pub struct HistorySearchEngine<S: DocumentStore> {
    pub(crate) store: S,
    pub(crate) embedder: Embedder,
    config: SearchConfig,
    cross_encoder: Option<Box<dyn CrossEncoder>>,
}

impl<S: DocumentStore> HistorySearchEngine<S> {
    /// Creates an engine with default tuning over `store`.
    pub fn new(store: S, embedder: Embedder) -> Self {
        Self::with_config(store, embedder, SearchConfig::default())
    }

    /// Creates an engine with explicit tuning.
    pub fn with_config(store: S, embedder: Embedder, config: SearchConfig) -> Self {
        Self {
            store,
            embedder,
            config,
            cross_encoder: None,
        }
    }

    /// Installs an optional second-stage neural scorer.
    ///
    /// Only the `hybrid-rerank` mode consults it; when installed, its
    /// scores replace the heuristic rerank scores.
    pub fn set_cross_encoder(&mut self, encoder: Box<dyn CrossEncoder>) {
        self.cross_encoder = Some(encoder);
    }

    /// Swaps the embedding capability (e.g. when a model finishes
    /// loading after startup).
    pub fn set_embedder(&mut self, embedder: Embedder) {
        self.embedder = embedder;
    }

    /// The underlying document store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The current embedding capability.
    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    /// The active tuning configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Runs a search against the current wall clock.
    pub async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchResponse, SearchError> {
        self.search_at(query, options, current_millis()).await
    }

    /// Runs a search with an explicit "now" timestamp.
    ///
    /// The timestamp only feeds the recency signal of the reranker;
    /// passing a fixed value makes `hybrid-rerank` output fully
    /// deterministic, which tests and evaluation harnesses rely on.
    #[instrument(skip_all, fields(mode = %options.mode, limit = options.limit, offset = options.offset))]
    pub async fn search_at(
        &self,
        query: &str,
        options: &SearchOptions,
        now_ms: u64,
    ) -> Result<SearchResponse, SearchError> {
        if options.limit == 0 {
            return Err(SearchError::InvalidQuery(
                "Page size (limit) must be greater than 0".to_string(),
            ));
        }

        let wants_vector = !matches!(options.mode, SearchMode::Text);
        let has_query_text = !query.trim().is_empty();

        // One embedding call per search, shared by whichever branches run.
        let query_vector = if wants_vector && has_query_text {
            self.embedder.try_embed(query).await
        } else {
            None
        };

        // "Available" means the vector branch could actually run for this
        // call; when the call never needed a vector, report the standing
        // capability instead.
        let vector_search_available = if wants_vector && has_query_text {
            query_vector.is_some()
        } else {
            self.embedder.is_available()
        };

        let results = match options.mode {
            SearchMode::Text => self.text_mode(query, options).await,
            SearchMode::Vector => self.vector_mode(query_vector.as_deref(), options).await,
            SearchMode::HybridRrf | SearchMode::HybridRerank => {
                self.hybrid_mode(query, query_vector.as_deref(), options, now_ms)
                    .await
            }
        };

        debug!(
            mode = %options.mode,
            results = results.len(),
            vector_search_available,
            "Search complete"
        );

        Ok(SearchResponse {
            results,
            vector_search_available,
        })
    }

    /// Lexical-only pipeline; the store's ranking is returned directly.
    async fn text_mode(&self, query: &str, options: &SearchOptions) -> Vec<RankedDocument> {
        let depth = options.offset + options.limit;
        let lists = generate(
            &self.store,
            Some(query),
            None,
            depth,
            self.config.branch_timeout,
        )
        .await;

        let ids: Vec<DocId> = lists.lexical.iter().map(|h| h.doc_id).collect();
        let scores: HashMap<DocId, f32> =
            lists.lexical.iter().map(|h| (h.doc_id, h.score)).collect();

        let docs = self.hydrate(&ids).await;
        paginate(
            docs.into_iter().map(|doc| {
                let score = scores.get(&doc.id).copied().unwrap_or(0.0);
                to_ranked(doc, score)
            }),
            options,
        )
    }

    /// Vector-only pipeline; scores are cosine similarity (`1 - distance`).
    ///
    /// With no query vector (embedder down, or an empty query) this is
    /// the empty result set: degraded, not an error.
    async fn vector_mode(
        &self,
        query_vector: Option<&[f32]>,
        options: &SearchOptions,
    ) -> Vec<RankedDocument> {
        if query_vector.is_none() {
            return Vec::new();
        }

        let depth = options.offset + options.limit;
        let lists = generate(
            &self.store,
            None,
            query_vector,
            depth,
            self.config.branch_timeout,
        )
        .await;

        let ids: Vec<DocId> = lists.vector.iter().map(|h| h.doc_id).collect();
        let similarities: HashMap<DocId, f32> = lists
            .vector
            .iter()
            .map(|h| (h.doc_id, (1.0 - h.distance).clamp(0.0, 1.0)))
            .collect();

        let docs = self.hydrate(&ids).await;
        paginate(
            docs.into_iter().map(|doc| {
                let score = similarities.get(&doc.id).copied().unwrap_or(0.0);
                to_ranked(doc, score)
            }),
            options,
        )
    }

    /// Shared pipeline for the two hybrid modes: both branches at full
    /// candidate depth, weighted RRF, then either the fused ranking
    /// directly (`hybrid-rrf`) or the multi-signal reranker over the
    /// fused head (`hybrid-rerank`).
    async fn hybrid_mode(
        &self,
        query: &str,
        query_vector: Option<&[f32]>,
        options: &SearchOptions,
        now_ms: u64,
    ) -> Vec<RankedDocument> {
        let lists = generate(
            &self.store,
            Some(query),
            query_vector,
            self.config.candidate_size,
            self.config.branch_timeout,
        )
        .await;

        let lexical_ids: Vec<DocId> = lists.lexical.iter().map(|h| h.doc_id).collect();
        let vector_ids: Vec<DocId> = lists.vector.iter().map(|h| h.doc_id).collect();

        let mut fused = weighted_reciprocal_rank_fusion(
            &lexical_ids,
            &vector_ids,
            self.config.rrf_k,
            self.config.vector_weight,
        );

        // Rank over enough fused head to serve the requested page plus
        // headroom; reranking never reaches below this cut.
        let fusion_depth = 2 * (options.offset + options.limit);
        fused.truncate(fusion_depth);

        let fused_ids: Vec<DocId> = fused.iter().map(|(id, _)| *id).collect();
        let fused_scores: HashMap<DocId, f32> = fused.into_iter().collect();
        let docs = self.hydrate(&fused_ids).await;

        if options.mode == SearchMode::HybridRrf {
            return paginate(
                docs.into_iter().map(|doc| {
                    let score = fused_scores.get(&doc.id).copied().unwrap_or(0.0);
                    to_ranked(doc, score)
                }),
                options,
            );
        }

        // hybrid-rerank: carry each candidate's branch evidence into the
        // second-stage scorer.
        let lexical_by_id: HashMap<DocId, (usize, f32)> = lists
            .lexical
            .iter()
            .enumerate()
            .map(|(rank, h)| (h.doc_id, (rank, h.score)))
            .collect();
        let vector_by_id: HashMap<DocId, (usize, f32)> = lists
            .vector
            .iter()
            .enumerate()
            .map(|(rank, h)| (h.doc_id, (rank, h.distance)))
            .collect();

        let mut candidates: Vec<Candidate> = docs
            .into_iter()
            .map(|doc| {
                let fused_score = fused_scores.get(&doc.id).copied().unwrap_or(0.0);
                let lexical = lexical_by_id.get(&doc.id);
                let vector = vector_by_id.get(&doc.id);
                Candidate {
                    lexical_rank: lexical.map(|(rank, _)| *rank),
                    lexical_score: lexical.map(|(_, score)| *score),
                    vector_rank: vector.map(|(rank, _)| *rank),
                    vector_distance: vector.map(|(_, distance)| *distance),
                    fused_score,
                    final_score: fused_score,
                    doc,
                }
            })
            .collect();

        rerank(&mut candidates, query, now_ms, &self.config.rerank);
        if let Some(encoder) = &self.cross_encoder {
            apply_cross_encoder(&mut candidates, query, encoder.as_ref());
        }

        paginate(
            candidates
                .into_iter()
                .map(|c| to_ranked(c.doc, c.final_score)),
            options,
        )
    }

    /// Fetches result rows, absorbing storage failures into an empty page.
    async fn hydrate(&self, ids: &[DocId]) -> Vec<Document> {
        match self.store.get_batch(ids).await {
            Ok(docs) => docs,
            Err(e) => {
                warn!(error = %e, "Result hydration failed, returning empty page");
                Vec::new()
            }
        }
    }
}

/// Applies offset/limit to an already fully ranked sequence.
fn paginate(
    ranked: impl Iterator<Item = RankedDocument>,
    options: &SearchOptions,
) -> Vec<RankedDocument> {
    ranked.skip(options.offset).take(options.limit).collect()
}

/// Shapes a stored document into a result payload.
fn to_ranked(doc: Document, score: f32) -> RankedDocument {
    let snippet: String = doc.text.chars().take(SNIPPET_CHARS).collect();
    let domain = url::Url::parse(&doc.url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string));
    RankedDocument {
        id: doc.id,
        url: doc.url,
        title: doc.title,
        snippet,
        summary: doc.summary,
        domain,
        last_visit_at: doc.last_visit_at,
        visit_count: doc.visit_count,
        score,
    }
}
