//! Visit ingestion: the write half of the engine.
//!
//! One entry point per browser navigation. First visit to a URL creates
//! its document; a revisit bumps the visit counters and, when the
//! captured content actually changed, regenerates the embedding and
//! invalidates the stale summary. All of this works with no embedder:
//! documents ingested in degraded mode stay lexical-only until a later
//! revisit backfills their vector.

use crate::search::{HistorySearchEngine, SearchError};
use crate::store::{current_millis, Document, DocumentStore, PageRecord};
use tracing::{debug, info, instrument};

/// Content captured from one page navigation.
#[derive(Debug, Clone)]
pub struct PageVisit {
    /// Page URL; the store's unique key
    pub url: String,
    /// Page title as captured
    pub title: String,
    /// Cleaned page body
    pub text: String,
}

impl<S: DocumentStore> HistorySearchEngine<S> {
    /// Records a visit against the current wall clock.
    pub async fn record_visit(&self, visit: PageVisit) -> Result<Document, SearchError> {
        self.record_visit_at(visit, current_millis()).await
    }

    /// Records a visit with an explicit timestamp.
    ///
    /// First visit creates the document with `visit_count = 1` and an
    /// embedding when one can be computed. A revisit bumps
    /// `last_visit_at` and the counter; the embedding is regenerated
    /// only when title or text changed, and a previously computed vector
    /// is kept when the embedder cannot produce a fresh one (a stale
    /// vector still retrieves better than none). A content change drops
    /// the stored summary, since it described the old text.
    #[instrument(skip_all, fields(url = %visit.url, text_len = visit.text.len()))]
    pub async fn record_visit_at(
        &self,
        visit: PageVisit,
        now_ms: u64,
    ) -> Result<Document, SearchError> {
        let record = match self.store.get(&visit.url).await? {
            None => {
                let embedding = self.embed_content(&visit.title, &visit.text).await;
                PageRecord {
                    url: visit.url,
                    title: visit.title,
                    text: visit.text,
                    summary: None,
                    embedding,
                    first_visit_at: now_ms,
                    last_visit_at: now_ms,
                    visit_count: 1,
                }
            }
            Some(doc) => {
                let content_changed = doc.title != visit.title || doc.text != visit.text;
                let embedding = if content_changed {
                    match self.embed_content(&visit.title, &visit.text).await {
                        Some(vector) => Some(vector),
                        None => doc.embedding,
                    }
                } else if doc.embedding.is_none() {
                    // Embedder may have come up since the first visit.
                    self.embed_content(&visit.title, &visit.text).await
                } else {
                    doc.embedding
                };
                let summary = if content_changed { None } else { doc.summary };
                PageRecord {
                    url: visit.url,
                    title: visit.title,
                    text: visit.text,
                    summary,
                    embedding,
                    first_visit_at: doc.first_visit_at,
                    last_visit_at: now_ms,
                    visit_count: doc.visit_count.saturating_add(1),
                }
            }
        };

        let doc = self.store.upsert(record).await?;
        debug!(
            doc_id = doc.id.as_u64(),
            url = %doc.url,
            visit_count = doc.visit_count,
            has_embedding = doc.embedding.is_some(),
            "Recorded visit"
        );
        Ok(doc)
    }

    /// Attaches a generated summary to an existing document.
    ///
    /// Returns `None` when the URL is unknown (e.g. the document was
    /// cleared while its summary was being generated).
    pub async fn attach_summary(
        &self,
        url: &str,
        summary: String,
    ) -> Result<Option<Document>, SearchError> {
        let Some(doc) = self.store.get(url).await? else {
            return Ok(None);
        };
        let record = PageRecord {
            url: doc.url,
            title: doc.title,
            text: doc.text,
            summary: Some(summary),
            embedding: doc.embedding,
            first_visit_at: doc.first_visit_at,
            last_visit_at: doc.last_visit_at,
            visit_count: doc.visit_count,
        };
        Ok(Some(self.store.upsert(record).await?))
    }

    /// Number of documents currently in the history.
    pub async fn document_count(&self) -> Result<usize, SearchError> {
        Ok(self.store.document_count().await?)
    }

    /// Removes every document and resets all indexes.
    pub async fn clear_all(&self) -> Result<(), SearchError> {
        self.store.clear().await?;
        info!("Cleared all history data");
        Ok(())
    }

    async fn embed_content(&self, title: &str, text: &str) -> Option<Vec<f32>> {
        // Title carries disproportionate signal for short pages, so it is
        // embedded together with the body.
        self.embedder.try_embed(&format!("{title}\n{text}")).await
    }
}
