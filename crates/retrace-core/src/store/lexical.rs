//! BM25 lexical index.
//!
//! Wraps the [`bm25`](https://crates.io/crates/bm25) crate. BM25 scores
//! pages by query term frequency, inverse document frequency, and length
//! normalization. Title and body are indexed together so an exact title
//! term match is visible to the lexical branch, not just to the
//! reranker's title bonus.

use super::DocId;
use bm25::{Document, Language, SearchEngineBuilder};

/// BM25-based lexical index over page title + body.
///
/// Case-insensitive, multi-term, English tokenization and stemming.
/// Not thread-safe on its own; [`MemoryStore`](super::MemoryStore) keeps
/// it behind a lock.
pub struct LexicalIndex {
    engine: bm25::SearchEngine<u64>,
}

impl LexicalIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        let empty: Vec<Document<u64>> = vec![];
        Self {
            engine: SearchEngineBuilder::<u64>::with_documents(Language::English, empty).build(),
        }
    }

    /// Indexes (or re-indexes) a page.
    ///
    /// Upsert semantics: re-adding the same id replaces the previous
    /// contents, which is what a revisit with re-extracted text needs.
    pub fn upsert(&mut self, doc_id: DocId, title: &str, text: &str) {
        self.engine.upsert(Document {
            id: doc_id.as_u64(),
            contents: format!("{title}\n{text}"),
        });
    }

    /// Returns up to `limit` pages ranked by BM25 score descending.
    ///
    /// Empty queries and empty indexes return an empty list; the
    /// empty-query browse path is handled above this index.
    pub fn search(&self, query: &str, limit: usize) -> Vec<(DocId, f32)> {
        self.engine
            .search(query, limit)
            .into_iter()
            .map(|result| (DocId::from_u64(result.document.id), result.score))
            .collect()
    }
}

impl Default for LexicalIndex {
    fn default() -> Self {
        Self::new()
    }
}
