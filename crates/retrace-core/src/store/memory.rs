//! In-memory document store.
//!
//! Reference implementation of [`DocumentStore`]: rows in hash maps, a
//! BM25 lexical index, and an HNSW cosine index, all behind one lock.
//! Nothing is persisted; this is the test backend and the starting point
//! for persistent implementations.

use super::lexical::LexicalIndex;
use super::vector::VectorIndex;
use super::{DocId, Document, DocumentStore, LexicalHit, PageRecord, StoreError, VectorHit};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

struct Inner {
    docs: HashMap<u64, Document>,
    ids_by_url: HashMap<String, u64>,
    next_id: u64,
    lexical: LexicalIndex,
    vectors: VectorIndex,
}

impl Inner {
    fn new(dimension: usize) -> Self {
        Self {
            docs: HashMap::new(),
            ids_by_url: HashMap::new(),
            next_id: 1,
            lexical: LexicalIndex::new(),
            vectors: VectorIndex::new(dimension),
        }
    }
}

/// In-memory [`DocumentStore`] backed by BM25 and HNSW indexes.
///
/// Single lock around rows and indexes: ingestion is serialized through
/// one store owner, and searches take the lock only for the duration of
/// an index probe, never for the duration of ranking.
pub struct MemoryStore {
    inner: Mutex<Inner>,
    dimension: usize,
}

impl MemoryStore {
    /// Creates an empty store for `dimension`-length embeddings.
    pub fn new(dimension: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::new(dimension)),
            dimension,
        }
    }

    fn locked(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {e}")))
    }
}

#[async_trait::async_trait(?Send)]
impl DocumentStore for MemoryStore {
    async fn lexical_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<LexicalHit>, StoreError> {
        let inner = self.locked()?;

        // Empty query is "browse recent history", not a relevance match.
        if query.trim().is_empty() {
            let mut docs: Vec<&Document> = inner.docs.values().collect();
            docs.sort_by(|a, b| {
                b.last_visit_at
                    .cmp(&a.last_visit_at)
                    .then_with(|| a.id.cmp(&b.id))
            });
            return Ok(docs
                .into_iter()
                .take(limit)
                .map(|doc| LexicalHit {
                    doc_id: doc.id,
                    score: 0.0,
                })
                .collect());
        }

        Ok(inner
            .lexical
            .search(query, limit)
            .into_iter()
            .map(|(doc_id, score)| LexicalHit { doc_id, score })
            .collect())
    }

    async fn vector_search(
        &self,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<VectorHit>, StoreError> {
        let mut inner = self.locked()?;
        inner.vectors.search(query_vector, limit)
    }

    async fn upsert(&self, page: PageRecord) -> Result<Document, StoreError> {
        let mut inner = self.locked()?;

        let id = match inner.ids_by_url.get(&page.url) {
            Some(&id) => DocId::from_u64(id),
            None => {
                let id = inner.next_id;
                inner.next_id += 1;
                inner.ids_by_url.insert(page.url.clone(), id);
                DocId::from_u64(id)
            }
        };

        let previous_embedding = inner
            .docs
            .get(&id.as_u64())
            .and_then(|doc| doc.embedding.clone());

        let doc = Document {
            id,
            url: page.url,
            title: page.title,
            text: page.text,
            summary: page.summary,
            embedding: page.embedding,
            first_visit_at: page.first_visit_at,
            last_visit_at: page.last_visit_at,
            visit_count: page.visit_count,
        };

        inner.lexical.upsert(id, &doc.title, &doc.text);
        match (&doc.embedding, &previous_embedding) {
            (Some(new), old) if old.as_ref() != Some(new) => {
                inner.vectors.upsert(id, new.clone())?;
            }
            (None, Some(_)) => inner.vectors.remove(id),
            _ => {} // unchanged vector, or still none
        }

        debug!(
            doc_id = id.as_u64(),
            url = %doc.url,
            visit_count = doc.visit_count,
            "Upserted document"
        );

        inner.docs.insert(id.as_u64(), doc.clone());
        Ok(doc)
    }

    async fn get(&self, url: &str) -> Result<Option<Document>, StoreError> {
        let inner = self.locked()?;
        Ok(inner
            .ids_by_url
            .get(url)
            .and_then(|id| inner.docs.get(id))
            .cloned())
    }

    async fn get_batch(&self, ids: &[DocId]) -> Result<Vec<Document>, StoreError> {
        let inner = self.locked()?;
        Ok(ids
            .iter()
            .filter_map(|id| inner.docs.get(&id.as_u64()).cloned())
            .collect())
    }

    async fn document_count(&self) -> Result<usize, StoreError> {
        Ok(self.locked()?.docs.len())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut inner = self.locked()?;
        *inner = Inner::new(self.dimension);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str, title: &str, text: &str, last_visit_at: u64) -> PageRecord {
        PageRecord {
            url: url.to_string(),
            title: title.to_string(),
            text: text.to_string(),
            summary: None,
            embedding: None,
            first_visit_at: last_visit_at,
            last_visit_at,
            visit_count: 1,
        }
    }

    #[tokio::test]
    async fn upsert_assigns_stable_ids_by_url() {
        let store = MemoryStore::new(3);
        let a = store.upsert(page("https://a.example", "A", "alpha", 1)).await.unwrap();
        let b = store.upsert(page("https://b.example", "B", "beta", 2)).await.unwrap();
        assert_ne!(a.id, b.id);

        // Same URL keeps its id across upserts.
        let a2 = store
            .upsert(page("https://a.example", "A v2", "alpha two", 3))
            .await
            .unwrap();
        assert_eq!(a.id, a2.id);
        assert_eq!(store.document_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn empty_query_browses_by_recency() {
        let store = MemoryStore::new(3);
        store.upsert(page("https://old.example", "Old", "old page", 100)).await.unwrap();
        store.upsert(page("https://new.example", "New", "new page", 300)).await.unwrap();
        store.upsert(page("https://mid.example", "Mid", "mid page", 200)).await.unwrap();

        let hits = store.lexical_search("", 10).await.unwrap();
        let urls: Vec<u64> = hits.iter().map(|h| h.doc_id.as_u64()).collect();

        let new = store.get("https://new.example").await.unwrap().unwrap();
        let mid = store.get("https://mid.example").await.unwrap().unwrap();
        let old = store.get("https://old.example").await.unwrap().unwrap();
        assert_eq!(urls, vec![new.id.as_u64(), mid.id.as_u64(), old.id.as_u64()]);
        assert!(hits.iter().all(|h| h.score == 0.0));
    }

    #[tokio::test]
    async fn vector_search_skips_docs_without_embedding() {
        let store = MemoryStore::new(3);
        store.upsert(page("https://plain.example", "Plain", "no vector", 1)).await.unwrap();

        let mut with_vec = page("https://vec.example", "Vec", "has vector", 2);
        with_vec.embedding = Some(vec![1.0, 0.0, 0.0]);
        let doc = store.upsert(with_vec).await.unwrap();

        let hits = store.vector_search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, doc.id);
    }

    #[tokio::test]
    async fn reembed_on_upsert_moves_the_vector() {
        let store = MemoryStore::new(3);
        let mut v1 = page("https://page.example", "Page", "first text", 1);
        v1.embedding = Some(vec![1.0, 0.0, 0.0]);
        let doc = store.upsert(v1).await.unwrap();

        let mut v2 = page("https://page.example", "Page", "rewritten text", 2);
        v2.embedding = Some(vec![0.0, 1.0, 0.0]);
        v2.visit_count = 2;
        store.upsert(v2).await.unwrap();

        let hits = store.vector_search(&[0.0, 1.0, 0.0], 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, doc.id);
        assert!(hits[0].distance < 0.01);
    }

    #[tokio::test]
    async fn get_batch_skips_missing_and_keeps_order() {
        let store = MemoryStore::new(3);
        let a = store.upsert(page("https://a.example", "A", "alpha", 1)).await.unwrap();
        let b = store.upsert(page("https://b.example", "B", "beta", 2)).await.unwrap();

        let docs = store
            .get_batch(&[b.id, DocId::from_u64(999), a.id])
            .await
            .unwrap();
        let ids: Vec<DocId> = docs.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn clear_resets_everything() {
        let store = MemoryStore::new(3);
        let mut p = page("https://a.example", "A", "alpha", 1);
        p.embedding = Some(vec![1.0, 0.0, 0.0]);
        store.upsert(p).await.unwrap();

        store.clear().await.unwrap();
        assert_eq!(store.document_count().await.unwrap(), 0);
        assert!(store.lexical_search("alpha", 10).await.unwrap().is_empty());
        assert!(store.vector_search(&[1.0, 0.0, 0.0], 10).await.unwrap().is_empty());
    }
}
