//! Service layer: orchestrates the catalog, the vector index, the chunker,
//! and the embedder into the create/read/delete/search operations exposed
//! over HTTP (see [`crate::http`]).
//!
//! # Locking
//!
//! The catalog's write lock and the index's `RwLock` are always acquired in
//! the same order — catalog first, then index — and only from inside a
//! single [`Catalog::with_write_lock`] closure, so a write operation's
//! catalog and index mutations land together. `search` only ever takes the
//! index's read lock; it resolves hits against the catalog afterward and
//! silently drops any id the catalog no longer has (see [`Self::search`]).
//!
//! `create_document` is the one operation with a genuine `.await` in its
//! critical path (the embedding call). Embedding happens *before* the
//! catalog lock is acquired, and the parent library's existence is
//! rechecked once the lock is held, discarding the new document if it was
//! deleted out from under the in-flight embedding request.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::catalog::{Catalog, Chunk, Document, Library};
use crate::chunker::Chunker;
use crate::embedder::{EmbeddingClient, InputType};
use crate::error::{Result, VectraError};
use crate::index::VectorIndex;

/// A single hit from [`Service::search`]: a chunk plus the score the index
/// assigned it (similarity or distance, depending on the configured index —
/// see [`crate::index::IndexKind`]).
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub chunk: Chunk,
    pub score: f32,
}

/// Inclusive timestamp range used to filter [`Service::search`] results.
#[derive(Debug, Clone, Copy)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.from <= ts && ts <= self.to
    }
}

/// Orchestrates the catalog, index, chunker, and embedder.
pub struct Service {
    catalog: Catalog,
    index: RwLock<Box<dyn VectorIndex>>,
    embedder: Arc<dyn EmbeddingClient>,
    chunker: Chunker,
}

impl Service {
    pub fn new(
        index: Box<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingClient>,
        chunker: Chunker,
    ) -> Self {
        Self {
            catalog: Catalog::new(),
            index: RwLock::new(index),
            embedder,
            chunker,
        }
    }

    /// Create a new, empty library. Rejects a duplicate name with
    /// [`VectraError::Conflict`].
    pub fn create_library(
        &self,
        name: String,
        description: Option<String>,
        metadata: HashMap<String, Value>,
    ) -> Result<Library> {
        self.catalog.with_write_lock(|w| {
            if w.library_name_exists(&name) {
                return Err(VectraError::Conflict(format!(
                    "library named '{name}' already exists"
                )));
            }
            let library = Library {
                id: Uuid::new_v4(),
                name,
                description,
                metadata,
                document_ids: Vec::new(),
                created_at: Utc::now(),
            };
            w.insert_library(library.clone());
            tracing::info!(library_id = %library.id, "created library");
            Ok(library)
        })
    }

    /// All documents belonging to `library_id`, in insertion order.
    pub fn read_library(&self, library_id: Uuid) -> Result<Vec<Document>> {
        self.catalog.documents_of(library_id)
    }

    /// Delete a library and every document/chunk it owns, from both the
    /// catalog and the index, atomically.
    pub fn delete_library(&self, library_id: Uuid) -> Result<()> {
        self.catalog.with_write_lock(|w| {
            let removed_chunks = w.remove_library(library_id)?;
            let mut index = self.index.write().expect("index lock poisoned");
            for chunk_id in removed_chunks {
                index.remove(chunk_id);
            }
            tracing::info!(library_id = %library_id, "deleted library");
            Ok(())
        })
    }

    /// Chunk, embed, and index `content`, attaching it to `library_id` as a
    /// new document. Returns [`VectraError::NotFound`] if the library does
    /// not exist (checked once up front, and rechecked after embedding in
    /// case it was deleted concurrently).
    pub async fn create_document(
        &self,
        library_id: Uuid,
        title: String,
        content: String,
        metadata: HashMap<String, Value>,
    ) -> Result<Document> {
        // Fail fast if the library is already gone; avoids paying for an
        // embedding call we know will be thrown away.
        self.catalog.get_library(library_id)?;

        let fragments = self.chunker.chunk(&content);
        let vectors = self
            .embedder
            .embed_batch(&fragments, InputType::Document)
            .await?;
        debug_assert_eq!(fragments.len(), vectors.len());

        let now = Utc::now();
        let document_id = Uuid::new_v4();
        let chunks: Vec<Chunk> = fragments
            .into_iter()
            .map(|text| Chunk {
                id: Uuid::new_v4(),
                document_id,
                content: text,
                metadata: HashMap::new(),
                created_at: now,
            })
            .collect();

        self.catalog.with_write_lock(|w| {
            // Recheck: the library may have been deleted while we were
            // waiting on the embedder. If so, discard everything we just
            // computed instead of leaking index entries for an orphaned
            // document.
            if w.get_library(library_id).is_none() {
                return Err(VectraError::NotFound(format!("library {library_id}")));
            }

            let chunk_ids: Vec<Uuid> = chunks.iter().map(|c| c.id).collect();
            {
                let mut index = self.index.write().expect("index lock poisoned");
                let mut added = Vec::with_capacity(chunks.len());
                for (chunk, vector) in chunks.iter().zip(vectors.into_iter()) {
                    if let Err(err) = index.add(chunk.id, vector) {
                        // Roll back every chunk this write already committed to
                        // the index before the failure, so no index entry is
                        // left without a matching catalog chunk.
                        for id in added {
                            index.remove(id);
                        }
                        return Err(err.into());
                    }
                    added.push(chunk.id);
                }
            }
            for chunk in chunks {
                w.insert_chunk(chunk);
            }

            let document = Document {
                id: document_id,
                library_id,
                title,
                content,
                metadata,
                chunk_ids,
                created_at: now,
            };
            w.insert_document(document.clone())?;
            tracing::info!(document_id = %document.id, library_id = %library_id, "created document");
            Ok(document)
        })
    }

    /// Look up a document by id.
    pub fn read_document(&self, document_id: Uuid) -> Result<Document> {
        self.catalog.get_document(document_id)
    }

    /// Delete a document and its chunks, from both the catalog and the index.
    pub fn delete_document(&self, document_id: Uuid) -> Result<()> {
        self.catalog.with_write_lock(|w| {
            let removed_chunks = w.remove_document(document_id)?;
            let mut index = self.index.write().expect("index lock poisoned");
            for chunk_id in removed_chunks {
                index.remove(chunk_id);
            }
            tracing::info!(document_id = %document_id, "deleted document");
            Ok(())
        })
    }

    /// Embed `query`, run `knn_search` against the index, and resolve hits
    /// to their [`Chunk`] records. Hits whose chunk has since been evicted
    /// from the catalog are dropped; an optional `date_range` further
    /// filters by chunk timestamp. Index-supplied ordering is preserved.
    pub async fn search(
        &self,
        query: &str,
        k: usize,
        date_range: Option<DateRange>,
    ) -> Result<Vec<SearchHit>> {
        let query_vector = self.embedder.embed(query, InputType::Query).await?;

        let raw_hits = {
            let index = self.index.read().expect("index lock poisoned");
            index.knn_search(&query_vector, k)?
        };

        let hits = raw_hits
            .into_iter()
            .filter_map(|(id, score)| {
                self.catalog
                    .get_chunk(id)
                    .map(|chunk| SearchHit { chunk, score })
            })
            .filter(|hit| date_range.map_or(true, |range| range.contains(hit.chunk.created_at)))
            .collect();

        tracing::debug!(k, query_len = query.len(), "search completed");
        Ok(hits)
    }

    /// The dimension fixed by the index, if any vectors have been added yet.
    pub fn index_dimension(&self) -> Option<usize> {
        self.index.read().expect("index lock poisoned").dimension()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::exhaustive::ExhaustiveIndex;

    fn service() -> Service {
        Service::new(
            Box::new(ExhaustiveIndex::new()),
            Arc::new(crate::embedder::Embedder::new("test-key").unwrap()),
            Chunker::new(crate::chunker::ChunkingStrategy::Sentence),
        )
    }

    #[test]
    fn duplicate_library_name_is_conflict() {
        let svc = service();
        svc.create_library("A".into(), None, HashMap::new()).unwrap();
        let err = svc
            .create_library("A".into(), None, HashMap::new())
            .unwrap_err();
        assert!(matches!(err, VectraError::Conflict(_)));
    }

    #[test]
    fn unknown_library_lookup_is_not_found() {
        let svc = service();
        let err = svc.read_library(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, VectraError::NotFound(_)));
    }

    #[tokio::test]
    async fn create_document_rejects_unknown_library() {
        let svc = service();
        let err = svc
            .create_document(Uuid::new_v4(), "t".into(), "hello.".into(), HashMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, VectraError::NotFound(_)));
    }
}
