//! Catalog: the process-wide store of libraries, documents, and chunks.
//!
//! A single [`std::sync::Mutex`] serializes every mutation — create,
//! delete, and the chunk/index writes that ride along with them — so the
//! catalog and whichever [`crate::index::VectorIndex`] backs it never
//! drift out of sync. Reads that only need a library or document snapshot
//! take the lock just long enough to clone what they need.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::error::{Result, VectraError};

/// A named collection of documents, with its own metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Library {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub document_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A piece of source text belonging to a library, split into chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub library_id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub chunk_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A single embedded unit of text produced by the chunker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: Uuid,
    pub document_id: Uuid,
    pub content: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// In-memory state guarded by the catalog's single write lock.
struct CatalogState {
    libraries: HashMap<Uuid, Library>,
    documents: HashMap<Uuid, Document>,
    chunks: HashMap<Uuid, Chunk>,
}

/// Process-wide catalog of libraries, documents, and chunks.
///
/// Every method that mutates state takes the lock for its full duration,
/// including any index writes the caller performs inside the provided
/// closure — this is what keeps a `create_document` or `delete_library`
/// atomic with respect to the vector index (§5 of the design: embedding
/// calls happen inside this lock in the default configuration).
pub struct Catalog {
    state: Mutex<CatalogState>,
}

impl Catalog {
    /// Create a new, empty catalog.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CatalogState {
                libraries: HashMap::new(),
                documents: HashMap::new(),
                chunks: HashMap::new(),
            }),
        }
    }

    /// Run `f` with exclusive access to the catalog's state. Used by the
    /// service layer to compose multi-step writes (catalog + index) into a
    /// single atomic critical section.
    pub fn with_write_lock<T>(&self, f: impl FnOnce(&mut CatalogWriter<'_>) -> Result<T>) -> Result<T> {
        let mut guard = self.state.lock().expect("catalog lock poisoned");
        let mut writer = CatalogWriter { state: &mut guard };
        f(&mut writer)
    }

    /// Look up a library by id.
    pub fn get_library(&self, id: Uuid) -> Result<Library> {
        let state = self.state.lock().expect("catalog lock poisoned");
        state
            .libraries
            .get(&id)
            .cloned()
            .ok_or_else(|| VectraError::NotFound(format!("library {id}")))
    }

    /// Look up a document by id.
    pub fn get_document(&self, id: Uuid) -> Result<Document> {
        let state = self.state.lock().expect("catalog lock poisoned");
        state
            .documents
            .get(&id)
            .cloned()
            .ok_or_else(|| VectraError::NotFound(format!("document {id}")))
    }

    /// Look up a chunk by id. Used by the search path to resolve hits
    /// returned from the vector index back into their source text.
    pub fn get_chunk(&self, id: Uuid) -> Option<Chunk> {
        let state = self.state.lock().expect("catalog lock poisoned");
        state.chunks.get(&id).cloned()
    }

    /// All documents belonging to a library, in the order they were added.
    pub fn documents_of(&self, library_id: Uuid) -> Result<Vec<Document>> {
        let state = self.state.lock().expect("catalog lock poisoned");
        let library = state
            .libraries
            .get(&library_id)
            .ok_or_else(|| VectraError::NotFound(format!("library {library_id}")))?;
        Ok(library
            .document_ids
            .iter()
            .filter_map(|id| state.documents.get(id).cloned())
            .collect())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Mutable view into catalog state, handed to closures run under the write lock.
pub struct CatalogWriter<'a> {
    state: &'a mut CatalogState,
}

impl CatalogWriter<'_> {
    pub fn library_name_exists(&self, name: &str) -> bool {
        self.state.libraries.values().any(|lib| lib.name == name)
    }

    pub fn insert_library(&mut self, library: Library) {
        self.state.libraries.insert(library.id, library);
    }

    pub fn get_library(&self, id: Uuid) -> Option<&Library> {
        self.state.libraries.get(&id)
    }

    pub fn insert_document(&mut self, document: Document) -> Result<()> {
        let library = self
            .state
            .libraries
            .get_mut(&document.library_id)
            .ok_or_else(|| VectraError::NotFound(format!("library {}", document.library_id)))?;
        library.document_ids.push(document.id);
        self.state.documents.insert(document.id, document);
        Ok(())
    }

    pub fn insert_chunk(&mut self, chunk: Chunk) {
        self.state.chunks.insert(chunk.id, chunk);
    }

    pub fn get_chunk(&self, id: Uuid) -> Option<&Chunk> {
        self.state.chunks.get(&id)
    }

    /// Remove a document, its chunks, and its membership in its library.
    /// Returns the ids of the removed chunks so the caller can retract
    /// them from the vector index in the same critical section.
    pub fn remove_document(&mut self, document_id: Uuid) -> Result<Vec<Uuid>> {
        let document = self
            .state
            .documents
            .remove(&document_id)
            .ok_or_else(|| VectraError::NotFound(format!("document {document_id}")))?;

        for chunk_id in &document.chunk_ids {
            self.state.chunks.remove(chunk_id);
        }

        if let Some(library) = self.state.libraries.get_mut(&document.library_id) {
            library.document_ids.retain(|id| *id != document_id);
        }

        Ok(document.chunk_ids)
    }

    /// Remove a library along with every document and chunk it owns.
    /// Returns the ids of every removed chunk.
    pub fn remove_library(&mut self, library_id: Uuid) -> Result<Vec<Uuid>> {
        let library = self
            .state
            .libraries
            .remove(&library_id)
            .ok_or_else(|| VectraError::NotFound(format!("library {library_id}")))?;

        let mut removed_chunks = Vec::new();
        for document_id in library.document_ids {
            if let Some(document) = self.state.documents.remove(&document_id) {
                for chunk_id in document.chunk_ids {
                    self.state.chunks.remove(&chunk_id);
                    removed_chunks.push(chunk_id);
                }
            }
        }
        Ok(removed_chunks)
    }
}
