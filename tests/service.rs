//! Service-layer integration tests covering end-to-end scenarios and
//! cross-cutting invariants (duplicate library names, sentence chunking +
//! cascading delete, date-range filtered search) that need the full
//! catalog + index + service composition to observe, rather than a single
//! module in isolation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use vectra::chunker::{Chunker, ChunkingStrategy};
use vectra::embedder::{EmbeddingClient, InputType};
use vectra::error::{Result, VectraError};
use vectra::index::exhaustive::ExhaustiveIndex;
use vectra::index::kdtree::KdTreeIndex;
use vectra::{DateRange, Service};

/// Deterministic stand-in for the real embedding provider: hashes each
/// text's bytes into a fixed-width vector so the same input always
/// produces the same embedding, without any network access.
struct FakeEmbedder {
    dim: usize,
}

impl FakeEmbedder {
    fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dim];
        for (i, byte) in text.bytes().enumerate() {
            v[i % self.dim] += byte as f32;
        }
        // Keep every vector non-degenerate so cosine similarity never hits
        // the zero-norm guard.
        v[0] += 1.0;
        v
    }
}

#[async_trait]
impl EmbeddingClient for FakeEmbedder {
    async fn embed(&self, text: &str, _input_type: InputType) -> Result<Vec<f32>> {
        Ok(self.vector_for(text))
    }

    async fn embed_batch(&self, texts: &[String], _input_type: InputType) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }
}

fn sentence_service() -> Service {
    Service::new(
        Box::new(ExhaustiveIndex::new()),
        Arc::new(FakeEmbedder::new(8)),
        Chunker::new(ChunkingStrategy::Sentence),
    )
}

/// Creating a library with a name already in use is a Conflict.
#[tokio::test]
async fn duplicate_library_name_is_conflict() {
    let svc = sentence_service();
    svc.create_library("A".into(), None, HashMap::new()).unwrap();
    let err = svc
        .create_library("A".into(), None, HashMap::new())
        .unwrap_err();
    assert!(matches!(err, VectraError::Conflict(_)));
}

/// Sentence chunking produces one chunk per sentence, and deleting the
/// document removes it from the library's list and from the catalog/index.
#[tokio::test]
async fn sentence_chunks_and_cascading_delete() {
    let svc = sentence_service();
    let library = svc.create_library("L".into(), None, HashMap::new()).unwrap();

    let document = svc
        .create_document(
            library.id,
            "doc".into(),
            "One. Two. Three.".into(),
            HashMap::new(),
        )
        .await
        .unwrap();

    assert_eq!(document.chunk_ids.len(), 3);

    // Searching surfaces all three sentence chunks with their content intact.
    let hits = svc.search("One.", 10, None).await.unwrap();
    let found: Vec<&str> = hits.iter().map(|h| h.chunk.content.as_str()).collect();
    assert!(found.contains(&"One."));
    assert!(found.contains(&"Two."));
    assert!(found.contains(&"Three."));

    svc.delete_document(document.id).unwrap();

    let remaining = svc.read_library(library.id).unwrap();
    assert!(remaining.is_empty());
    assert!(svc.read_document(document.id).is_err());

    let hits_after_delete = svc.search("One.", 10, None).await.unwrap();
    assert!(hits_after_delete.is_empty());
}

/// Date-range filtering on search only returns chunks whose timestamp
/// falls within the inclusive range, preserving index-supplied order.
#[tokio::test]
async fn date_range_filters_search_results() {
    let svc = sentence_service();
    let library = svc.create_library("L".into(), None, HashMap::new()).unwrap();

    let early = svc
        .create_document(library.id, "early".into(), "Alpha content here.".into(), HashMap::new())
        .await
        .unwrap();
    let early_ts = early.created_at;

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    let cutoff = chrono::Utc::now();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let _late = svc
        .create_document(library.id, "late".into(), "Beta content here.".into(), HashMap::new())
        .await
        .unwrap();

    let range = DateRange {
        from: early_ts - chrono::Duration::seconds(1),
        to: cutoff,
    };
    let hits = svc.search("content", 10, Some(range)).await.unwrap();

    assert!(!hits.is_empty());
    for hit in &hits {
        assert!(hit.chunk.created_at <= cutoff);
        assert!(hit.chunk.content.contains("Alpha"));
    }
}

/// Every chunk id in a document's list resolves to a catalog chunk, and
/// every document id in a library's list resolves back to that library.
#[tokio::test]
async fn invariant_chunk_and_document_referential_integrity() {
    let svc = sentence_service();
    let library = svc.create_library("L".into(), None, HashMap::new()).unwrap();
    let document = svc
        .create_document(library.id, "doc".into(), "Hello world. Goodbye.".into(), HashMap::new())
        .await
        .unwrap();

    assert_eq!(document.library_id, library.id);
    let fetched = svc.read_document(document.id).unwrap();
    assert_eq!(fetched.id, document.id);

    let library_docs = svc.read_library(library.id).unwrap();
    assert!(library_docs.iter().any(|d| d.id == document.id));
}

/// Deleting a library removes every document it owned and every chunk of
/// each of those documents, from both catalog and index.
#[tokio::test]
async fn invariant_delete_library_cascades_fully() {
    let svc = sentence_service();
    let library = svc.create_library("L".into(), None, HashMap::new()).unwrap();
    let doc_a = svc
        .create_document(library.id, "a".into(), "First sentence.".into(), HashMap::new())
        .await
        .unwrap();
    let doc_b = svc
        .create_document(library.id, "b".into(), "Second sentence.".into(), HashMap::new())
        .await
        .unwrap();

    svc.delete_library(library.id).unwrap();

    assert!(svc.read_library(library.id).is_err());
    assert!(svc.read_document(doc_a.id).is_err());
    assert!(svc.read_document(doc_b.id).is_err());

    let hits = svc.search("sentence", 10, None).await.unwrap();
    assert!(hits.is_empty());
}

/// The KD-tree and exhaustive backends are interchangeable through the
/// same service API — swapping the index doesn't change create/search
/// correctness, only the score semantics (verified at the index-unit level).
#[tokio::test]
async fn kd_tree_backend_serves_the_same_service_api() {
    let svc = Service::new(
        Box::new(KdTreeIndex::new()),
        Arc::new(FakeEmbedder::new(8)),
        Chunker::new(ChunkingStrategy::FixedSize { chunk_size: 50 }),
    );
    let library = svc.create_library("L".into(), None, HashMap::new()).unwrap();
    let document = svc
        .create_document(library.id, "doc".into(), "some indexable text content".into(), HashMap::new())
        .await
        .unwrap();

    assert!(!document.chunk_ids.is_empty());
    let hits = svc.search("some indexable text content", 5, None).await.unwrap();
    assert!(!hits.is_empty());
}
