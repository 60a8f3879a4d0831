//! vectra — an in-memory vector search service for retrieval-augmented
//! generation workloads.
//!
//! Stores text documents, splits them into chunks, embeds each chunk
//! through an external provider, and serves approximate or exact
//! k-nearest-neighbor queries over the resulting vectors.
//!
//! # Modules
//!
//! - [`index`] — the three interchangeable vector index implementations
//!   (exhaustive, KD-tree, LSH) behind a shared [`index::VectorIndex`] trait.
//!   This is the core of the crate.
//! - [`catalog`] — the process-wide, lock-guarded store of libraries,
//!   documents, and chunks.
//! - [`chunker`] — splits document text into indexable fragments.
//! - [`embedder`] — the external embedding collaborator.
//! - [`service`] — orchestrates the above into create/read/delete/search
//!   operations.
//! - [`http`] — the Axum HTTP surface exposing the service layer.
//! - [`config`] — startup configuration: index/chunker selection, CLI.
//! - [`error`] — shared error types.

pub mod catalog;
pub mod chunker;
pub mod config;
pub mod embedder;
pub mod error;
pub mod http;
pub mod index;
mod simd;
pub mod service;

pub use catalog::{Catalog, Chunk, Document, Library};
pub use config::Config;
pub use error::{IndexError, Result, VectraError};
pub use service::{DateRange, SearchHit, Service};
