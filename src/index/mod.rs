//! Vector index implementations sharing a common add/remove/knn_search contract.
//!
//! Three variants are available — [`exhaustive::ExhaustiveIndex`],
//! [`kdtree::KdTreeIndex`], and [`lsh::LshIndex`] — modeled as a tagged
//! alternative set behind the [`VectorIndex`] trait. Exactly one variant is
//! instantiated per process, chosen by [`IndexKind`] at startup.
//!
//! All three fix their dimension from the first vector they receive and
//! reject later insertions (and queries) of a different dimension with
//! [`IndexError::DimensionMismatch`].

pub mod exhaustive;
pub mod kdtree;
pub mod lsh;

use crate::error::IndexError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Selects which index implementation a process instantiates at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// Brute-force cosine similarity over every stored vector.
    Exhaustive,
    /// Axis-cycling binary space partition with squared-Euclidean distance.
    KdTree,
    /// Random-hyperplane locality sensitive hashing, approximate cosine.
    Lsh,
}

/// Capability set shared by every index variant.
///
/// `knn_search` always returns results ordered from *most relevant* to
/// *least relevant*: callers never need to know whether a given variant's
/// underlying metric is a similarity (higher is better) or a distance
/// (lower is better) — each implementation handles that inversion
/// internally before returning.
pub trait VectorIndex: Send + Sync {
    /// Insert or overwrite the vector stored under `id`.
    ///
    /// The first call fixes the index's dimension; every subsequent `add`
    /// or `knn_search` with a differently-sized vector is rejected.
    fn add(&mut self, id: Uuid, vector: Vec<f32>) -> Result<(), IndexError>;

    /// Remove the vector stored under `id`, if present. A missing id is a no-op.
    fn remove(&mut self, id: Uuid);

    /// Return up to `k` nearest neighbors of `query`, best match first.
    fn knn_search(&self, query: &[f32], k: usize) -> Result<Vec<(Uuid, f32)>, IndexError>;

    /// The dimension fixed by the first insertion, or `None` if still empty.
    fn dimension(&self) -> Option<usize>;

    /// Number of vectors currently stored.
    fn len(&self) -> usize;

    /// Whether the index holds no vectors.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Construct a fresh, empty index for the given variant. `lsh_params` is
/// only consulted when `kind` is [`IndexKind::Lsh`].
pub fn build_index(kind: IndexKind, lsh_params: lsh::LshParams) -> Box<dyn VectorIndex> {
    match kind {
        IndexKind::Exhaustive => Box::new(exhaustive::ExhaustiveIndex::new()),
        IndexKind::KdTree => Box::new(kdtree::KdTreeIndex::new()),
        IndexKind::Lsh => Box::new(lsh::LshIndex::new(lsh_params)),
    }
}

/// Checks a vector's dimension against a previously fixed dimension,
/// fixing it on the caller's behalf if `current` is `None`.
pub(crate) fn check_dimension(
    current: &mut Option<usize>,
    vector_len: usize,
) -> Result<(), IndexError> {
    match *current {
        None => {
            *current = Some(vector_len);
            Ok(())
        }
        Some(expected) if expected == vector_len => Ok(()),
        Some(expected) => Err(IndexError::DimensionMismatch {
            expected,
            actual: vector_len,
        }),
    }
}
