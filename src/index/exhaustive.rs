//! Brute-force cosine similarity index.
//!
//! Computes cosine similarity against every stored vector. No build step,
//! no approximation — exact top-k at `O(n * d)` per query. Appropriate for
//! small-to-medium corpora or as a correctness baseline for the other two
//! variants.

use super::{check_dimension, VectorIndex};
use crate::error::IndexError;
use crate::simd;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use uuid::Uuid;

/// Exhaustive (brute-force) cosine similarity index.
pub struct ExhaustiveIndex {
    vectors: HashMap<Uuid, Vec<f32>>,
    dimension: Option<usize>,
}

impl ExhaustiveIndex {
    /// Create a new, empty index.
    pub fn new() -> Self {
        Self {
            vectors: HashMap::new(),
            dimension: None,
        }
    }
}

impl Default for ExhaustiveIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(PartialEq)]
struct FloatOrd(f32);
impl Eq for FloatOrd {}
impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(std::cmp::Ordering::Equal)
    }
}

impl VectorIndex for ExhaustiveIndex {
    fn add(&mut self, id: Uuid, vector: Vec<f32>) -> Result<(), IndexError> {
        check_dimension(&mut self.dimension, vector.len())?;
        self.vectors.insert(id, vector);
        Ok(())
    }

    fn remove(&mut self, id: Uuid) {
        self.vectors.remove(&id);
    }

    fn knn_search(&self, query: &[f32], k: usize) -> Result<Vec<(Uuid, f32)>, IndexError> {
        if let Some(expected) = self.dimension {
            if query.len() != expected {
                return Err(IndexError::DimensionMismatch {
                    expected,
                    actual: query.len(),
                });
            }
        }

        if k == 0 || self.vectors.is_empty() {
            return Ok(Vec::new());
        }

        // Min-heap keyed on similarity: pays off once k is small relative to n,
        // since we only ever hold k candidates instead of sorting everything.
        let mut heap: BinaryHeap<Reverse<(FloatOrd, Uuid)>> = BinaryHeap::with_capacity(k + 1);

        for (id, vector) in &self.vectors {
            let score = simd::cosine(query, vector);
            if heap.len() < k {
                heap.push(Reverse((FloatOrd(score), *id)));
            } else if let Some(&Reverse((FloatOrd(min_score), _))) = heap.peek() {
                if score > min_score {
                    heap.pop();
                    heap.push(Reverse((FloatOrd(score), *id)));
                }
            }
        }

        let mut results: Vec<(Uuid, f32)> = heap
            .into_iter()
            .map(|Reverse((FloatOrd(score), id))| (id, score))
            .collect();
        results.sort_unstable_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(results)
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_exact_match_first() {
        let mut idx = ExhaustiveIndex::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        idx.add(a, vec![1.0, 0.0]).unwrap();
        idx.add(b, vec![0.707, 0.707]).unwrap();

        let results = idx.knn_search(&[1.0, 0.0], 10).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, a);
        assert!((results[0].1 - 1.0).abs() < 1e-3);
    }

    #[test]
    fn dimension_fixed_on_first_add() {
        let mut idx = ExhaustiveIndex::new();
        idx.add(Uuid::new_v4(), vec![1.0, 2.0, 3.0]).unwrap();
        let err = idx.add(Uuid::new_v4(), vec![1.0, 2.0]).unwrap_err();
        assert_eq!(
            err,
            IndexError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn remove_is_idempotent() {
        let mut idx = ExhaustiveIndex::new();
        let id = Uuid::new_v4();
        idx.add(id, vec![1.0, 0.0]).unwrap();
        idx.remove(id);
        idx.remove(id);
        assert!(idx.is_empty());
    }

    #[test]
    fn zero_vector_query_does_not_panic() {
        let mut idx = ExhaustiveIndex::new();
        idx.add(Uuid::new_v4(), vec![0.0, 0.0]).unwrap();
        let results = idx.knn_search(&[0.0, 0.0], 5).unwrap();
        assert_eq!(results[0].1, 0.0);
    }

    #[test]
    fn k_zero_returns_empty() {
        let mut idx = ExhaustiveIndex::new();
        idx.add(Uuid::new_v4(), vec![1.0, 0.0]).unwrap();
        assert!(idx.knn_search(&[1.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn last_write_wins_on_duplicate_add() {
        let mut idx = ExhaustiveIndex::new();
        let id = Uuid::new_v4();
        idx.add(id, vec![1.0, 0.0]).unwrap();
        idx.add(id, vec![0.0, 1.0]).unwrap();
        assert_eq!(idx.len(), 1);
        let results = idx.knn_search(&[0.0, 1.0], 1).unwrap();
        assert!((results[0].1 - 1.0).abs() < 1e-3);
    }
}
