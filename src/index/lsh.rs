//! Locality-sensitive hashing (LSH) index.
//!
//! Approximate cosine similarity via random hyperplane projections: `T`
//! independent hash tables, each with `H` random hyperplanes. A vector's
//! hashcode in a table is the sign bit of its dot product against each of
//! that table's hyperplanes. A query unions the candidate buckets across
//! all `T` tables, then rescues the union with exact cosine similarity.
//!
//! Each hyperplane's components are drawn i.i.d. from a standard normal
//! distribution, so its orientation is uniform over the unit sphere — a
//! uniform `[-1, 1]^D` draw would instead bias orientations toward the
//! hypercube's diagonals. Hyperplanes are frozen on the first `add` and
//! reused for the lifetime of the index — recall is a function of how well
//! those planes separate the data, and nothing here attempts to re-tune it
//! (see Non-goals).

use super::{check_dimension, VectorIndex};
use crate::error::IndexError;
use crate::simd;
use rand::Rng;
use rand_distr::StandardNormal;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use uuid::Uuid;

/// Hyperplane-count and table-count parameters for [`LshIndex`].
#[derive(Debug, Clone)]
pub struct LshParams {
    /// Number of independent hash tables.
    pub num_tables: usize,
    /// Number of random hyperplanes (hash bits) per table.
    pub num_hashes: usize,
}

impl Default for LshParams {
    fn default() -> Self {
        Self {
            num_tables: 5,
            num_hashes: 10,
        }
    }
}

/// Random-hyperplane LSH index for approximate cosine similarity search.
pub struct LshIndex {
    params: LshParams,
    dimension: Option<usize>,
    vectors: HashMap<Uuid, Vec<f32>>,
    /// `planes[table][hash_fn]` is a random hyperplane normal vector.
    planes: Vec<Vec<Vec<f32>>>,
    /// `hash_tables[table][hashcode] -> ids in that bucket`.
    hash_tables: Vec<HashMap<u64, HashSet<Uuid>>>,
}

impl LshIndex {
    /// Create a new, empty index with the given table/hyperplane counts.
    pub fn new(params: LshParams) -> Self {
        Self {
            params,
            dimension: None,
            vectors: HashMap::new(),
            planes: Vec::new(),
            hash_tables: Vec::new(),
        }
    }

    fn init_planes(&mut self, dim: usize) {
        let mut rng = rand::thread_rng();
        self.planes = (0..self.params.num_tables)
            .map(|_| {
                (0..self.params.num_hashes)
                    .map(|_| (0..dim).map(|_| rng.sample(StandardNormal)).collect())
                    .collect()
            })
            .collect();
        self.hash_tables = (0..self.params.num_tables).map(|_| HashMap::new()).collect();
    }

    fn hash(&self, vector: &[f32], table_idx: usize) -> u64 {
        let mut code = 0u64;
        for plane in &self.planes[table_idx] {
            let bit = if simd::dot(vector, plane) >= 0.0 { 1 } else { 0 };
            code = (code << 1) | bit;
        }
        code
    }
}

impl Default for LshIndex {
    fn default() -> Self {
        Self::new(LshParams::default())
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

impl VectorIndex for LshIndex {
    fn add(&mut self, id: Uuid, vector: Vec<f32>) -> Result<(), IndexError> {
        check_dimension(&mut self.dimension, vector.len())?;

        if self.planes.is_empty() {
            self.init_planes(vector.len());
        }

        // add() is an upsert: clear stale bucket membership before re-hashing.
        if let Some(old) = self.vectors.get(&id) {
            for table_idx in 0..self.params.num_tables {
                let code = self.hash(old, table_idx);
                if let Some(bucket) = self.hash_tables[table_idx].get_mut(&code) {
                    bucket.remove(&id);
                }
            }
        }

        for table_idx in 0..self.params.num_tables {
            let code = self.hash(&vector, table_idx);
            self.hash_tables[table_idx].entry(code).or_default().insert(id);
        }
        self.vectors.insert(id, vector);
        Ok(())
    }

    fn remove(&mut self, id: Uuid) {
        if let Some(vector) = self.vectors.remove(&id) {
            for table_idx in 0..self.params.num_tables {
                let code = self.hash(&vector, table_idx);
                if let Some(bucket) = self.hash_tables[table_idx].get_mut(&code) {
                    bucket.remove(&id);
                }
            }
        }
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

        if k == 0 || self.vectors.is_empty() || self.planes.is_empty() {
            return Ok(Vec::new());
        }

        let mut candidates: HashSet<Uuid> = HashSet::new();
        for table_idx in 0..self.params.num_tables {
            let code = self.hash(query, table_idx);
            if let Some(bucket) = self.hash_tables[table_idx].get(&code) {
                candidates.extend(bucket.iter().copied());
            }
        }

        let mut heap: BinaryHeap<Reverse<(FloatOrd, Uuid)>> = BinaryHeap::with_capacity(k + 1);
        for id in candidates {
            let Some(vector) = self.vectors.get(&id) else {
                continue;
            };
            let score = simd::cosine(query, vector);
            if heap.len() < k {
                heap.push(Reverse((FloatOrd(score), id)));
            } else if let Some(&Reverse((FloatOrd(min_score), _))) = heap.peek() {
                if score > min_score {
                    heap.pop();
                    heap.push(Reverse((FloatOrd(score), id)));
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
