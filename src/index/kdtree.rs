//! KD-Tree (K-Dimensional Tree) index.
//!
//! Classic axis-cycling binary space partition for low-dimensional data.
//! Unlike a bulk-built KD-Tree, this one supports incremental insertion
//! (`add` descends the existing tree rather than requiring a rebuild) and
//! classical recursive deletion via the standard `findMin` technique
//! (Bentley 1975).
//!
//! `knn_search` uses squared Euclidean distance and prunes the far subtree
//! whenever the squared distance to the splitting plane cannot beat the
//! worst candidate currently held in the k-heap.
//!
//! # Non-goals
//!
//! No rebalancing: a long run of skewed inserts/deletes can degrade the
//! tree toward a linked list. Rebuilding from scratch is left to the
//! caller (not exposed here) since this index has no durability story to
//! make that decision for it.

use super::{check_dimension, VectorIndex};
use crate::error::IndexError;
use crate::simd;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use uuid::Uuid;

struct KdNode {
    id: Uuid,
    vector: Vec<f32>,
    left: Option<Box<KdNode>>,
    right: Option<Box<KdNode>>,
}

/// KD-Tree index with incremental insert and classical deletion.
///
/// Keeps a flat `id -> vector` map alongside the tree purely so that
/// `remove` can look up the target's coordinates without a parent-pointer
/// walk; the tree itself is the sole source of truth for traversal order.
pub struct KdTreeIndex {
    root: Option<Box<KdNode>>,
    vectors: HashMap<Uuid, Vec<f32>>,
    dimension: Option<usize>,
}

impl KdTreeIndex {
    /// Create a new, empty index.
    pub fn new() -> Self {
        Self {
            root: None,
            vectors: HashMap::new(),
            dimension: None,
        }
    }

    fn insert_node(
        node: Option<Box<KdNode>>,
        id: Uuid,
        vector: Vec<f32>,
        depth: usize,
        dim: usize,
    ) -> Box<KdNode> {
        match node {
            None => Box::new(KdNode {
                id,
                vector,
                left: None,
                right: None,
            }),
            Some(mut n) => {
                let axis = depth % dim;
                if vector[axis] < n.vector[axis] {
                    n.left = Some(Self::insert_node(n.left.take(), id, vector, depth + 1, dim));
                } else {
                    n.right = Some(Self::insert_node(n.right.take(), id, vector, depth + 1, dim));
                }
                n
            }
        }
    }

    /// Node with the minimum coordinate along `target_axis` within the
    /// subtree rooted at `node`.
    fn find_min<'a>(node: &'a KdNode, target_axis: usize, depth: usize, dim: usize) -> &'a KdNode {
        let axis = depth % dim;
        if axis == target_axis {
            match &node.left {
                None => node,
                Some(left) => Self::find_min(left, target_axis, depth + 1, dim),
            }
        } else {
            let mut min_node = node;
            for child in [&node.left, &node.right] {
                if let Some(child) = child {
                    let candidate = Self::find_min(child, target_axis, depth + 1, dim);
                    if candidate.vector[target_axis] < min_node.vector[target_axis] {
                        min_node = candidate;
                    }
                }
            }
            min_node
        }
    }

    /// Remove `id` from the subtree rooted at `node`. `target_vector` is the
    /// removed id's own coordinates, looked up once by the caller, since a
    /// deleted node's vector is overwritten in place during the splice.
    fn remove_node(
        node: Option<Box<KdNode>>,
        id: Uuid,
        target_vector: &[f32],
        depth: usize,
        dim: usize,
    ) -> Option<Box<KdNode>> {
        let mut node = node?;
        let axis = depth % dim;

        if node.id == id {
            if let Some(right) = node.right.take() {
                let min = Self::find_min(&right, axis, depth + 1, dim);
                let min_id = min.id;
                let min_vector = min.vector.clone();
                node.right = Self::remove_node(Some(right), min_id, &min_vector, depth + 1, dim);
                node.id = min_id;
                node.vector = min_vector;
                return Some(node);
            }
            if let Some(left) = node.left.take() {
                let min = Self::find_min(&left, axis, depth + 1, dim);
                let min_id = min.id;
                let min_vector = min.vector.clone();
                // Classical algorithm: promote the surviving left subtree to
                // the right slot when there is no right child, so the
                // "split by right-min" invariant still holds above this node.
                node.right = Self::remove_node(Some(left), min_id, &min_vector, depth + 1, dim);
                node.id = min_id;
                node.vector = min_vector;
                node.left = None;
                return Some(node);
            }
            return None;
        }

        if target_vector[axis] < node.vector[axis] {
            node.left = Self::remove_node(node.left.take(), id, target_vector, depth + 1, dim);
        } else {
            node.right = Self::remove_node(node.right.take(), id, target_vector, depth + 1, dim);
        }
        Some(node)
    }

    fn search_knn(
        node: &KdNode,
        query: &[f32],
        depth: usize,
        dim: usize,
        k: usize,
        heap: &mut BinaryHeap<(OrderedSqDist, Reverse<Uuid>)>,
    ) {
        let axis = depth % dim;
        let dist = simd::sq_euclidean(query, &node.vector);

        if heap.len() < k {
            heap.push((OrderedSqDist(dist), Reverse(node.id)));
        } else if let Some((OrderedSqDist(worst), _)) = heap.peek() {
            if dist < *worst {
                heap.pop();
                heap.push((OrderedSqDist(dist), Reverse(node.id)));
            }
        }

        let diff = query[axis] - node.vector[axis];
        let (near, far) = if diff < 0.0 {
            (&node.left, &node.right)
        } else {
            (&node.right, &node.left)
        };

        if let Some(near) = near {
            Self::search_knn(near, query, depth + 1, dim, k, heap);
        }

        let worst = heap.peek().map(|(OrderedSqDist(d), _)| *d);
        let should_visit_far = match worst {
            None => true,
            Some(w) => heap.len() < k || diff * diff < w,
        };
        if should_visit_far {
            if let Some(far) = far {
                Self::search_knn(far, query, depth + 1, dim, k, heap);
            }
        }
    }
}

impl Default for KdTreeIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(PartialEq)]
struct OrderedSqDist(f32);
impl Eq for OrderedSqDist {}
impl PartialOrd for OrderedSqDist {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for OrderedSqDist {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(std::cmp::Ordering::Equal)
    }
}

impl VectorIndex for KdTreeIndex {
    fn add(&mut self, id: Uuid, vector: Vec<f32>) -> Result<(), IndexError> {
        check_dimension(&mut self.dimension, vector.len())?;
        let dim = self.dimension.unwrap();

        // add() is an upsert: drop any existing node for this id first so we
        // never leave a duplicate reachable via two different tree paths.
        if let Some(old_vector) = self.vectors.get(&id).cloned() {
            self.root = Self::remove_node(self.root.take(), id, &old_vector, 0, dim);
        }

        self.vectors.insert(id, vector.clone());
        self.root = Some(Self::insert_node(self.root.take(), id, vector, 0, dim));
        Ok(())
    }

    fn remove(&mut self, id: Uuid) {
        let dim = match self.dimension {
            Some(d) => d,
            None => return,
        };
        if let Some(vector) = self.vectors.remove(&id) {
            self.root = Self::remove_node(self.root.take(), id, &vector, 0, dim);
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

        let dim = match self.dimension {
            Some(d) => d,
            None => return Ok(Vec::new()),
        };

        if k == 0 {
            return Ok(Vec::new());
        }

        let mut heap: BinaryHeap<(OrderedSqDist, Reverse<Uuid>)> = BinaryHeap::with_capacity(k + 1);
        if let Some(root) = &self.root {
            Self::search_knn(root, query, 0, dim, k, &mut heap);
        }

        let mut results: Vec<(Uuid, f32)> = heap
            .into_iter()
            .map(|(OrderedSqDist(dist), Reverse(id))| (id, dist))
            .collect();
        results.sort_unstable_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(results)
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }
}
