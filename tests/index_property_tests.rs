//! Property-based tests for the three vector index backends.
//!
//! Generates random vector sets and queries and checks the cross-backend
//! invariants from spec.md §8 that don't reduce to a single hand-picked
//! example: exhaustive/KD-tree agreement, LSH soundness, and idempotent
//! remove.

use proptest::prelude::*;
use uuid::Uuid;
use vectra::index::exhaustive::ExhaustiveIndex;
use vectra::index::kdtree::KdTreeIndex;
use vectra::index::lsh::{LshIndex, LshParams};
use vectra::index::VectorIndex;

const DIM: usize = 4;

fn arb_vector() -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-10.0f32..10.0, DIM)
}

fn arb_vector_set(max_len: usize) -> impl Strategy<Value = Vec<Vec<f32>>> {
    proptest::collection::vec(arb_vector(), 1..max_len)
}

proptest! {
    /// KD-Tree knn_search returns the same set of ids as an exhaustive scan
    /// under squared Euclidean distance (spec.md §8 property 7).
    #[test]
    fn kd_tree_matches_brute_force_squared_euclidean(
        vectors in arb_vector_set(40),
        query in arb_vector(),
        k in 1usize..10,
    ) {
        let mut kd = KdTreeIndex::new();
        let ids: Vec<Uuid> = vectors.iter().map(|_| Uuid::new_v4()).collect();
        for (id, v) in ids.iter().zip(vectors.iter()) {
            kd.add(*id, v.clone()).unwrap();
        }

        let sq_euclidean = |a: &[f32], b: &[f32]| -> f32 {
            a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
        };
        let mut brute: Vec<(Uuid, f32)> = ids
            .iter()
            .zip(vectors.iter())
            .map(|(id, v)| (*id, sq_euclidean(&query, v)))
            .collect();
        brute.sort_unstable_by(|a, b| a.1.partial_cmp(&b.1).unwrap());

        let expected: std::collections::HashSet<Uuid> =
            brute.iter().take(k.min(brute.len())).map(|(id, _)| *id).collect();
        let got = kd.knn_search(&query, k).unwrap();
        let got_ids: std::collections::HashSet<Uuid> = got.iter().map(|(id, _)| *id).collect();

        prop_assert_eq!(got.len(), expected.len());
        prop_assert_eq!(got_ids, expected);
    }

    /// Every id the LSH index returns must actually be present in the index
    /// (soundness, not completeness — spec.md §8 property 9).
    #[test]
    fn lsh_results_are_a_subset_of_inserted_ids(
        vectors in arb_vector_set(60),
        query in arb_vector(),
        k in 1usize..15,
    ) {
        let mut lsh = LshIndex::new(LshParams { num_tables: 4, num_hashes: 6 });
        let ids: Vec<Uuid> = vectors.iter().map(|_| Uuid::new_v4()).collect();
        for (id, v) in ids.iter().zip(vectors.iter()) {
            lsh.add(*id, v.clone()).unwrap();
        }

        let known: std::collections::HashSet<Uuid> = ids.into_iter().collect();
        let results = lsh.knn_search(&query, k).unwrap();
        prop_assert!(results.len() <= k);
        for (id, _) in &results {
            prop_assert!(known.contains(id));
        }
    }

    /// Exhaustive search never returns more than k hits, and scores are
    /// sorted descending by cosine similarity (spec.md §8 property 6).
    #[test]
    fn exhaustive_results_are_sorted_descending(
        vectors in arb_vector_set(40),
        query in arb_vector(),
        k in 1usize..10,
    ) {
        let mut idx = ExhaustiveIndex::new();
        for v in &vectors {
            idx.add(Uuid::new_v4(), v.clone()).unwrap();
        }
        let results = idx.knn_search(&query, k).unwrap();
        prop_assert!(results.len() <= k);
        for pair in results.windows(2) {
            prop_assert!(pair[0].1 >= pair[1].1);
        }
    }

    /// `remove(x); remove(x)` behaves identically to a single `remove(x)`,
    /// and `add(id, v); remove(id)` on an empty index leaves it empty
    /// (spec.md §8 properties 10 and 11), across all three backends.
    #[test]
    fn remove_is_idempotent_across_backends(v in arb_vector()) {
        let id = Uuid::new_v4();

        let mut exhaustive = ExhaustiveIndex::new();
        exhaustive.add(id, v.clone()).unwrap();
        exhaustive.remove(id);
        exhaustive.remove(id);
        prop_assert!(exhaustive.is_empty());

        let mut kd = KdTreeIndex::new();
        kd.add(id, v.clone()).unwrap();
        kd.remove(id);
        kd.remove(id);
        prop_assert!(kd.is_empty());

        let mut lsh = LshIndex::default();
        lsh.add(id, v).unwrap();
        lsh.remove(id);
        lsh.remove(id);
        prop_assert!(lsh.is_empty());
    }
}
