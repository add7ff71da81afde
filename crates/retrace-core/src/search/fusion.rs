//! Weighted Reciprocal Rank Fusion (RRF).
//!
//! RRF merges two ranked lists using only rank positions, which makes
//! lexical relevance scores and vector distances commensurable despite
//! their different scales and units.

use std::collections::HashMap;
use std::hash::Hash;

/// Standard RRF k parameter value from academic literature.
///
/// This constant (60) is the recommended value from the original RRF
/// paper: "Reciprocal Rank Fusion outperforms Condorcet and individual
/// Rank Learning Methods" by Cormack, Clarke, and Buettcher (SIGIR 2009).
///
/// The k parameter controls how much weight is given to top-ranked items:
/// - Smaller k rewards top ranks more aggressively
/// - Larger k flattens the influence of rank differences
/// - k=60 provides a good balance in most IR scenarios
pub const RRF_K: usize = 60;

/// Combines the lexical and vector rankings into one ordered list.
///
/// Each document contributes `weight / (k + rank + 1)` per list it
/// appears in, with 0-based `rank`; a document in both lists accumulates
/// both contributions. `vector_weight` apportions trust between the
/// modalities, the lexical list getting `1 - vector_weight`.
///
/// The output covers exactly the union of the two input lists, sorted by
/// fused score descending; ties break on the item key ascending so that
/// identical inputs always produce identical output.
pub fn weighted_reciprocal_rank_fusion<T: Copy + Eq + Hash + Ord>(
    lexical: &[T],
    vector: &[T],
    k: usize,
    vector_weight: f32,
) -> Vec<(T, f32)> {
    let k_param = k as f32;
    let lexical_weight = 1.0 - vector_weight;

    let mut fused: HashMap<T, f32> = HashMap::new();

    for (rank, item) in lexical.iter().enumerate() {
        let contribution = lexical_weight / (k_param + rank as f32 + 1.0);
        *fused.entry(*item).or_insert(0.0) += contribution;
    }

    for (rank, item) in vector.iter().enumerate() {
        let contribution = vector_weight / (k_param + rank as f32 + 1.0);
        *fused.entry(*item).or_insert(0.0) += contribution;
    }

    let mut combined: Vec<(T, f32)> = fused.into_iter().collect();
    combined.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    combined
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALPHA: f32 = 0.6;

    #[test]
    fn documents_in_both_lists_rank_highest() {
        let lexical = vec![3, 1, 4];
        let vector = vec![1, 2, 3];

        let fused = weighted_reciprocal_rank_fusion(&lexical, &vector, RRF_K, ALPHA);

        // 1 and 3 appear in both lists and should occupy the top two slots.
        let top: Vec<i32> = fused.iter().take(2).map(|(id, _)| *id).collect();
        assert!(top.contains(&1));
        assert!(top.contains(&3));
    }

    #[test]
    fn both_branches_contribute_more_than_one() {
        // Fusion monotonicity: holding rank fixed, a document in both
        // lists scores strictly above the same document in either alone.
        let both = weighted_reciprocal_rank_fusion(&[7], &[7], RRF_K, ALPHA);
        let lexical_only = weighted_reciprocal_rank_fusion(&[7], &[], RRF_K, ALPHA);
        let vector_only = weighted_reciprocal_rank_fusion::<i32>(&[], &[7], RRF_K, ALPHA);

        assert!(both[0].1 > lexical_only[0].1);
        assert!(both[0].1 > vector_only[0].1);
    }

    #[test]
    fn output_is_subset_of_input_union() {
        let lexical = vec![1, 2, 3];
        let vector = vec![3, 4];

        let fused = weighted_reciprocal_rank_fusion(&lexical, &vector, RRF_K, ALPHA);

        assert_eq!(fused.len(), 4); // union {1,2,3,4}, no inventions
        for (id, _) in &fused {
            assert!(lexical.contains(id) || vector.contains(id));
        }
    }

    #[test]
    fn both_empty_yields_empty() {
        let fused = weighted_reciprocal_rank_fusion::<u64>(&[], &[], RRF_K, ALPHA);
        assert!(fused.is_empty());
    }

    #[test]
    fn single_list_preserves_its_order() {
        let lexical = vec![10, 20, 30];
        let fused = weighted_reciprocal_rank_fusion(&lexical, &[], RRF_K, ALPHA);

        let order: Vec<i32> = fused.iter().map(|(id, _)| *id).collect();
        assert_eq!(order, vec![10, 20, 30]);
    }

    #[test]
    fn vector_weight_biases_the_merge() {
        // Same ranks on each side; the heavier modality wins.
        let lexical = vec![1];
        let vector = vec![2];

        let fused = weighted_reciprocal_rank_fusion(&lexical, &vector, RRF_K, 0.6);
        assert_eq!(fused[0].0, 2, "vector item should lead at alpha=0.6");

        let fused = weighted_reciprocal_rank_fusion(&lexical, &vector, RRF_K, 0.3);
        assert_eq!(fused[0].0, 1, "lexical item should lead at alpha=0.3");
    }

    #[test]
    fn ties_break_by_key_ascending() {
        // Equal weights and symmetric ranks make 5 and 9 tie exactly.
        let fused = weighted_reciprocal_rank_fusion(&[9, 5], &[5, 9], RRF_K, 0.5);
        assert_eq!(fused[0].0, 5);
        assert_eq!(fused[1].0, 9);
    }

    #[test]
    fn rank_positions_use_rrf_formula() {
        let fused = weighted_reciprocal_rank_fusion(&[1, 2], &[], RRF_K, ALPHA);

        let k = RRF_K as f32;
        let lexical_weight = 1.0 - ALPHA;
        assert!((fused[0].1 - lexical_weight / (k + 1.0)).abs() < 1e-6);
        assert!((fused[1].1 - lexical_weight / (k + 2.0)).abs() < 1e-6);
    }
}
