//! Multi-signal reranker.
//!
//! Second-stage scorer over the fused candidate set (a few hundred
//! documents at most). Recomputes one interpretable score per candidate
//! from four signals, each normalized to [0, 1] within the current set:
//!
//! - lexical relevance (min-max over raw BM25-like scores)
//! - vector similarity (`1 - cosine distance`, then min-max)
//! - recency: `exp(-days_since_last_visit / half_life)`
//! - popularity: `ln(visit_count + 1) / ln(max_visit_count + 1)`
//!
//! Pure computation over already-fetched data: deterministic, no side
//! effects, no failure modes.

use super::types::{Candidate, RerankWeights};

const MILLIS_PER_DAY: f32 = 86_400_000.0;

/// Re-scores and re-sorts `candidates` in place.
///
/// A candidate missing a branch signal competes on the signals it has
/// (missing normalized value is 0, not an exclusion). If the weighted
/// sum degenerates to <= 0, the candidate keeps its RRF fused score so
/// it is not unfairly zeroed out of the ranking. Ties break on document
/// id ascending for reproducibility.
pub fn rerank(candidates: &mut [Candidate], query: &str, now_ms: u64, weights: &RerankWeights) {
    if candidates.is_empty() {
        return;
    }

    let lexical_range = Range::over(candidates.iter().filter_map(|c| c.lexical_score));
    let similarity_range = Range::over(
        candidates
            .iter()
            .filter_map(|c| c.vector_distance.map(|d| 1.0 - d)),
    );
    let max_visits = candidates
        .iter()
        .map(|c| c.doc.visit_count)
        .max()
        .unwrap_or(1);
    let popularity_denom = ((max_visits + 1) as f32).ln();

    let query_lower = query.trim().to_lowercase();

    for candidate in candidates.iter_mut() {
        let lexical = candidate
            .lexical_score
            .map(|s| lexical_range.normalize(s))
            .unwrap_or(0.0);
        let similarity = candidate
            .vector_distance
            .map(|d| similarity_range.normalize(1.0 - d))
            .unwrap_or(0.0);
        let recency = recency_decay(now_ms, candidate.doc.last_visit_at, weights.half_life_days);
        let popularity = ((candidate.doc.visit_count + 1) as f32).ln() / popularity_denom;

        let weighted = weights.vector * similarity
            + weights.lexical * lexical
            + weights.recency * recency
            + weights.popularity * popularity;

        candidate.final_score = if weighted <= 0.0 {
            // Every signal zeroed out; the fused rank is still meaningful.
            candidate.fused_score
        } else if !query_lower.is_empty()
            && candidate.doc.title.to_lowercase().contains(&query_lower)
        {
            weighted + weights.title_bonus
        } else {
            weighted
        };
    }

    sort_by_final_score(candidates);
}

/// Exponential recency decay in [0, 1]; 1.0 for a visit happening now.
///
/// Visits in the future (clock skew between capture and search) clamp to
/// zero age.
pub fn recency_decay(now_ms: u64, last_visit_at: u64, half_life_days: f32) -> f32 {
    let age_days = now_ms.saturating_sub(last_visit_at) as f32 / MILLIS_PER_DAY;
    (-age_days / half_life_days).exp()
}

/// Optional second-stage neural scorer.
///
/// Pluggable extension point, not required for correctness: when one is
/// installed the engine replaces the heuristic final scores with the
/// cross-encoder's scores and re-sorts.
pub trait CrossEncoder {
    /// Scores each candidate against the query; one score per candidate,
    /// in input order, higher is better.
    fn rescore(&self, query: &str, candidates: &[Candidate]) -> Vec<f32>;
}

/// Overwrites final scores with cross-encoder output and re-sorts.
///
/// A score vector of the wrong length is ignored (the heuristic ordering
/// stands), since a misbehaving extension must not corrupt ranking.
pub fn apply_cross_encoder(
    candidates: &mut [Candidate],
    query: &str,
    encoder: &dyn CrossEncoder,
) {
    let scores = encoder.rescore(query, candidates);
    if scores.len() != candidates.len() {
        tracing::warn!(
            expected = candidates.len(),
            actual = scores.len(),
            "Cross-encoder returned wrong score count, keeping heuristic order"
        );
        return;
    }
    for (candidate, score) in candidates.iter_mut().zip(scores) {
        candidate.final_score = score;
    }
    sort_by_final_score(candidates);
}

fn sort_by_final_score(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.doc.id.cmp(&b.doc.id))
    });
}

/// Min-max range over the values a signal actually produced.
struct Range {
    min: f32,
    max: f32,
}

impl Range {
    fn over(values: impl Iterator<Item = f32>) -> Self {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for v in values {
            min = min.min(v);
            max = max.max(v);
        }
        Self { min, max }
    }

    /// Maps `value` into [0, 1]. A degenerate range (all values equal,
    /// including the single-candidate case) maps positive values to 1.0
    /// so the signal still counts, and the rest to 0.0.
    fn normalize(&self, value: f32) -> f32 {
        if self.max > self.min {
            (value - self.min) / (self.max - self.min)
        } else if value > 0.0 {
            1.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DocId, Document};

    const DAY_MS: u64 = 86_400_000;
    const NOW: u64 = 1_700_000_000_000;

    fn candidate(
        id: u64,
        title: &str,
        lexical_score: Option<f32>,
        vector_distance: Option<f32>,
        days_ago: u64,
        visit_count: u32,
    ) -> Candidate {
        let last_visit_at = NOW - days_ago * DAY_MS;
        Candidate {
            doc: Document {
                id: DocId::from_u64(id),
                url: format!("https://example.com/{id}"),
                title: title.to_string(),
                text: String::new(),
                summary: None,
                embedding: None,
                first_visit_at: last_visit_at,
                last_visit_at,
                visit_count,
            },
            lexical_rank: lexical_score.map(|_| 0),
            lexical_score,
            vector_rank: vector_distance.map(|_| 0),
            vector_distance,
            fused_score: 0.01,
            final_score: 0.01,
        }
    }

    #[test]
    fn recency_decay_is_exponential() {
        let now = NOW;
        let fresh = recency_decay(now, now, 30.0);
        let half_life = recency_decay(now, now - 30 * DAY_MS, 30.0);
        let old = recency_decay(now, now - 120 * DAY_MS, 30.0);

        assert!((fresh - 1.0).abs() < 1e-6);
        assert!((half_life - (-1.0f32).exp()).abs() < 1e-4);
        assert!(old < half_life && old > 0.0);
    }

    #[test]
    fn future_visit_clamps_to_full_recency() {
        let decayed = recency_decay(NOW, NOW + DAY_MS, 30.0);
        assert!((decayed - 1.0).abs() < 1e-6);
    }

    #[test]
    fn fresh_popular_lexical_match_outranks_stale_semantic_match() {
        // Scenario: "python" against a recent, frequently visited
        // tutorial vs an old page with marginally better vector
        // similarity.
        let mut candidates = vec![
            candidate(1, "Python tutorial", Some(8.0), Some(0.30), 1, 10),
            candidate(2, "Snake facts", None, Some(0.25), 60, 1),
        ];

        rerank(&mut candidates, "python", NOW, &RerankWeights::default());

        assert_eq!(candidates[0].doc.id, DocId::from_u64(1));
        assert!(candidates[0].final_score > candidates[1].final_score);
    }

    #[test]
    fn normalized_signals_stay_in_unit_interval() {
        let weights = RerankWeights {
            vector: 1.0,
            lexical: 1.0,
            recency: 1.0,
            popularity: 1.0,
            title_bonus: 0.0,
            ..RerankWeights::default()
        };
        let mut candidates = vec![
            candidate(1, "a", Some(3.5), Some(0.1), 0, 40),
            candidate(2, "b", Some(0.2), Some(1.7), 10, 3),
            candidate(3, "c", None, Some(0.9), 400, 1),
            candidate(4, "d", Some(1.1), None, 45, 7),
        ];

        rerank(&mut candidates, "query", NOW, &weights);

        // With unit weights the sum of four [0,1] signals is at most 4.
        for c in &candidates {
            assert!(c.final_score >= 0.0 && c.final_score <= 4.0);
        }
    }

    #[test]
    fn missing_branch_signal_still_competes() {
        let mut candidates = vec![
            candidate(1, "only lexical", Some(5.0), None, 1, 5),
            candidate(2, "only vector", None, Some(0.2), 1, 5),
        ];

        rerank(&mut candidates, "unrelated", NOW, &RerankWeights::default());

        // Both scored; neither was excluded.
        assert!(candidates.iter().all(|c| c.final_score > 0.0));
    }

    #[test]
    fn zeroed_signals_fall_back_to_fused_score() {
        let weights = RerankWeights {
            vector: 0.0,
            lexical: 0.0,
            recency: 0.0,
            popularity: 0.0,
            ..RerankWeights::default()
        };
        let mut candidates = vec![candidate(1, "title", Some(2.0), Some(0.3), 1, 4)];
        candidates[0].fused_score = 0.0123;

        rerank(&mut candidates, "q", NOW, &weights);

        assert!((candidates[0].final_score - 0.0123).abs() < 1e-6);
    }

    #[test]
    fn title_match_bonus_applies_case_insensitively() {
        let weights = RerankWeights::default();
        let mut with_match = vec![candidate(1, "Rust Async Book", Some(1.0), None, 1, 1)];
        let mut without_match = vec![candidate(1, "Tokio internals", Some(1.0), None, 1, 1)];

        rerank(&mut with_match, "rust async", NOW, &weights);
        rerank(&mut without_match, "rust async", NOW, &weights);

        let diff = with_match[0].final_score - without_match[0].final_score;
        assert!((diff - weights.title_bonus).abs() < 1e-6);
    }

    #[test]
    fn equal_scores_tie_break_by_id() {
        let mut candidates = vec![
            candidate(9, "same", Some(1.0), None, 1, 1),
            candidate(4, "same", Some(1.0), None, 1, 1),
        ];

        rerank(&mut candidates, "", NOW, &RerankWeights::default());

        assert_eq!(candidates[0].doc.id, DocId::from_u64(4));
        assert_eq!(candidates[1].doc.id, DocId::from_u64(9));
    }

    #[test]
    fn rerank_is_deterministic() {
        let build = || {
            vec![
                candidate(1, "alpha", Some(2.0), Some(0.4), 3, 6),
                candidate(2, "beta", Some(1.5), Some(0.2), 10, 2),
                candidate(3, "gamma", None, Some(0.8), 1, 9),
            ]
        };
        let mut a = build();
        let mut b = build();

        rerank(&mut a, "alpha", NOW, &RerankWeights::default());
        rerank(&mut b, "alpha", NOW, &RerankWeights::default());

        let ids_a: Vec<u64> = a.iter().map(|c| c.doc.id.as_u64()).collect();
        let ids_b: Vec<u64> = b.iter().map(|c| c.doc.id.as_u64()).collect();
        assert_eq!(ids_a, ids_b);
    }

    struct ReverseEncoder;

    impl CrossEncoder for ReverseEncoder {
        fn rescore(&self, _query: &str, candidates: &[Candidate]) -> Vec<f32> {
            // Inverts whatever order it is given.
            (0..candidates.len()).map(|i| i as f32).collect()
        }
    }

    #[test]
    fn cross_encoder_overrides_heuristic_order() {
        let mut candidates = vec![
            candidate(1, "first", Some(5.0), None, 1, 10),
            candidate(2, "second", Some(1.0), None, 50, 1),
        ];
        rerank(&mut candidates, "", NOW, &RerankWeights::default());
        let heuristic_top = candidates[0].doc.id;

        apply_cross_encoder(&mut candidates, "", &ReverseEncoder);

        assert_ne!(candidates[0].doc.id, heuristic_top);
    }
}
