//! Shared helpers for the layered search driver, consumed by each family's
//! `fit` implementation: combinatorics, candidate evaluation fan-out, top-k
//! selection, and the stopping rule. The per-family candidate generation,
//! feature transform, and layer-advance policy live in `family::*`.

mod pool;

pub use pool::resolve_thread_pool;

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::criterion::{evaluate, evaluate_second_pass, CandidateCache, Criterion, CriterionOutcome};
use crate::math::SolverKind;
use crate::model::{ColIndex, Combination};

/// All `k`-element subsets of `0..n`, in lexicographic (generation) order.
pub fn combinations(n: usize, k: usize) -> Vec<Vec<ColIndex>> {
    if k == 0 || k > n {
        return Vec::new();
    }
    let mut result = Vec::new();
    let mut current = Vec::with_capacity(k);
    combinations_rec(n, k, 0, &mut current, &mut result);
    result
}

fn combinations_rec(n: usize, k: usize, start: usize, current: &mut Vec<ColIndex>, out: &mut Vec<Vec<ColIndex>>) {
    if current.len() == k {
        out.push(current.clone());
        return;
    }
    for i in start..n {
        current.push(i as ColIndex);
        combinations_rec(n, k, i + 1, current, out);
        current.pop();
    }
}

/// `n choose k`, used to size-check candidate lists before generating them.
pub fn n_choose_k(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result: u128 = 1;
    for i in 0..k {
        result = result * (n - i) as u128 / (i + 1) as u128;
    }
    result as usize
}

/// One raw candidate: the columns it draws from the layer's input matrix,
/// plus the design those columns are expanded into by the feature
/// transformer (identity for linear families, polynomial for MIA/RIA).
pub struct Candidate {
    pub indices: Vec<ColIndex>,
    pub x_train: DMatrix<f64>,
    pub x_test: DMatrix<f64>,
}

/// A scored candidate, ready for top-k selection.
pub struct ScoredCandidate {
    pub indices: Vec<ColIndex>,
    pub outcome: CriterionOutcome,
}

/// Evaluate every candidate's criterion score, fanned out across `pool`'s
/// worker threads in contiguous chunks (one chunk per thread). Sequential
/// criteria get their second pass applied afterwards, only to the
/// eventual top-k (the caller calls [`select_top_k`] first, then
/// [`apply_sequential_second_pass`]).
pub fn evaluate_candidates(
    pool: &rayon::ThreadPool,
    candidates: &[Candidate],
    y_train: &DVector<f64>,
    y_test: &DVector<f64>,
    criterion: &Criterion,
    solver: SolverKind,
) -> Vec<ScoredCandidate> {
    pool.install(|| {
        candidates
            .par_iter()
            .map(|c| {
                let cache = CandidateCache::new(&c.x_train, &c.x_test, y_train, y_test, solver);
                let outcome = evaluate(criterion, &cache);
                ScoredCandidate { indices: c.indices.clone(), outcome }
            })
            .collect()
    })
}

/// Select the `k_best` lowest-scoring candidates, breaking ties by
/// generation order (earlier-generated wins), as the concurrency model
/// requires for determinism.
pub fn select_top_k(mut scored: Vec<ScoredCandidate>, k_best: usize) -> Vec<ScoredCandidate> {
    let mut indexed: Vec<(usize, ScoredCandidate)> = scored.drain(..).enumerate().collect();
    indexed.sort_by(|(ia, a), (ib, b)| {
        a.outcome
            .score
            .partial_cmp(&b.outcome.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| ia.cmp(ib))
    });
    indexed.into_iter().take(k_best).map(|(_, c)| c).collect()
}

/// Re-score a selected top-k in place with a sequential criterion's second
/// pass, then re-sort ascending by the new score. No-op for non-sequential
/// criteria.
pub fn apply_sequential_second_pass(
    top: Vec<ScoredCandidate>,
    candidates: &[Candidate],
    y_train: &DVector<f64>,
    y_test: &DVector<f64>,
    criterion: &Criterion,
    solver: SolverKind,
) -> Vec<ScoredCandidate> {
    if !criterion.is_sequential() {
        return top;
    }
    let mut rescored: Vec<ScoredCandidate> = top
        .into_iter()
        .map(|sc| {
            let design = candidates
                .iter()
                .find(|c| c.indices == sc.indices)
                .expect("top-k candidate must come from the evaluated candidate list");
            let cache = CandidateCache::new(&design.x_train, &design.x_test, y_train, y_test, solver);
            let outcome = evaluate_second_pass(criterion, &cache, &sc.outcome.coeffs);
            ScoredCandidate { indices: sc.indices, outcome }
        })
        .collect();
    rescored.sort_by(|a, b| a.outcome.score.partial_cmp(&b.outcome.score).unwrap_or(std::cmp::Ordering::Equal));
    rescored
}

/// `S_L`: the mean score of the first `min(p_average, |top|)` entries of
/// `top` (already sorted ascending).
pub fn layer_score(top: &[ScoredCandidate], p_average: usize) -> f64 {
    if top.is_empty() {
        return f64::INFINITY;
    }
    let take = p_average.min(top.len());
    top[..take].iter().map(|c| c.outcome.score).sum::<f64>() / take as f64
}

/// Strict-improvement stopping rule: stop (without appending) when
/// `best_so_far - layer_score <= limit`.
pub fn should_stop(best_so_far: f64, layer_score: f64, limit: f64) -> bool {
    best_so_far - layer_score <= limit
}

/// Turn a top-k's scored candidates into persisted [`Combination`]s.
pub fn into_combinations(top: Vec<ScoredCandidate>) -> Vec<Combination> {
    top.into_iter().map(|sc| Combination::new(sc.indices, sc.outcome.coeffs, sc.outcome.score)).collect()
}

/// Select a column subset (in the given order), as used to slice a
/// training/test matrix down to one candidate's design before fitting.
pub fn select_columns(m: &DMatrix<f64>, indices: &[ColIndex]) -> DMatrix<f64> {
    DMatrix::from_fn(m.nrows(), indices.len(), |r, c| m[(r, indices[c] as usize)])
}

/// Append a trailing column of ones, as the evaluator does before handing a
/// layer's input matrix to candidate generation.
pub fn augment_with_bias(m: &DMatrix<f64>) -> DMatrix<f64> {
    let mut out = DMatrix::<f64>::zeros(m.nrows(), m.ncols() + 1);
    out.view_mut((0, 0), (m.nrows(), m.ncols())).copy_from(m);
    for r in 0..m.nrows() {
        out[(r, m.ncols())] = 1.0;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combinations_of_four_choose_two() {
        let combos = combinations(4, 2);
        assert_eq!(combos.len(), 6);
        assert_eq!(combos[0], vec![0, 1]);
        assert_eq!(combos.last().unwrap(), &vec![2, 3]);
    }

    #[test]
    fn n_choose_k_matches_generated_count() {
        assert_eq!(n_choose_k(4, 2), 6);
        assert_eq!(n_choose_k(5, 0), 0);
        assert_eq!(n_choose_k(5, 5), 1);
    }

    #[test]
    fn select_top_k_breaks_ties_by_generation_order() {
        let scored = vec![
            ScoredCandidate { indices: vec![0], outcome: CriterionOutcome { score: 1.0, coeffs: vec![] } },
            ScoredCandidate { indices: vec![1], outcome: CriterionOutcome { score: 1.0, coeffs: vec![] } },
            ScoredCandidate { indices: vec![2], outcome: CriterionOutcome { score: 0.5, coeffs: vec![] } },
        ];
        let top = select_top_k(scored, 2);
        assert_eq!(top[0].indices, vec![2]);
        assert_eq!(top[1].indices, vec![0]);
    }

    #[test]
    fn stopping_rule_requires_strict_improvement_at_limit_zero() {
        assert!(should_stop(10.0, 10.0, 0.0));
        assert!(!should_stop(10.0, 9.999, 0.0));
    }
}
