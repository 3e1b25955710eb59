//! Composed criteria: parallel blend and sequential refinement.

use nalgebra::DVector;

use super::cache::{sse, CandidateCache};
use super::kinds::{dot_diff, evaluate_primitive, CriterionKind, CriterionOutcome};
use crate::error::GmdhError;

/// An external criterion: a primitive scorer, or a composition of two.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    Primitive(CriterionKind),
    /// `score = alpha * first.score + (1 - alpha) * second.score`.
    Parallel { first: Box<Criterion>, second: Box<Criterion>, alpha: f64 },
    /// Rank by `first`, then re-score the survivors with `second` fed
    /// `first`'s fitted coefficients as a hint (no re-fit).
    Sequential { first: Box<Criterion>, second: Box<Criterion> },
}

impl Criterion {
    pub fn parallel(first: Criterion, second: Criterion, alpha: f64) -> Result<Self, GmdhError> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(GmdhError::invalid_argument(format!("parallel criterion alpha {alpha} must be in [0,1]")));
        }
        Ok(Criterion::Parallel { first: Box::new(first), second: Box::new(second), alpha })
    }

    pub fn sequential(first: Criterion, second: Criterion) -> Result<Self, GmdhError> {
        if first == second {
            return Err(GmdhError::invalid_argument("sequential criterion requires first != second"));
        }
        Ok(Criterion::Sequential { first: Box::new(first), second: Box::new(second) })
    }

    /// `true` if this criterion needs the driver's two-phase (rank, then
    /// re-score the survivors) evaluation.
    pub fn is_sequential(&self) -> bool {
        matches!(self, Criterion::Sequential { .. })
    }
}

/// Score a candidate for the first pass: the only pass for `Primitive` and
/// `Parallel`, and the ranking pass (using only `first`) for `Sequential`.
pub fn evaluate(criterion: &Criterion, cache: &CandidateCache) -> CriterionOutcome {
    match criterion {
        Criterion::Primitive(kind) => evaluate_primitive(*kind, cache),
        Criterion::Parallel { first, second, alpha } => {
            let a = evaluate(first, cache);
            let b = evaluate(second, cache);
            if !a.score.is_finite() || !b.score.is_finite() {
                return CriterionOutcome { score: f64::INFINITY, coeffs: a.coeffs };
            }
            CriterionOutcome { score: alpha * a.score + (1.0 - alpha) * b.score, coeffs: a.coeffs }
        }
        Criterion::Sequential { first, .. } => evaluate(first, cache),
    }
}

/// Re-score a survivor of the first pass using `second`, fed `hint` (the
/// first pass's fitted coefficients) instead of refitting on train.
/// Only meaningful when `criterion` is `Criterion::Sequential`.
pub fn evaluate_second_pass(criterion: &Criterion, cache: &CandidateCache, hint: &[f64]) -> CriterionOutcome {
    let Criterion::Sequential { second, .. } = criterion else {
        return evaluate(criterion, cache);
    };
    let hint_vec = DVector::from_row_slice(hint);
    evaluate_hinted(second, cache, &hint_vec)
}

fn evaluate_hinted(criterion: &Criterion, cache: &CandidateCache, hint: &DVector<f64>) -> CriterionOutcome {
    match criterion {
        Criterion::Primitive(kind) => evaluate_primitive_hinted(*kind, cache, hint),
        Criterion::Parallel { first, second, alpha } => {
            let a = evaluate_hinted(first, cache, hint);
            let b = evaluate_hinted(second, cache, hint);
            if !a.score.is_finite() || !b.score.is_finite() {
                return CriterionOutcome { score: f64::INFINITY, coeffs: a.coeffs };
            }
            CriterionOutcome { score: alpha * a.score + (1.0 - alpha) * b.score, coeffs: a.coeffs }
        }
        Criterion::Sequential { first, .. } => evaluate_hinted(first, cache, hint),
    }
}

/// Primitive scoring with `beta_train` replaced by `hint` everywhere it
/// would otherwise be solved for. Used only by the sequential second pass.
fn evaluate_primitive_hinted(kind: CriterionKind, cache: &CandidateCache, hint: &DVector<f64>) -> CriterionOutcome {
    let (y_hat_train_hint, y_hat_test_hint, y_hat_all_hint) = cache.y_hat_with_hint(hint);
    let coeffs = hint.iter().copied().collect();

    let score = match kind {
        CriterionKind::Regularity => sse(cache.y_test(), &y_hat_test_hint),
        CriterionKind::SymRegularity => {
            let Some(y_tr_te) = cache.y_hat_train_test() else { return CriterionOutcome { score: f64::INFINITY, coeffs } };
            sse(cache.y_test(), &y_hat_test_hint) + sse(cache.y_train(), y_tr_te)
        }
        CriterionKind::Stability => sse(cache.y_train(), &y_hat_train_hint) + sse(cache.y_test(), &y_hat_test_hint),
        CriterionKind::SymStability => {
            let Some(y_te_te) = cache.y_hat_test_test() else { return CriterionOutcome { score: f64::INFINITY, coeffs } };
            let Some(y_tr_te) = cache.y_hat_train_test() else { return CriterionOutcome { score: f64::INFINITY, coeffs } };
            sse(cache.y_train(), &y_hat_train_hint) + sse(cache.y_test(), &y_hat_test_hint) + sse(cache.y_test(), y_te_te) + sse(cache.y_train(), y_tr_te)
        }
        CriterionKind::UnbiasedOutputs => {
            let Some(y_te_te) = cache.y_hat_test_test() else { return CriterionOutcome { score: f64::INFINITY, coeffs } };
            sse(&y_hat_test_hint, y_te_te)
        }
        CriterionKind::SymUnbiasedOutputs => {
            let Some(y_tr_te) = cache.y_hat_train_test() else { return CriterionOutcome { score: f64::INFINITY, coeffs } };
            let Some(y_te_te) = cache.y_hat_test_test() else { return CriterionOutcome { score: f64::INFINITY, coeffs } };
            sse(&y_hat_train_hint, y_tr_te) + sse(&y_hat_test_hint, y_te_te)
        }
        CriterionKind::UnbiasedCoeffs => {
            let Some(beta_test) = cache.beta_test() else { return CriterionOutcome { score: f64::INFINITY, coeffs } };
            if hint.len() != beta_test.len() {
                return CriterionOutcome { score: f64::INFINITY, coeffs };
            }
            hint.iter().zip(beta_test.iter()).map(|(a, b)| (a - b).powi(2)).sum()
        }
        CriterionKind::AbsoluteStability => {
            // only the train-derived term (`Ŷ_{test|train}`) is seeded from
            // `hint`; `Ŷ_{test|all}`/`Ŷ_{test|test}` are still the cache's
            // own freshly-solved values, as in the non-hinted primitive.
            let (Some(y_te_all), Some(y_te_te)) = (cache.y_hat_test_all(), cache.y_hat_test_test()) else {
                return CriterionOutcome { score: f64::INFINITY, coeffs };
            };
            dot_diff(y_te_all, &y_hat_test_hint, y_te_te)
        }
        CriterionKind::SymAbsoluteStability => {
            let (Some(y_all_all), Some(y_all_te)) = (cache.y_hat_all_all(), cache.y_hat_all_test()) else {
                return CriterionOutcome { score: f64::INFINITY, coeffs };
            };
            dot_diff(y_all_all, &y_hat_all_hint, y_all_te)
        }
    };

    if !score.is_finite() {
        return CriterionOutcome { score: f64::INFINITY, coeffs: Vec::new() };
    }
    CriterionOutcome { score, coeffs }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::SolverKind;
    use nalgebra::DMatrix;

    fn cache() -> (DMatrix<f64>, DVector<f64>) {
        let x = DMatrix::from_row_slice(4, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0, 11.0]);
        (x, y)
    }

    #[test]
    fn parallel_rejects_alpha_out_of_range() {
        let c = Criterion::parallel(
            Criterion::Primitive(CriterionKind::Regularity),
            Criterion::Primitive(CriterionKind::Stability),
            1.5,
        );
        assert!(c.is_err());
    }

    #[test]
    fn sequential_rejects_identical_criteria() {
        let c = Criterion::sequential(
            Criterion::Primitive(CriterionKind::Regularity),
            Criterion::Primitive(CriterionKind::Regularity),
        );
        assert!(c.is_err());
    }

    #[test]
    fn parallel_blend_is_convex_combination() {
        let (x, y) = cache();
        let cache = CandidateCache::new(&x, &x, &y, &y, SolverKind::Fast);
        let c = Criterion::parallel(
            Criterion::Primitive(CriterionKind::Regularity),
            Criterion::Primitive(CriterionKind::Stability),
            0.5,
        )
        .unwrap();
        let outcome = evaluate(&c, &cache);
        assert!(outcome.score.is_finite());
    }

    #[test]
    fn sequential_second_pass_uses_hinted_coeffs() {
        let (x, y) = cache();
        let cache = CandidateCache::new(&x, &x, &y, &y, SolverKind::Fast);
        let c = Criterion::sequential(
            Criterion::Primitive(CriterionKind::Regularity),
            Criterion::Primitive(CriterionKind::Stability),
        )
        .unwrap();
        let first_pass = evaluate(&c, &cache);
        let second_pass = evaluate_second_pass(&c, &cache, &first_pass.coeffs);
        assert!(second_pass.score.is_finite());
    }

    #[test]
    fn sequential_second_pass_handles_absolute_stability_without_panicking() {
        let (x, y) = cache();
        let cache = CandidateCache::new(&x, &x, &y, &y, SolverKind::Fast);
        for second in [CriterionKind::AbsoluteStability, CriterionKind::SymAbsoluteStability] {
            let c = Criterion::sequential(Criterion::Primitive(CriterionKind::Regularity), Criterion::Primitive(second)).unwrap();
            let first_pass = evaluate(&c, &cache);
            let second_pass = evaluate_second_pass(&c, &cache, &first_pass.coeffs);
            assert!(second_pass.score.is_finite());
        }
    }
}
