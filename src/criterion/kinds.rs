//! The nine primitive external-quality criteria.

use serde::{Deserialize, Serialize};

use super::cache::{sse, CandidateCache};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CriterionKind {
    Regularity,
    SymRegularity,
    Stability,
    SymStability,
    UnbiasedOutputs,
    SymUnbiasedOutputs,
    UnbiasedCoeffs,
    AbsoluteStability,
    SymAbsoluteStability,
}

/// The outcome of scoring one candidate: its rank key and the coefficients
/// to carry forward into prediction.
#[derive(Debug, Clone)]
pub struct CriterionOutcome {
    pub score: f64,
    pub coeffs: Vec<f64>,
}

impl CriterionOutcome {
    fn failed() -> Self {
        Self { score: f64::INFINITY, coeffs: Vec::new() }
    }
}

/// Score one candidate under a primitive criterion, using `cache`'s
/// memoized fits. Any missing component (a solver failure somewhere in the
/// chain) degrades the score to `+inf` rather than raising.
pub fn evaluate_primitive(kind: CriterionKind, cache: &CandidateCache) -> CriterionOutcome {
    let Some(beta_train) = cache.beta_train() else { return CriterionOutcome::failed() };
    let coeffs = beta_train.iter().copied().collect();

    let score = match kind {
        CriterionKind::Regularity => {
            let Some(yht) = cache.y_hat_test_train() else { return CriterionOutcome::failed() };
            sse(cache.y_test(), yht)
        }
        CriterionKind::SymRegularity => {
            let (Some(yht), Some(ytt)) = (cache.y_hat_test_train(), cache.y_hat_train_test()) else {
                return CriterionOutcome::failed();
            };
            sse(cache.y_test(), yht) + sse(cache.y_train(), ytt)
        }
        CriterionKind::Stability => {
            let (Some(y_tr_tr), Some(y_te_tr)) = (cache.y_hat_train_train(), cache.y_hat_test_train()) else {
                return CriterionOutcome::failed();
            };
            sse(cache.y_train(), y_tr_tr) + sse(cache.y_test(), y_te_tr)
        }
        CriterionKind::SymStability => {
            let (Some(y_tr_tr), Some(y_te_tr), Some(y_te_te), Some(y_tr_te)) = (
                cache.y_hat_train_train(),
                cache.y_hat_test_train(),
                cache.y_hat_test_test(),
                cache.y_hat_train_test(),
            ) else {
                return CriterionOutcome::failed();
            };
            sse(cache.y_train(), y_tr_tr) + sse(cache.y_test(), y_te_tr) + sse(cache.y_test(), y_te_te) + sse(cache.y_train(), y_tr_te)
        }
        CriterionKind::UnbiasedOutputs => {
            let (Some(y_te_tr), Some(y_te_te)) = (cache.y_hat_test_train(), cache.y_hat_test_test()) else {
                return CriterionOutcome::failed();
            };
            sse(y_te_tr, y_te_te)
        }
        CriterionKind::SymUnbiasedOutputs => {
            let (Some(y_tr_tr), Some(y_tr_te), Some(y_te_tr), Some(y_te_te)) = (
                cache.y_hat_train_train(),
                cache.y_hat_train_test(),
                cache.y_hat_test_train(),
                cache.y_hat_test_test(),
            ) else {
                return CriterionOutcome::failed();
            };
            sse(y_tr_tr, y_tr_te) + sse(y_te_tr, y_te_te)
        }
        CriterionKind::UnbiasedCoeffs => {
            let Some(beta_test) = cache.beta_test() else { return CriterionOutcome::failed() };
            if beta_train.len() != beta_test.len() {
                return CriterionOutcome::failed();
            }
            beta_train.iter().zip(beta_test.iter()).map(|(a, b)| (a - b).powi(2)).sum()
        }
        CriterionKind::AbsoluteStability => {
            let (Some(y_te_all), Some(y_te_tr), Some(y_te_te)) =
                (cache.y_hat_test_all(), cache.y_hat_test_train(), cache.y_hat_test_test())
            else {
                return CriterionOutcome::failed();
            };
            dot_diff(y_te_all, y_te_tr, y_te_te)
        }
        CriterionKind::SymAbsoluteStability => {
            let (Some(y_all_all), Some(y_all_tr), Some(y_all_te)) =
                (cache.y_hat_all_all(), cache.y_hat_all_train(), cache.y_hat_all_test())
            else {
                return CriterionOutcome::failed();
            };
            dot_diff(y_all_all, y_all_tr, y_all_te)
        }
    };

    if !score.is_finite() {
        return CriterionOutcome::failed();
    }
    CriterionOutcome { score, coeffs }
}

/// `Σ (all_i - train_i) * (test_i - all_i)`, the shared shape of both
/// absolute-stability variants.
pub(super) fn dot_diff(all: &nalgebra::DVector<f64>, train_like: &nalgebra::DVector<f64>, test_like: &nalgebra::DVector<f64>) -> f64 {
    all.iter()
        .zip(train_like.iter())
        .zip(test_like.iter())
        .map(|((a, t), s)| (a - t) * (s - a))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::SolverKind;
    use nalgebra::{DMatrix, DVector};

    #[test]
    fn regularity_is_zero_on_an_exact_linear_fit() {
        let x = DMatrix::from_row_slice(4, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0, 11.0]);
        let cache = CandidateCache::new(&x, &x, &y, &y, SolverKind::Fast);
        let outcome = evaluate_primitive(CriterionKind::Regularity, &cache);
        assert!(outcome.score < 1e-16);
        assert_eq!(outcome.coeffs.len(), 2);
    }

    #[test]
    fn unbiased_coeffs_is_zero_when_train_and_test_fits_agree() {
        let x = DMatrix::from_row_slice(4, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0, 11.0]);
        let cache = CandidateCache::new(&x, &x, &y, &y, SolverKind::Fast);
        let outcome = evaluate_primitive(CriterionKind::UnbiasedCoeffs, &cache);
        assert!(outcome.score < 1e-16);
    }
}
