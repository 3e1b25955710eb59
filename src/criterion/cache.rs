//! Per-candidate memoization cache for criterion evaluation.
//!
//! Every primitive criterion is built from the same handful of fitted
//! coefficient vectors and predictions. `CandidateCache` computes each one
//! at most once per `(x_train, x_test, y_train, y_test)` tuple and hands
//! out references; it owns none of the inputs and is scoped to a single
//! evaluation call on a single thread (it is not `Sync`).

use std::cell::OnceCell;

use nalgebra::{DMatrix, DVector};

use crate::math::SolverKind;

pub struct CandidateCache<'a> {
    x_train: &'a DMatrix<f64>,
    x_test: &'a DMatrix<f64>,
    y_train: &'a DVector<f64>,
    y_test: &'a DVector<f64>,
    solver: SolverKind,

    x_all: OnceCell<DMatrix<f64>>,
    y_all: OnceCell<DVector<f64>>,

    beta_train: OnceCell<Option<DVector<f64>>>,
    beta_test: OnceCell<Option<DVector<f64>>>,
    beta_all: OnceCell<Option<DVector<f64>>>,

    y_hat_test_train: OnceCell<Option<DVector<f64>>>,
    y_hat_train_test: OnceCell<Option<DVector<f64>>>,
    y_hat_train_train: OnceCell<Option<DVector<f64>>>,
    y_hat_test_test: OnceCell<Option<DVector<f64>>>,
    y_hat_test_all: OnceCell<Option<DVector<f64>>>,
    y_hat_all_train: OnceCell<Option<DVector<f64>>>,
    y_hat_all_test: OnceCell<Option<DVector<f64>>>,
    y_hat_all_all: OnceCell<Option<DVector<f64>>>,
}

impl<'a> CandidateCache<'a> {
    pub fn new(
        x_train: &'a DMatrix<f64>,
        x_test: &'a DMatrix<f64>,
        y_train: &'a DVector<f64>,
        y_test: &'a DVector<f64>,
        solver: SolverKind,
    ) -> Self {
        Self {
            x_train,
            x_test,
            y_train,
            y_test,
            solver,
            x_all: OnceCell::new(),
            y_all: OnceCell::new(),
            beta_train: OnceCell::new(),
            beta_test: OnceCell::new(),
            beta_all: OnceCell::new(),
            y_hat_test_train: OnceCell::new(),
            y_hat_train_test: OnceCell::new(),
            y_hat_train_train: OnceCell::new(),
            y_hat_test_test: OnceCell::new(),
            y_hat_test_all: OnceCell::new(),
            y_hat_all_train: OnceCell::new(),
            y_hat_all_test: OnceCell::new(),
            y_hat_all_all: OnceCell::new(),
        }
    }

    pub fn y_test(&self) -> &DVector<f64> {
        self.y_test
    }

    pub fn y_train(&self) -> &DVector<f64> {
        self.y_train
    }

    fn x_all(&self) -> &DMatrix<f64> {
        self.x_all.get_or_init(|| stack_rows(self.x_train, self.x_test))
    }

    pub fn y_all(&self) -> &DVector<f64> {
        self.y_all.get_or_init(|| stack_vecs(self.y_train, self.y_test))
    }

    pub fn beta_train(&self) -> Option<&DVector<f64>> {
        self.beta_train
            .get_or_init(|| crate::math::solve(self.solver, self.x_train, self.y_train))
            .as_ref()
    }

    pub fn beta_test(&self) -> Option<&DVector<f64>> {
        self.beta_test
            .get_or_init(|| crate::math::solve(self.solver, self.x_test, self.y_test))
            .as_ref()
    }

    pub fn beta_all(&self) -> Option<&DVector<f64>> {
        self.beta_all
            .get_or_init(|| {
                let y_all = self.y_all().clone();
                crate::math::solve(self.solver, self.x_all(), &y_all)
            })
            .as_ref()
    }

    pub fn y_hat_test_train(&self) -> Option<&DVector<f64>> {
        self.y_hat_test_train.get_or_init(|| self.beta_train().map(|b| self.x_test * b)).as_ref()
    }

    pub fn y_hat_train_test(&self) -> Option<&DVector<f64>> {
        self.y_hat_train_test.get_or_init(|| self.beta_test().map(|b| self.x_train * b)).as_ref()
    }

    pub fn y_hat_train_train(&self) -> Option<&DVector<f64>> {
        self.y_hat_train_train.get_or_init(|| self.beta_train().map(|b| self.x_train * b)).as_ref()
    }

    pub fn y_hat_test_test(&self) -> Option<&DVector<f64>> {
        self.y_hat_test_test.get_or_init(|| self.beta_test().map(|b| self.x_test * b)).as_ref()
    }

    pub fn y_hat_test_all(&self) -> Option<&DVector<f64>> {
        self.y_hat_test_all.get_or_init(|| self.beta_all().map(|b| self.x_test * b)).as_ref()
    }

    pub fn y_hat_all_train(&self) -> Option<&DVector<f64>> {
        self.y_hat_all_train.get_or_init(|| self.beta_train().map(|b| self.x_all() * b)).as_ref()
    }

    pub fn y_hat_all_test(&self) -> Option<&DVector<f64>> {
        self.y_hat_all_test.get_or_init(|| self.beta_test().map(|b| self.x_all() * b)).as_ref()
    }

    pub fn y_hat_all_all(&self) -> Option<&DVector<f64>> {
        self.y_hat_all_all.get_or_init(|| self.beta_all().map(|b| self.x_all() * b)).as_ref()
    }

    /// Predictions against a fitted-hint coefficient vector supplied by a
    /// sequential composition's primary criterion, rather than this cache's
    /// own `beta_train`. Not memoized: the second pass only runs on a
    /// layer's already-reduced top-k candidates.
    pub fn y_hat_with_hint(&self, hint: &DVector<f64>) -> (DVector<f64>, DVector<f64>, DVector<f64>) {
        (self.x_train * hint, self.x_test * hint, self.x_all() * hint)
    }
}

fn stack_rows(a: &DMatrix<f64>, b: &DMatrix<f64>) -> DMatrix<f64> {
    let mut out = DMatrix::<f64>::zeros(a.nrows() + b.nrows(), a.ncols());
    out.view_mut((0, 0), (a.nrows(), a.ncols())).copy_from(a);
    out.view_mut((a.nrows(), 0), (b.nrows(), b.ncols())).copy_from(b);
    out
}

fn stack_vecs(a: &DVector<f64>, b: &DVector<f64>) -> DVector<f64> {
    DVector::from_iterator(a.len() + b.len(), a.iter().chain(b.iter()).copied())
}

pub fn sse(a: &DVector<f64>, b: &DVector<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(u, v)| (u - v).powi(2)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beta_train_is_computed_once_and_shared() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        let cache = CandidateCache::new(&x, &x, &y, &y, SolverKind::Fast);
        let first = cache.beta_train().unwrap().clone();
        let second = cache.beta_train().unwrap().clone();
        assert_eq!(first, second);
    }

    #[test]
    fn sse_matches_manual_computation() {
        let a = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        let b = DVector::from_row_slice(&[1.0, 0.0, 5.0]);
        assert_eq!(sse(&a, &b), 0.0 + 4.0 + 4.0);
    }
}
