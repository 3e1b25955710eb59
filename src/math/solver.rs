//! Least-squares solver with a selectable pivoting/robustness strategy.
//!
//! `nalgebra` does not expose Eigen's exact `fullPivHouseholderQr` /
//! `colPivHouseholderQr` / `householderQr` trio, so each strategy below is
//! built from the decompositions `nalgebra` does provide:
//!
//! - [`SolverKind::Fast`]: unpivoted Householder QR (`nalgebra::QR`), solved
//!   by back-substitution against `Qᵀy`. Fastest, but can blow up on
//!   near-collinear columns.
//! - [`SolverKind::Balanced`]: the same QR, but columns are first reordered
//!   by descending norm (a lightweight stand-in for column-pivoted QR) and
//!   the solution is un-permuted afterwards.
//! - [`SolverKind::Accurate`]: normal equations `Xᵀx β = Xᵀy`, solved by
//!   `nalgebra::FullPivLU` on the (square, symmetric) Gram matrix. Falls
//!   back to the SVD solve if the Gram matrix is singular.
//!
//! All three return `None` on a non-finite or unsolvable result; candidates
//! the criterion cannot score are simply scored `+∞` by the caller, matching
//! the "numerical failures do not raise" policy.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Least-squares solver strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    Fast,
    Balanced,
    Accurate,
}

/// Solve `argmin ||x*beta - y||^2` using the given strategy.
pub fn solve(kind: SolverKind, x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() < x.ncols() || x.nrows() == 0 {
        return None;
    }
    match kind {
        SolverKind::Fast => solve_qr(x, y),
        SolverKind::Balanced => solve_balanced(x, y),
        SolverKind::Accurate => solve_normal_equations(x, y),
    }
}

fn solve_qr(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let qr = x.clone().qr();
    let q = qr.q();
    let r = qr.r();
    let qty = q.transpose() * y;
    let beta = r.solve_upper_triangular(&qty)?;
    finite_or_none(beta)
}

fn solve_balanced(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let ncols = x.ncols();
    let mut order: Vec<usize> = (0..ncols).collect();
    let norms: Vec<f64> = (0..ncols).map(|j| x.column(j).norm()).collect();
    order.sort_by(|&a, &b| norms[b].partial_cmp(&norms[a]).unwrap_or(std::cmp::Ordering::Equal));

    let permuted = DMatrix::from_fn(x.nrows(), ncols, |r, c| x[(r, order[c])]);
    let beta_permuted = solve_qr(&permuted, y)?;

    let mut beta = DVector::<f64>::zeros(ncols);
    for (permuted_col, &original_col) in order.iter().enumerate() {
        beta[original_col] = beta_permuted[permuted_col];
    }
    finite_or_none(beta)
}

fn solve_svd(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);
    let beta = svd.solve(y, 1e-12).ok()?;
    finite_or_none(beta)
}

/// Normal-equations solve via `FullPivLU`, falling back to SVD when the
/// Gram matrix turns out singular.
fn solve_normal_equations(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let xt = x.transpose();
    let gram = &xt * x;
    let rhs = &xt * y;
    let lu = gram.full_piv_lu();
    match lu.solve(&rhs) {
        Some(beta) => finite_or_none(beta),
        None => solve_svd(x, y),
    }
}

fn finite_or_none(v: DVector<f64>) -> Option<DVector<f64>> {
    if v.iter().all(|x| x.is_finite()) {
        Some(v)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exact_system() -> (DMatrix<f64>, DVector<f64>) {
        // y = 2 + 3x on x = [0,1,2,3]
        let x = DMatrix::from_row_slice(4, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0, 11.0]);
        (x, y)
    }

    #[test]
    fn all_strategies_solve_exact_system() {
        let (x, y) = exact_system();
        for kind in [SolverKind::Fast, SolverKind::Balanced, SolverKind::Accurate] {
            let beta = solve(kind, &x, &y).unwrap_or_else(|| panic!("{kind:?} failed to solve"));
            assert!((beta[0] - 2.0).abs() < 1e-8, "{kind:?}: beta0={}", beta[0]);
            assert!((beta[1] - 3.0).abs() < 1e-8, "{kind:?}: beta1={}", beta[1]);
        }
    }

    #[test]
    fn underdetermined_system_returns_none() {
        let x = DMatrix::from_row_slice(1, 2, &[1.0, 1.0]);
        let y = DVector::from_row_slice(&[1.0]);
        assert!(solve(SolverKind::Fast, &x, &y).is_none());
    }
}
