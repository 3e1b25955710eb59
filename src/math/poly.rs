//! Polynomial feature expansion for MIA/RIA's two-variable partial descriptions.
//!
//! Each partial description takes two columns `(a, b)` from the previous
//! layer's data and expands them into a design-matrix block per
//! [`PolynomialType`]. This mirrors the reference library's
//! `getPolynomialX`, which builds the same three term sets.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// The term set used to expand a pair of columns into a design-matrix block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolynomialType {
    /// `1, a, b`
    Linear,
    /// `1, a, b, a*b`
    LinearCov,
    /// `1, a, b, a*b, a^2, b^2`
    Quadratic,
}

impl PolynomialType {
    /// Number of columns a single `(a, b)` pair expands into.
    pub fn term_count(self) -> usize {
        match self {
            PolynomialType::Linear => 3,
            PolynomialType::LinearCov => 4,
            PolynomialType::Quadratic => 6,
        }
    }
}

/// Expand two columns of `data` into a design-matrix block of width
/// `poly.term_count()`, one row per observation, bias term last.
pub fn expand_pair(data: &DMatrix<f64>, col_a: usize, col_b: usize, poly: PolynomialType) -> DMatrix<f64> {
    let n = data.nrows();
    let width = poly.term_count();
    let mut out = DMatrix::<f64>::zeros(n, width);
    for row in 0..n {
        let a = data[(row, col_a)];
        let b = data[(row, col_b)];
        let terms = terms_for(a, b, poly);
        for (col, value) in terms.into_iter().enumerate() {
            out[(row, col)] = value;
        }
    }
    out
}

/// Expand a single `(a, b)` pair of scalars into its term row, for use at
/// prediction time (one row, no matrix allocation needed by the caller).
pub fn expand_pair_row(a: f64, b: f64, poly: PolynomialType) -> Vec<f64> {
    terms_for(a, b, poly)
}

fn terms_for(a: f64, b: f64, poly: PolynomialType) -> Vec<f64> {
    match poly {
        PolynomialType::Linear => vec![1.0, a, b],
        PolynomialType::LinearCov => vec![1.0, a, b, a * b],
        PolynomialType::Quadratic => vec![1.0, a, b, a * b, a * a, b * b],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_count_matches_expansion_width() {
        for poly in [PolynomialType::Linear, PolynomialType::LinearCov, PolynomialType::Quadratic] {
            assert_eq!(expand_pair_row(2.0, 3.0, poly).len(), poly.term_count());
        }
    }

    #[test]
    fn quadratic_expansion_is_correct() {
        let row = expand_pair_row(2.0, 3.0, PolynomialType::Quadratic);
        assert_eq!(row, vec![1.0, 2.0, 3.0, 6.0, 4.0, 9.0]);
    }

    #[test]
    fn expand_pair_matches_row_expansion() {
        let data = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let block = expand_pair(&data, 0, 1, PolynomialType::LinearCov);
        assert_eq!(block.row(0).iter().copied().collect::<Vec<_>>(), expand_pair_row(1.0, 2.0, PolynomialType::LinearCov));
        assert_eq!(block.row(1).iter().copied().collect::<Vec<_>>(), expand_pair_row(3.0, 4.0, PolynomialType::LinearCov));
    }
}
