//! Sliding-window lag embedding of a single observed sequence.

use nalgebra::{DMatrix, DVector};

use crate::error::GmdhError;

/// Turn a single sequence `v` into a supervised `(X, y)` pair using a sliding
/// window of width `lags`: `X[i] = v[i..i+lags]`, `y[i] = v[i+lags]`.
///
/// `lags` is a `usize`, so "lags <= 0" from the original contract collapses
/// to "lags == 0" here; negative lag counts are simply not representable.
pub fn time_series_transformation(
    v: &DVector<f64>,
    lags: usize,
) -> Result<(DMatrix<f64>, DVector<f64>), GmdhError> {
    if v.is_empty() {
        return Err(GmdhError::invalid_argument("time_series_transformation: `v` must not be empty"));
    }
    if lags == 0 {
        return Err(GmdhError::invalid_argument("time_series_transformation: `lags` must be >= 1"));
    }
    if lags >= v.len() {
        return Err(GmdhError::invalid_argument(format!(
            "time_series_transformation: `lags` ({lags}) must be < len(v) ({})",
            v.len()
        )));
    }

    let n_rows = v.len() - lags;
    let mut x = DMatrix::<f64>::zeros(n_rows, lags);
    let mut y = DVector::<f64>::zeros(n_rows);

    for i in 0..n_rows {
        for j in 0..lags {
            x[(i, j)] = v[i + j];
        }
        y[i] = v[i + lags];
    }

    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_recovers_contiguous_window() {
        let values: Vec<f64> = (1..=10).map(|i| i as f64).collect();
        let v = DVector::from_vec(values.clone());
        let (x, y) = time_series_transformation(&v, 4).unwrap();

        for i in 0..x.nrows() {
            for j in 0..4 {
                assert_eq!(x[(i, j)], values[i + j]);
            }
            assert_eq!(y[i], values[i + 4]);
        }
    }

    #[test]
    fn rejects_empty_vector() {
        let v = DVector::<f64>::zeros(0);
        assert!(time_series_transformation(&v, 1).is_err());
    }

    #[test]
    fn rejects_zero_lags() {
        let v = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        assert!(time_series_transformation(&v, 0).is_err());
    }

    #[test]
    fn rejects_lags_at_or_above_length() {
        let v = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0]);
        assert!(time_series_transformation(&v, 4).is_err());
        assert!(time_series_transformation(&v, 5).is_err());
    }
}
