//! Train/test row splitting, with an optional seeded shuffle.

use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row-contiguous train/test split of `(x, y)`.
///
/// When `shuffle` is `false`, rows are split in original order at
/// `floor(n * (1 - test_size))`. When `shuffle` is `true`, a seeded
/// permutation of row indices is taken first, so the same `seed` always
/// produces the same split.
pub fn split_data(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    test_size: f64,
    shuffle: bool,
    seed: u64,
) -> (DMatrix<f64>, DMatrix<f64>, DVector<f64>, DVector<f64>) {
    let (train_idx, test_idx) = row_split_indices(x.nrows(), test_size, shuffle, seed);
    (
        gather_rows(x, &train_idx),
        gather_rows(x, &test_idx),
        gather_rows_vec(y, &train_idx),
        gather_rows_vec(y, &test_idx),
    )
}

/// The row-index partition `split_data` applies, exposed directly so a
/// family whose data matrix changes shape between layers (MIA, RIA) can
/// re-slice each layer's matrix by the same train/test row identities.
pub fn row_split_indices(n: usize, test_size: f64, shuffle: bool, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let n_train = (n as f64 * (1.0 - test_size)).floor() as usize;
    let n_train = n_train.clamp(0, n);

    let mut order: Vec<usize> = (0..n).collect();
    if shuffle {
        let mut rng = StdRng::seed_from_u64(seed);
        order.shuffle(&mut rng);
    }

    (order[..n_train].to_vec(), order[n_train..].to_vec())
}

pub fn gather_rows(m: &DMatrix<f64>, rows: &[usize]) -> DMatrix<f64> {
    let mut out = DMatrix::<f64>::zeros(rows.len(), m.ncols());
    for (out_row, &src_row) in rows.iter().enumerate() {
        out.set_row(out_row, &m.row(src_row));
    }
    out
}

pub fn gather_rows_vec(v: &DVector<f64>, rows: &[usize]) -> DVector<f64> {
    DVector::from_iterator(rows.len(), rows.iter().map(|&i| v[i]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contiguous_split_preserves_order() {
        let x = DMatrix::from_row_slice(5, 1, &[1.0, 2.0, 3.0, 4.0, 5.0]);
        let y = DVector::from_vec(vec![10.0, 20.0, 30.0, 40.0, 50.0]);

        let (x_train, x_test, y_train, y_test) = split_data(&x, &y, 0.4, false, 0);

        assert_eq!(x_train.nrows(), 3);
        assert_eq!(x_test.nrows(), 2);
        assert_eq!(x_train[(0, 0)], 1.0);
        assert_eq!(x_train[(2, 0)], 3.0);
        assert_eq!(x_test[(0, 0)], 4.0);
        assert_eq!(y_train[0], 10.0);
        assert_eq!(y_test[1], 50.0);
    }

    #[test]
    fn shuffle_is_deterministic_under_seed() {
        let x = DMatrix::from_row_slice(10, 1, &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        let y = DVector::from_vec((0..10).map(|i| i as f64).collect());

        let a = split_data(&x, &y, 0.3, true, 42);
        let b = split_data(&x, &y, 0.3, true, 42);

        assert_eq!(a.0, b.0);
        assert_eq!(a.1, b.1);
        assert_eq!(a.2, b.2);
        assert_eq!(a.3, b.3);
    }
}
