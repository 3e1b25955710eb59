//! COMBI: linear regression over a growing subset of the original
//! variables, keeping exactly one surviving combination per layer.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::GmdhError;
use crate::model::{CombiParams, Combination};
use crate::search::combinations;

use super::linear_common::{fit_linear, predict_linear, prune_to_single_combination};
use super::longterm::predict_long_term_generic;

/// A fitted COMBI model: one linear combination over a subset of the
/// original variables, found by growing that subset one variable at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combi {
    combination: Combination,
    input_cols: usize,
}

impl Combi {
    /// `k_best` is not part of this family's API: the engine always keeps
    /// exactly one combination per layer for COMBI (see design notes).
    pub fn fit(x: &DMatrix<f64>, y: &nalgebra::DVector<f64>, params: CombiParams) -> Result<Self, GmdhError> {
        let params = params.normalize();
        let outcome = fit_linear(x, y, &params, 1, |m, layer, _prev| {
            if layer > m {
                return Vec::new();
            }
            combinations(m, layer)
        })?;
        let combination = prune_to_single_combination(outcome.layers);
        Ok(Self { combination, input_cols: outcome.input_cols })
    }

    pub fn input_cols_number(&self) -> usize {
        self.input_cols
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Result<Vec<f64>, GmdhError> {
        self.check_width(x)?;
        Ok(predict_linear(&self.combination, x))
    }

    pub fn predict_row(&self, row: &[f64]) -> Result<f64, GmdhError> {
        let x = DMatrix::from_row_slice(1, row.len(), row);
        Ok(self.predict(&x)?[0])
    }

    pub fn predict_long_term(&self, seed: &[f64], horizon: usize) -> Result<Vec<f64>, GmdhError> {
        predict_long_term_generic(self.input_cols, horizon, seed, |row| self.predict_row(row))
    }

    pub fn save(&self, path: &std::path::Path) -> Result<(), crate::error::PersistError> {
        crate::persist::save(path, &crate::persist::PersistedModel::Combi(self.clone()))
    }

    pub fn load(path: &std::path::Path) -> Result<Self, crate::error::PersistError> {
        match crate::persist::load_expecting(path, "combi")? {
            crate::persist::PersistedModel::Combi(model) => Ok(model),
            _ => unreachable!("load_expecting already checked the family tag"),
        }
    }

    fn check_width(&self, x: &DMatrix<f64>) -> Result<(), GmdhError> {
        if x.ncols() != self.input_cols {
            return Err(GmdhError::invalid_argument(format!(
                "expected {} columns, got {}",
                self.input_cols,
                x.ncols()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criterion::{Criterion, CriterionKind};
    use crate::series::time_series_transformation;
    use nalgebra::DVector;

    #[test]
    fn recovers_exact_linear_series() {
        let values: Vec<f64> = (1..=17).map(|i| i as f64).collect();
        let v = DVector::from_vec(values);
        let (x, y) = time_series_transformation(&v, 5).unwrap();

        let params = CombiParams::new(Criterion::Primitive(CriterionKind::Regularity));
        let model = Combi::fit(&x, &y, params).unwrap();

        let last_row = x.row(x.nrows() - 1).iter().copied().collect::<Vec<_>>();
        let mut next_input = last_row[1..].to_vec();
        next_input.push(y[y.len() - 1]);
        let prediction = model.predict_row(&next_input).unwrap();
        assert!((prediction - 17.0).abs() < 1e-6, "expected 17.0, got {prediction}");
    }

    #[test]
    fn predict_rejects_wrong_column_count() {
        let x = DMatrix::from_row_slice(4, 2, &[1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0, 5.0]);
        let y = DVector::from_row_slice(&[3.0, 5.0, 7.0, 9.0]);
        let params = CombiParams::new(Criterion::Primitive(CriterionKind::Regularity));
        let model = Combi::fit(&x, &y, params).unwrap();
        let bad = DMatrix::from_row_slice(1, 3, &[1.0, 2.0, 3.0]);
        assert!(model.predict(&bad).is_err());
    }
}
