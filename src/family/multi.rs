//! MULTI: linear regression over a subset of the original variables grown
//! greedily — each layer extends the previous layer's surviving subsets by
//! one variable, keeping the `k_best` highest-ranked.

use std::collections::HashSet;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::GmdhError;
use crate::model::{Combination, Layer, MultiParams};
use crate::search::combinations;

use super::linear_common::{fit_linear, predict_linear, prune_to_single_combination};
use super::longterm::predict_long_term_generic;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Multi {
    combination: Combination,
    input_cols: usize,
}

impl Multi {
    pub fn fit(x: &DMatrix<f64>, y: &DVector<f64>, params: MultiParams) -> Result<Self, GmdhError> {
        let params = params.validated()?;
        let k_best = params.k_best;
        let outcome = fit_linear(x, y, &params.fit, k_best, |m, layer, prev| generate(m, layer, prev))?;
        let combination = prune_to_single_combination(outcome.layers);
        Ok(Self { combination, input_cols: outcome.input_cols })
    }

    pub fn input_cols_number(&self) -> usize {
        self.input_cols
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Result<Vec<f64>, GmdhError> {
        if x.ncols() != self.input_cols {
            return Err(GmdhError::invalid_argument(format!("expected {} columns, got {}", self.input_cols, x.ncols())));
        }
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
        crate::persist::save(path, &crate::persist::PersistedModel::Multi(self.clone()))
    }

    pub fn load(path: &std::path::Path) -> Result<Self, crate::error::PersistError> {
        match crate::persist::load_expecting(path, "multi")? {
            crate::persist::PersistedModel::Multi(model) => Ok(model),
            _ => unreachable!("load_expecting already checked the family tag"),
        }
    }
}

/// Layer 1: all singleton subsets. Layer `L > 1`: extend every retained
/// combination from the previous layer by every variable it doesn't
/// already contain, de-duplicated as sets.
fn generate(m: usize, layer: usize, prev: Option<&Layer>) -> Vec<Vec<u16>> {
    if layer == 1 {
        return combinations(m, 1);
    }
    let Some(prev) = prev else { return Vec::new() };

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for combo in &prev.combinations {
        // drop the bias column appended by the driver before generation.
        let base = &combo.indices[..combo.indices.len() - 1];
        for var in 0..m as u16 {
            if base.contains(&var) {
                continue;
            }
            let mut extended: Vec<u16> = base.to_vec();
            extended.push(var);
            extended.sort_unstable();
            if seen.insert(extended.clone()) {
                out.push(extended);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criterion::{Criterion, CriterionKind};
    use crate::series::time_series_transformation;

    #[test]
    fn recovers_exact_linear_series() {
        let values: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        let v = DVector::from_vec(values);
        let (x, y) = time_series_transformation(&v, 4).unwrap();

        let params = MultiParams::new(Criterion::Primitive(CriterionKind::Regularity), 3);
        let model = Multi::fit(&x, &y, params).unwrap();
        assert_eq!(model.input_cols_number(), 4);
    }

    #[test]
    fn generate_deduplicates_extensions() {
        let layer = Layer {
            combinations: vec![
                Combination::new(vec![0, 1, 3], vec![], 1.0),
                Combination::new(vec![1, 2, 3], vec![], 1.0),
            ],
        };
        let next = generate(3, 2, Some(&layer));
        let mut sorted = next.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(next.len(), sorted.len());
    }
}
