//! MIA: multilayer iterative analysis. Each layer pairs two columns of the
//! previous layer's output matrix through a two-variable polynomial; the
//! retained outputs (plus a fresh bias column) become the next layer's
//! input matrix, rebuilt from scratch every layer.

use std::collections::HashMap;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::GmdhError;
use crate::math::{expand_pair, expand_pair_row, PolynomialType};
use crate::model::{Combination, Layer, MiaParams};
use crate::search::{
    apply_sequential_second_pass, augment_with_bias, combinations, evaluate_candidates, into_combinations, layer_score,
    resolve_thread_pool, should_stop, Candidate,
};

use super::longterm::predict_long_term_generic;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mia {
    polynomial_type: PolynomialType,
    layers: Vec<Layer>,
    input_cols: usize,
}

impl Mia {
    pub fn fit(x: &DMatrix<f64>, y: &DVector<f64>, params: MiaParams) -> Result<Self, GmdhError> {
        if x.nrows() != y.len() {
            return Err(GmdhError::invalid_argument(format!(
                "x has {} rows but y has {} entries",
                x.nrows(),
                y.len()
            )));
        }
        let params = params.validated(x.ncols())?;
        let k_best = params.k_best;
        let poly = params.polynomial_type;
        let fit = &params.fit;

        let (train_idx, test_idx) = crate::series::row_split_indices(x.nrows(), fit.test_size, false, 0);
        let y_train = crate::series::gather_rows_vec(y, &train_idx);
        let y_test = crate::series::gather_rows_vec(y, &test_idx);

        let pool = resolve_thread_pool(fit.threads);
        let mut data = augment_with_bias(x);
        let mut layers: Vec<Layer> = Vec::new();
        let mut best_score = f64::INFINITY;
        let mut layer_idx = 1usize;

        loop {
            let n_cols = data.ncols();
            if n_cols < 2 {
                break;
            }
            let pairs = combinations(n_cols, 2);
            if pairs.is_empty() {
                break;
            }

            let x_train = crate::series::gather_rows(&data, &train_idx);
            let x_test = crate::series::gather_rows(&data, &test_idx);

            let candidates: Vec<Candidate> = pairs
                .into_iter()
                .map(|pair| {
                    let (i, j) = (pair[0] as usize, pair[1] as usize);
                    Candidate {
                        x_train: expand_pair(&x_train, i, j, poly),
                        x_test: expand_pair(&x_test, i, j, poly),
                        indices: pair,
                    }
                })
                .collect();

            let scored = evaluate_candidates(&pool, &candidates, &y_train, &y_test, &fit.criterion, fit.solver);
            let top = crate::search::select_top_k(scored, k_best);
            let top = apply_sequential_second_pass(top, &candidates, &y_train, &y_test, &fit.criterion, fit.solver);
            let s_l = layer_score(&top, fit.p_average);

            if fit.verbose == 1 {
                log::info!("layer {layer_idx}: {} candidates, score={s_l}", candidates.len());
            }
            if should_stop(best_score, s_l, fit.limit) {
                break;
            }
            best_score = s_l;

            let retained = into_combinations(top);
            data = rebuild_layer_matrix(&data, &retained, poly);
            layers.push(Layer { combinations: retained });
            layer_idx += 1;
        }

        if layers.is_empty() {
            return Err(GmdhError::invalid_argument("fit produced no layers: every candidate was rejected by the criterion"));
        }

        let layers = prune_mia(layers);
        Ok(Self { polynomial_type: poly, layers, input_cols: x.ncols() })
    }

    pub fn input_cols_number(&self) -> usize {
        self.input_cols
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Result<Vec<f64>, GmdhError> {
        if x.ncols() != self.input_cols {
            return Err(GmdhError::invalid_argument(format!("expected {} columns, got {}", self.input_cols, x.ncols())));
        }
        let mut z = augment_with_bias(x);
        for layer in &self.layers {
            z = rebuild_layer_matrix(&z, &layer.combinations, self.polynomial_type);
        }
        Ok(z.column(0).iter().copied().collect())
    }

    pub fn predict_row(&self, row: &[f64]) -> Result<f64, GmdhError> {
        let x = DMatrix::from_row_slice(1, row.len(), row);
        Ok(self.predict(&x)?[0])
    }

    pub fn predict_long_term(&self, seed: &[f64], horizon: usize) -> Result<Vec<f64>, GmdhError> {
        predict_long_term_generic(self.input_cols, horizon, seed, |row| self.predict_row(row))
    }

    pub fn save(&self, path: &std::path::Path) -> Result<(), crate::error::PersistError> {
        crate::persist::save(path, &crate::persist::PersistedModel::Mia(self.clone()))
    }

    pub fn load(path: &std::path::Path) -> Result<Self, crate::error::PersistError> {
        match crate::persist::load_expecting(path, "mia")? {
            crate::persist::PersistedModel::Mia(model) => Ok(model),
            _ => unreachable!("load_expecting already checked the family tag"),
        }
    }
}

/// Build the next layer's input matrix: one column per retained
/// combination's fitted polynomial applied to `data`'s two source columns,
/// plus a trailing bias column.
fn rebuild_layer_matrix(data: &DMatrix<f64>, retained: &[Combination], poly: PolynomialType) -> DMatrix<f64> {
    let n_rows = data.nrows();
    let width = retained.len() + 1;
    let mut out = DMatrix::<f64>::zeros(n_rows, width);
    for (col, combo) in retained.iter().enumerate() {
        let (i, j) = (combo.indices[0] as usize, combo.indices[1] as usize);
        for row in 0..n_rows {
            let terms = expand_pair_row(data[(row, i)], data[(row, j)], poly);
            out[(row, col)] = terms.iter().zip(combo.coeffs.iter()).map(|(t, c)| t * c).sum();
        }
    }
    for row in 0..n_rows {
        out[(row, width - 1)] = 1.0;
    }
    out
}

/// `remove_extra_combinations` for MIA: walk backward from the single best
/// final combination, keeping only the previous layer's combinations it
/// actually references, and re-indexing forward references accordingly.
fn prune_mia(mut layers: Vec<Layer>) -> Vec<Layer> {
    let last = layers.pop().expect("fit never returns empty layers");
    let best = last.combinations.into_iter().next().expect("a layer always keeps at least one combination");
    let mut pruned: Vec<Layer> = vec![Layer { combinations: vec![best] }];

    while let Some(prev_layer) = layers.pop() {
        let prev_width = prev_layer.combinations.len() + 1;
        let bias_marker = prev_width - 1;

        let mut used: Vec<usize> = pruned
            .last()
            .unwrap()
            .combinations
            .iter()
            .flat_map(|c| c.indices.iter().copied())
            .map(|idx| idx as usize)
            .filter(|&idx| idx != bias_marker)
            .collect();
        used.sort_unstable();
        used.dedup();

        let mapping: HashMap<usize, u16> = used.iter().enumerate().map(|(new_pos, &old_pos)| (old_pos, new_pos as u16)).collect();
        let new_bias = used.len() as u16;

        for combo in pruned.last_mut().unwrap().combinations.iter_mut() {
            for idx in combo.indices.iter_mut() {
                *idx = if *idx as usize == bias_marker { new_bias } else { mapping[&(*idx as usize)] };
            }
        }

        let retained_prev: Vec<Combination> = used.iter().map(|&old_pos| prev_layer.combinations[old_pos].clone()).collect();
        pruned.push(Layer { combinations: retained_prev });
    }

    pruned.reverse();
    pruned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criterion::{Criterion, CriterionKind};
    use crate::series::time_series_transformation;

    #[test]
    fn fits_and_predicts_on_a_synthetic_series() {
        let values: Vec<f64> = (1..=40).map(|i| i as f64).collect();
        let v = DVector::from_vec(values);
        let (x, y) = time_series_transformation(&v, 4).unwrap();

        let params = MiaParams::new(Criterion::Primitive(CriterionKind::Regularity), 4, PolynomialType::Linear);
        let model = Mia::fit(&x, &y, params).unwrap();
        assert_eq!(model.input_cols_number(), 4);

        let row = x.row(0).iter().copied().collect::<Vec<_>>();
        let prediction = model.predict_row(&row).unwrap();
        assert!(prediction.is_finite());
    }

    #[test]
    fn fit_is_deterministic_across_thread_counts() {
        let values: Vec<f64> = (1..=60).map(|i| i as f64).collect();
        let v = DVector::from_vec(values);
        let (x, y) = time_series_transformation(&v, 4).unwrap();

        let mut params1 = MiaParams::new(Criterion::Primitive(CriterionKind::Regularity), 4, PolynomialType::Linear);
        params1.fit.threads = 1;
        let mut params4 = MiaParams::new(Criterion::Primitive(CriterionKind::Regularity), 4, PolynomialType::Linear);
        params4.fit.threads = 4;

        let model1 = Mia::fit(&x, &y, params1).unwrap();
        let model4 = Mia::fit(&x, &y, params4).unwrap();

        assert_eq!(model1.layers, model4.layers);
    }

    #[test]
    fn rejects_k_best_below_three() {
        let x = DMatrix::from_row_slice(10, 3, &(0..30).map(|v| v as f64).collect::<Vec<_>>());
        let y = DVector::from_row_slice(&(0..10).map(|v| v as f64).collect::<Vec<_>>());
        let params = MiaParams::new(Criterion::Primitive(CriterionKind::Regularity), 2, PolynomialType::Linear);
        assert!(Mia::fit(&x, &y, params).is_err());
    }

    #[test]
    fn prune_mia_collapses_final_layer_to_one_combination() {
        let layer1 = Layer {
            combinations: vec![
                Combination::new(vec![0, 1], vec![1.0, 1.0, 1.0], 1.0),
                Combination::new(vec![1, 2], vec![1.0, 1.0, 1.0], 2.0),
                Combination::new(vec![0, 2], vec![1.0, 1.0, 1.0], 3.0),
            ],
        };
        let layer2 = Layer {
            combinations: vec![Combination::new(vec![0, 1], vec![1.0, 1.0, 1.0], 0.5)],
        };
        let pruned = prune_mia(vec![layer1, layer2]);
        assert_eq!(pruned.last().unwrap().combinations.len(), 1);
        assert_eq!(pruned.len(), 2);
    }
}
