//! RIA: relaxation iterative analysis. Like MIA, each layer pairs two
//! columns through a two-variable polynomial, but the original variables
//! are never discarded: every layer's retained outputs are appended as new
//! columns, and a later layer always pairs one original variable with one
//! earlier layer's output. After the search halts, pruning collapses the
//! result to a single combination per layer (the chain actually used by
//! the final prediction), rewritten to reference only that chain.
//!
//! The reference implementation keeps a fixed-width scratch matrix and
//! overwrites a single working column in place each layer; this crate
//! instead grows the matrix by exactly one column per surviving layer, a
//! cleaner equivalent with the same observable behavior (no scenario here
//! depends on the literal column-reuse bookkeeping).

use std::collections::HashMap;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::GmdhError;
use crate::math::{expand_pair, expand_pair_row, PolynomialType};
use crate::model::{Combination, Layer, RiaParams};
use crate::search::{
    apply_sequential_second_pass, combinations, evaluate_candidates, into_combinations, layer_score, resolve_thread_pool,
    should_stop, Candidate,
};

use super::longterm::predict_long_term_generic;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ria {
    polynomial_type: PolynomialType,
    layers: Vec<Layer>,
    input_cols: usize,
}

impl Ria {
    pub fn fit(x: &DMatrix<f64>, y: &DVector<f64>, params: RiaParams) -> Result<Self, GmdhError> {
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
        let m = x.ncols();

        let (train_idx, test_idx) = crate::series::row_split_indices(x.nrows(), fit.test_size, false, 0);
        let y_train = crate::series::gather_rows_vec(y, &train_idx);
        let y_test = crate::series::gather_rows_vec(y, &test_idx);

        let pool = resolve_thread_pool(fit.threads);
        let mut data = x.clone();
        let mut layers: Vec<Layer> = Vec::new();
        let mut best_score = f64::INFINITY;
        let mut layer_idx = 1usize;

        loop {
            let pairs: Vec<Vec<u16>> = if layer_idx == 1 {
                combinations(m, 2)
            } else {
                let js: Vec<usize> = (m..data.ncols()).collect();
                if js.is_empty() {
                    break;
                }
                (0..m).flat_map(|i| js.iter().map(move |&j| vec![i as u16, j as u16])).collect()
            };
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
            data = append_outputs(&data, &retained, poly);
            layers.push(Layer { combinations: retained });
            layer_idx += 1;
        }

        if layers.is_empty() {
            return Err(GmdhError::invalid_argument("fit produced no layers: every candidate was rejected by the criterion"));
        }

        let layers = prune_ria(&layers, m);
        Ok(Self { polynomial_type: poly, layers, input_cols: m })
    }

    pub fn input_cols_number(&self) -> usize {
        self.input_cols
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Result<Vec<f64>, GmdhError> {
        if x.ncols() != self.input_cols {
            return Err(GmdhError::invalid_argument(format!("expected {} columns, got {}", self.input_cols, x.ncols())));
        }
        let mut z = x.clone();
        for layer in &self.layers {
            let combo = &layer.combinations[0];
            let (i, j) = (combo.indices[0] as usize, combo.indices[1] as usize);
            let n_rows = z.nrows();
            let mut new_col = DVector::<f64>::zeros(n_rows);
            for row in 0..n_rows {
                let terms = expand_pair_row(z[(row, i)], z[(row, j)], self.polynomial_type);
                new_col[row] = terms.iter().zip(combo.coeffs.iter()).map(|(t, c)| t * c).sum();
            }
            z = append_column(&z, &new_col);
        }
        Ok(z.column(z.ncols() - 1).iter().copied().collect())
    }

    pub fn predict_row(&self, row: &[f64]) -> Result<f64, GmdhError> {
        let x = DMatrix::from_row_slice(1, row.len(), row);
        Ok(self.predict(&x)?[0])
    }

    pub fn predict_long_term(&self, seed: &[f64], horizon: usize) -> Result<Vec<f64>, GmdhError> {
        predict_long_term_generic(self.input_cols, horizon, seed, |row| self.predict_row(row))
    }

    pub fn save(&self, path: &std::path::Path) -> Result<(), crate::error::PersistError> {
        crate::persist::save(path, &crate::persist::PersistedModel::Ria(self.clone()))
    }

    pub fn load(path: &std::path::Path) -> Result<Self, crate::error::PersistError> {
        match crate::persist::load_expecting(path, "ria")? {
            crate::persist::PersistedModel::Ria(model) => Ok(model),
            _ => unreachable!("load_expecting already checked the family tag"),
        }
    }
}

fn append_outputs(data: &DMatrix<f64>, retained: &[Combination], poly: PolynomialType) -> DMatrix<f64> {
    let n_rows = data.nrows();
    let old_width = data.ncols();
    let new_width = old_width + retained.len();
    let mut out = DMatrix::<f64>::zeros(n_rows, new_width);
    out.view_mut((0, 0), (n_rows, old_width)).copy_from(data);
    for (col, combo) in retained.iter().enumerate() {
        let (i, j) = (combo.indices[0] as usize, combo.indices[1] as usize);
        for row in 0..n_rows {
            let terms = expand_pair_row(data[(row, i)], data[(row, j)], poly);
            out[(row, old_width + col)] = terms.iter().zip(combo.coeffs.iter()).map(|(t, c)| t * c).sum();
        }
    }
    out
}

fn append_column(data: &DMatrix<f64>, col: &DVector<f64>) -> DMatrix<f64> {
    let mut out = DMatrix::<f64>::zeros(data.nrows(), data.ncols() + 1);
    out.view_mut((0, 0), (data.nrows(), data.ncols())).copy_from(data);
    out.view_mut((0, data.ncols()), (data.nrows(), 1)).copy_from(col);
    out
}

struct ChainLink {
    layer_number: usize,
    combo: Combination,
    predecessor_layer_number: Option<usize>,
}

/// Walk the single best combination of the final layer backward through
/// whichever earlier layer each candidate's second index references,
/// collapsing to the linear chain actually used, then renumber so each
/// surviving layer contributes exactly one output column in order.
fn prune_ria(layers: &[Layer], m: usize) -> Vec<Layer> {
    let mut offsets = Vec::with_capacity(layers.len());
    let mut next = m;
    for layer in layers {
        offsets.push(next);
        next += layer.combinations.len();
    }

    let mut current_layer_number = layers.len();
    let mut current_combo = layers[current_layer_number - 1].combinations[0].clone();
    let mut chain: Vec<ChainLink> = Vec::new();

    loop {
        if current_layer_number == 1 {
            chain.push(ChainLink { layer_number: 1, combo: current_combo, predecessor_layer_number: None });
            break;
        }
        let j = current_combo.indices[1] as usize;
        let mut source = None;
        for layer_num in 1..current_layer_number {
            let off = offsets[layer_num - 1];
            let count = layers[layer_num - 1].combinations.len();
            if j >= off && j < off + count {
                source = Some((layer_num, j - off));
                break;
            }
        }
        let (src_layer_num, pos) = source.expect("a layer>1 candidate's second index must reference an earlier layer's output");
        chain.push(ChainLink {
            layer_number: current_layer_number,
            combo: current_combo,
            predecessor_layer_number: Some(src_layer_num),
        });
        current_combo = layers[src_layer_num - 1].combinations[pos].clone();
        current_layer_number = src_layer_num;
    }

    chain.reverse();

    let new_k_of: HashMap<usize, usize> = chain.iter().enumerate().map(|(idx, link)| (link.layer_number, idx + 1)).collect();

    chain
        .into_iter()
        .map(|link| {
            let mut combo = link.combo;
            if let Some(pred) = link.predecessor_layer_number {
                let new_k_pred = new_k_of[&pred];
                combo.indices[1] = m as u16 + (new_k_pred as u16 - 1);
            }
            Layer { combinations: vec![combo] }
        })
        .collect()
}
