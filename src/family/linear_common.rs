//! Shared layered-search driver for the two linear families (COMBI, MULTI):
//! identity feature transform, no data transformation between layers, and a
//! single surviving combination after pruning.

use nalgebra::{DMatrix, DVector};

use crate::error::GmdhError;
use crate::model::{Combination, FitParams, Layer};
use crate::search::{
    apply_sequential_second_pass, augment_with_bias, evaluate_candidates, into_combinations, layer_score, resolve_thread_pool,
    select_columns, select_top_k, should_stop, Candidate,
};

pub(crate) struct LinearFitOutcome {
    pub layers: Vec<Layer>,
    pub input_cols: usize,
}

/// Run the shared linear-family layered search. `generate` is called once
/// per layer with `(input_cols, layer_index, previous_layer)` and returns
/// the candidate index sets for that layer (excluding the bias column,
/// which this driver appends itself); an empty return stops the search.
pub(crate) fn fit_linear(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    params: &FitParams,
    k_best: usize,
    mut generate: impl FnMut(usize, usize, Option<&Layer>) -> Vec<Vec<u16>>,
) -> Result<LinearFitOutcome, GmdhError> {
    if x.nrows() != y.len() {
        return Err(GmdhError::invalid_argument(format!(
            "x has {} rows but y has {} entries",
            x.nrows(),
            y.len()
        )));
    }
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(GmdhError::invalid_argument("x must be non-empty in both dimensions"));
    }

    let m = x.ncols();
    let bias_col = m as u16;
    let x_plus = augment_with_bias(x);

    let (x_train, x_test, y_train, y_test) = crate::series::split_data(&x_plus, y, params.test_size, false, 0);

    let pool = resolve_thread_pool(params.threads);
    let mut layers: Vec<Layer> = Vec::new();
    let mut best_score = f64::INFINITY;
    let mut layer_idx = 1usize;

    loop {
        let raw = generate(m, layer_idx, layers.last());
        if raw.is_empty() {
            break;
        }

        let candidates: Vec<Candidate> = raw
            .into_iter()
            .map(|mut idx| {
                idx.push(bias_col);
                Candidate {
                    x_train: select_columns(&x_train, &idx),
                    x_test: select_columns(&x_test, &idx),
                    indices: idx,
                }
            })
            .collect();

        let scored = evaluate_candidates(&pool, &candidates, &y_train, &y_test, &params.criterion, params.solver);
        let top = select_top_k(scored, k_best);
        let top = apply_sequential_second_pass(top, &candidates, &y_train, &y_test, &params.criterion, params.solver);
        let s_l = layer_score(&top, params.p_average);

        if params.verbose == 1 {
            log::info!("layer {layer_idx}: {} candidates, score={s_l}", candidates.len());
        }

        if should_stop(best_score, s_l, params.limit) {
            break;
        }
        best_score = s_l;
        layers.push(Layer { combinations: into_combinations(top) });
        layer_idx += 1;
    }

    if layers.is_empty() {
        return Err(GmdhError::invalid_argument("fit produced no layers: every candidate was rejected by the criterion"));
    }
    Ok(LinearFitOutcome { layers, input_cols: m })
}

/// `remove_extra_combinations` for linear families: collapse to the single
/// best combination of the final layer.
pub(crate) fn prune_to_single_combination(layers: Vec<Layer>) -> Combination {
    layers.into_iter().last().expect("fit_linear never returns empty layers").combinations.into_iter().next().expect("a layer always keeps at least one combination")
}

/// `predict`: `X⁺[:, indices] . coeffs` for the single retained combination.
pub(crate) fn predict_linear(combination: &Combination, x: &DMatrix<f64>) -> Vec<f64> {
    let x_plus = augment_with_bias(x);
    let design = select_columns(&x_plus, &combination.indices);
    let coeffs = DVector::from_row_slice(&combination.coeffs);
    (design * coeffs).iter().copied().collect()
}
