//! Shared long-term (multi-step) forecasting, common to all four families:
//! each already exposes a single-row forward pass, so sliding that pass
//! across a rolling window is family-agnostic.

use crate::error::GmdhError;

pub(crate) fn predict_long_term_generic(
    input_cols: usize,
    horizon: usize,
    seed: &[f64],
    mut predict_row: impl FnMut(&[f64]) -> Result<f64, GmdhError>,
) -> Result<Vec<f64>, GmdhError> {
    if horizon == 0 {
        return Err(GmdhError::invalid_argument("horizon must be >= 1"));
    }
    if seed.len() < input_cols {
        return Err(GmdhError::invalid_argument(format!(
            "seed has {} values but the model needs a window of {input_cols}",
            seed.len()
        )));
    }

    let mut window: Vec<f64> = seed[seed.len() - input_cols..].to_vec();
    let mut forecast = Vec::with_capacity(horizon);

    for _ in 0..horizon {
        let next = predict_row(&window)?;
        forecast.push(next);
        window.remove(0);
        window.push(next);
    }

    Ok(forecast)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slides_window_forward_by_one_each_step() {
        let mut seen_windows = Vec::new();
        let result = predict_long_term_generic(3, 2, &[1.0, 2.0, 3.0], |w| {
            seen_windows.push(w.to_vec());
            Ok(w.iter().sum::<f64>() / w.len() as f64)
        })
        .unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(seen_windows[0], vec![1.0, 2.0, 3.0]);
        assert_eq!(seen_windows[1], vec![2.0, 3.0, result[0]]);
    }

    #[test]
    fn rejects_zero_horizon() {
        let result = predict_long_term_generic(2, 0, &[1.0, 2.0], |_| Ok(0.0));
        assert!(result.is_err());
    }

    #[test]
    fn rejects_seed_shorter_than_window() {
        let result = predict_long_term_generic(3, 1, &[1.0, 2.0], |_| Ok(0.0));
        assert!(result.is_err());
    }
}
