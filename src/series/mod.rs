//! Time-series lag-embedding and train/test split utilities.
//!
//! These are first-class, fully-owned utilities (not external collaborators):
//! turning a single observed sequence into a supervised `(X, y)` pair, and
//! splitting any `(X, y)` pair into train/test rows.

mod split;
mod timeseries;

pub use split::{gather_rows, gather_rows_vec, row_split_indices, split_data};
pub use timeseries::time_series_transformation;
