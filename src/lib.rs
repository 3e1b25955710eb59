//! `gmdh` library crate: layered inductive regression over tabular or
//! time-series data.
//!
//! Four model families live under [`family`] (`Combi`, `Multi`, `Mia`,
//! `Ria`), each built on the shared search machinery in [`search`] and
//! ranked every layer by an external [`criterion`]. [`series`] turns a
//! single observed sequence into a supervised matrix/vector pair;
//! [`persist`] saves and loads a fitted model as a self-identifying JSON
//! document.

pub mod criterion;
pub mod error;
pub mod family;
pub mod math;
pub mod model;
pub mod persist;
pub mod search;
pub mod series;

pub use criterion::{Criterion, CriterionKind};
pub use error::{GmdhError, PersistCode, PersistError};
pub use family::{Combi, Mia, Multi, Ria};
pub use model::{CombiParams, FitParams, MiaParams, MultiParams, RiaParams};
pub use persist::PersistedModel;
pub use series::time_series_transformation;
