//! Shared model types: combinations, layers, and fit-time parameters.
//!
//! These are the plain-data shapes every family builds its layers out of.
//! Family-specific layout (which columns a combination's indices refer to,
//! how a layer's output feeds the next) lives in `family::*`; this module
//! only fixes the common vocabulary.

mod params;

pub use params::{CombiParams, FitParams, MiaParams, MultiParams, RiaParams};

use serde::{Deserialize, Serialize};

use crate::math::SolverKind;

/// Index of a column in a layer's working data matrix.
pub type ColIndex = u16;

/// One candidate model kept (or discarded) within a layer: the columns it
/// was built from, its fitted coefficients, and the external-criterion
/// score used to rank it against its layer-mates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combination {
    pub indices: Vec<ColIndex>,
    pub coeffs: Vec<f64>,
    pub score: f64,
}

impl Combination {
    pub fn new(indices: Vec<ColIndex>, coeffs: Vec<f64>, score: f64) -> Self {
        Self { indices, coeffs, score }
    }
}

/// The `k_best` survivors of one layer of the search, in descending rank
/// (best first).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub combinations: Vec<Combination>,
}

impl Layer {
    pub fn best(&self) -> Option<&Combination> {
        self.combinations.first()
    }
}

/// Re-exported so callers building a `FitParams` don't need a separate
/// `use crate::math::SolverKind` for the common case.
pub type Solver = SolverKind;
