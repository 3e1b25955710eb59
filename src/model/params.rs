//! Fit-time parameter bundles, one per family, and their soft/hard validation.
//!
//! Soft parameters (`test_size`, `p_average`, `limit`, `verbose`, `threads`)
//! are never fatal: an out-of-range value is warned about via `log::warn!`
//! and replaced with its documented default. Hard parameters (`k_best` for
//! MIA/RIA, and the matching minimum column count) raise
//! [`GmdhError::invalid_argument`] instead, since there is no safe default
//! that wouldn't silently change what the caller asked for.

use crate::criterion::Criterion;
use crate::error::GmdhError;
use crate::math::PolynomialType;

/// Parameters shared by every family's `fit` entry point.
#[derive(Debug, Clone)]
pub struct FitParams {
    pub criterion: Criterion,
    pub test_size: f64,
    pub p_average: usize,
    pub threads: i32,
    pub verbose: u8,
    pub limit: f64,
    pub solver: SolverKind,
}

impl FitParams {
    pub fn new(criterion: Criterion) -> Self {
        Self {
            criterion,
            test_size: 0.5,
            p_average: 1,
            threads: 1,
            verbose: 0,
            limit: 0.0,
            solver: SolverKind::Fast,
        }
    }

    /// Apply the warning-with-fallback rules, logging each substitution.
    /// Never returns an error: every field here has a safe default.
    pub fn normalize(mut self) -> Self {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            log::warn!("test_size {} out of range (0,1), defaulting to 0.5", self.test_size);
            self.test_size = 0.5;
        }
        if self.p_average < 1 {
            log::warn!("p_average {} < 1, defaulting to 1", self.p_average);
            self.p_average = 1;
        }
        if self.limit < 0.0 {
            log::warn!("limit {} < 0, defaulting to 0", self.limit);
            self.limit = 0.0;
        }
        if self.verbose > 1 {
            log::warn!("verbose {} is not 0 or 1, defaulting to 0", self.verbose);
            self.verbose = 0;
        }
        self
    }
}

/// `Combi::fit` has no `k_best` field at all: the engine always keeps
/// exactly one combination per layer for this family.
pub type CombiParams = FitParams;

#[derive(Debug, Clone)]
pub struct MultiParams {
    pub fit: FitParams,
    pub k_best: usize,
}

impl MultiParams {
    pub fn new(criterion: Criterion, k_best: usize) -> Self {
        Self { fit: FitParams::new(criterion), k_best }
    }

    /// Validate hard constraints and normalize soft ones. `k_best` has no
    /// lower bound requirement for MULTI (unlike MIA/RIA) beyond being
    /// nonzero, since a layer must keep at least one candidate.
    pub fn validated(mut self) -> Result<Self, GmdhError> {
        if self.k_best == 0 {
            return Err(GmdhError::invalid_argument("k_best must be >= 1"));
        }
        self.fit = self.fit.normalize();
        Ok(self)
    }
}

#[derive(Debug, Clone)]
pub struct MiaParams {
    pub fit: FitParams,
    pub k_best: usize,
    pub polynomial_type: PolynomialType,
}

impl MiaParams {
    pub fn new(criterion: Criterion, k_best: usize, polynomial_type: PolynomialType) -> Self {
        Self { fit: FitParams::new(criterion), k_best, polynomial_type }
    }

    /// MIA/RIA require `k_best >= 3`: a layer of fewer than 3 retained
    /// combinations can't produce C(k,2) >= 3 distinct pairs for the next
    /// layer's partial descriptions.
    pub fn validated(mut self, input_cols: usize) -> Result<Self, GmdhError> {
        if self.k_best < 3 {
            return Err(GmdhError::invalid_argument(format!("MIA/RIA require k_best >= 3, got {}", self.k_best)));
        }
        if input_cols < 3 {
            return Err(GmdhError::invalid_argument(format!(
                "MIA/RIA require at least 3 input columns, got {input_cols}"
            )));
        }
        self.fit = self.fit.normalize();
        Ok(self)
    }
}

pub type RiaParams = MiaParams;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criterion::{Criterion, CriterionKind};

    fn crit() -> Criterion {
        Criterion::Primitive(CriterionKind::Regularity)
    }

    #[test]
    fn normalize_replaces_out_of_range_soft_params() {
        let mut p = FitParams::new(crit());
        p.test_size = 1.5;
        p.p_average = 0;
        p.limit = -1.0;
        p.verbose = 9;
        let p = p.normalize();
        assert_eq!(p.test_size, 0.5);
        assert_eq!(p.p_average, 1);
        assert_eq!(p.limit, 0.0);
        assert_eq!(p.verbose, 0);
    }

    #[test]
    fn mia_rejects_k_best_below_three() {
        let p = MiaParams::new(crit(), 2, PolynomialType::Quadratic);
        assert!(p.validated(10).is_err());
    }

    #[test]
    fn mia_rejects_too_few_input_columns() {
        let p = MiaParams::new(crit(), 3, PolynomialType::Quadratic);
        assert!(p.validated(2).is_err());
    }

    #[test]
    fn multi_rejects_zero_k_best() {
        let p = MultiParams::new(crit(), 0);
        assert!(p.validated().is_err());
    }
}
