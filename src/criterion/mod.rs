//! External criteria used to rank candidate partial models within a layer.

mod cache;
mod compose;
mod kinds;

pub use cache::CandidateCache;
pub use compose::{evaluate, evaluate_second_pass, Criterion};
pub use kinds::{CriterionKind, CriterionOutcome};
