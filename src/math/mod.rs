//! Mathematical utilities: polynomial feature expansion and least squares.

pub mod poly;
pub mod solver;

pub use poly::*;
pub use solver::*;

