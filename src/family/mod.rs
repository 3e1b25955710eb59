//! The four GMDH model families. Each owns its candidate generation,
//! feature transform, and layer-advance policy; shared search mechanics
//! live in `crate::search`.

mod linear_common;
mod longterm;

mod combi;
mod mia;
mod multi;
mod ria;

pub use combi::Combi;
pub use mia::Mia;
pub use multi::Multi;
pub use ria::Ria;
