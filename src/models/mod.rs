//! Catenary model implementations.
//!
//! Models are small, pure, generic functions so that the solver works on
//! plain numbers while reporting reuses the same formulas with uncertainty.

pub mod model;

pub use model::*;
