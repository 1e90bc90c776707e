//! Mathematical utilities: uncertainty propagation, scalar abstraction,
//! linear least squares, and the Monte Carlo cross-check.

pub mod monte_carlo;
pub mod ols;
pub mod scalar;
pub mod uncertain;

pub use ols::*;
pub use scalar::*;
pub use uncertain::*;
