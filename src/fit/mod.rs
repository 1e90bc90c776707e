//! Fit evaluation.
//!
//! Responsibilities:
//!
//! - per-sample fitted values and residuals
//! - R² / RMSE
//! - dense grid with propagated σ for plots and exports
//! - optional Monte Carlo check of the grid σ

pub mod cross_check;
pub mod evaluator;

pub use cross_check::*;
pub use evaluator::*;
