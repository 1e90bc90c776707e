//! Parameter estimation.
//!
//! - residual problems (`problem`)
//! - forward-difference Jacobian (`jacobian`)
//! - trust-region least squares (`trf`)
//! - covariance at the solution and initial guesses

pub mod covariance;
pub mod guess;
pub mod jacobian;
pub mod problem;
pub mod trf;

pub use covariance::covariance;
pub use guess::vertex_guess;
pub use problem::{BoundaryProblem, Problem, SampleProblem};
pub use trf::{SolveReport, Termination, least_squares};
