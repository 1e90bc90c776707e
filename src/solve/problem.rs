//! Residual problems handed to the least-squares solver.
//!
//! - [`BoundaryProblem`]: curve through two endpoints with a given arc length
//!   (three equations, three unknowns)
//! - [`SampleProblem`]: curve through a set of samples (one equation per sample)

use nalgebra::{DMatrix, DVector};

use crate::domain::{BoundaryConditions, ModelKind, Sample};
use crate::models::{arc_length, evaluate};

/// A vector-valued residual function `f: ℝⁿ → ℝᵐ`.
pub trait Problem {
    /// Number of residuals `m`.
    fn residual_count(&self) -> usize;

    /// Residuals at `x`. Non-finite entries are allowed and handled by the solver.
    fn residuals(&self, x: &DVector<f64>) -> DVector<f64>;

    /// Jacobian at `x`, given `f0 = residuals(x)`.
    fn jacobian(&self, x: &DVector<f64>, f0: &DVector<f64>) -> DMatrix<f64> {
        crate::solve::jacobian::forward_difference(self, x, f0)
    }
}

/// `[y(x1) − y1, y(x2) − y2, s(x1, x2) − L]` for one model kind.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryProblem {
    pub kind: ModelKind,
    pub conditions: BoundaryConditions,
}

impl BoundaryProblem {
    pub fn new(kind: ModelKind, conditions: BoundaryConditions) -> Self {
        Self { kind, conditions }
    }
}

impl Problem for BoundaryProblem {
    fn residual_count(&self) -> usize {
        3
    }

    fn residuals(&self, x: &DVector<f64>) -> DVector<f64> {
        let p = x.as_slice();
        let bc = &self.conditions;
        DVector::from_vec(vec![
            evaluate(self.kind, bc.x1, p) - bc.y1,
            evaluate(self.kind, bc.x2, p) - bc.y2,
            arc_length(self.kind, bc.x1, bc.x2, p) - bc.arc_length,
        ])
    }
}

/// `y(x_i) − y_i` over every sample.
#[derive(Debug, Clone)]
pub struct SampleProblem<'a> {
    pub kind: ModelKind,
    pub samples: &'a [Sample],
}

impl<'a> SampleProblem<'a> {
    pub fn new(kind: ModelKind, samples: &'a [Sample]) -> Self {
        Self { kind, samples }
    }
}

impl Problem for SampleProblem<'_> {
    fn residual_count(&self) -> usize {
        self.samples.len()
    }

    fn residuals(&self, x: &DVector<f64>) -> DVector<f64> {
        let p = x.as_slice();
        DVector::from_iterator(
            self.samples.len(),
            self.samples.iter().map(|s| evaluate(self.kind, s.x, p) - s.y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{vertex, vertex_arc_length};

    #[test]
    fn boundary_residuals_vanish_at_generating_params() {
        let (a, b, c) = (5.03, -1.841, -0.1362);
        let (x1, x2) = (0.00021, 0.603);
        let conditions = BoundaryConditions {
            x1,
            y1: vertex(x1, a, b, c),
            x2,
            y2: vertex(x2, a, b, c),
            arc_length: vertex_arc_length(x1, x2, a, b),
        };
        let problem = BoundaryProblem::new(ModelKind::Vertex, conditions);
        let r = problem.residuals(&DVector::from_vec(vec![a, b, c]));
        assert_eq!(r.len(), 3);
        assert!(r.iter().all(|v| v.abs() < 1e-14));
    }

    #[test]
    fn sample_residuals_have_one_entry_per_sample() {
        let samples = vec![Sample::new(0.0, 1.0), Sample::new(1.0, 2.0), Sample::new(2.0, 3.0)];
        let problem = SampleProblem::new(ModelKind::Vertex, &samples);
        let r = problem.residuals(&DVector::from_vec(vec![1.0, 0.0, 0.0]));
        assert_eq!(r.len(), problem.residual_count());
        // cosh(0)/1 - 1 = 0
        assert!(r[0].abs() < 1e-15);
    }
}
