//! Forward-difference Jacobian.
//!
//! Step per parameter: `h_j = √ε · max(1, |x_j|)`, signed like `x_j` (zero
//! counts as positive). The step is then re-derived as `(x_j + h_j) − x_j`
//! so it is exactly representable.

use nalgebra::{DMatrix, DVector};

use crate::solve::Problem;

pub fn forward_difference<P: Problem + ?Sized>(problem: &P, x: &DVector<f64>, f0: &DVector<f64>) -> DMatrix<f64> {
    let m = f0.len();
    let n = x.len();
    let rel = f64::EPSILON.sqrt();

    let mut jac = DMatrix::<f64>::zeros(m, n);
    let mut probe = x.clone();
    for j in 0..n {
        let xj = x[j];
        let sign = if xj >= 0.0 { 1.0 } else { -1.0 };
        let h = rel * sign * xj.abs().max(1.0);
        let h = (xj + h) - xj;

        probe[j] = xj + h;
        let f1 = problem.residuals(&probe);
        probe[j] = xj;

        for i in 0..m {
            jac[(i, j)] = (f1[i] - f0[i]) / h;
        }
    }
    jac
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Quadratic;

    impl Problem for Quadratic {
        fn residual_count(&self) -> usize {
            2
        }

        fn residuals(&self, x: &DVector<f64>) -> DVector<f64> {
            DVector::from_vec(vec![x[0] * x[0], x[0] * x[1]])
        }
    }

    #[test]
    fn matches_analytic_jacobian() {
        let x = DVector::from_vec(vec![1.5, -2.0]);
        let f0 = Quadratic.residuals(&x);
        let jac = forward_difference(&Quadratic, &x, &f0);
        assert!((jac[(0, 0)] - 3.0).abs() < 1e-6);
        assert!(jac[(0, 1)].abs() < 1e-12);
        assert!((jac[(1, 0)] + 2.0).abs() < 1e-6);
        assert!((jac[(1, 1)] - 1.5).abs() < 1e-6);
    }
}
