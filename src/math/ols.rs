//! Linear least squares via SVD.
//!
//! Used for the polynomial pre-fit that seeds `regress`:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! Nalgebra's `QR::solve` is intended for square systems and panics for tall
//! matrices, so we go through SVD, which also copes with near-collinear
//! columns.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Fit `y ≈ Σ_k p_k x^k` for `k = 0..=degree` and return `[p_0, .., p_degree]`.
///
/// Needs more points than coefficients; returns `None` otherwise.
pub fn fit_polynomial(xs: &[f64], ys: &[f64], degree: usize) -> Option<Vec<f64>> {
    let n = xs.len();
    let p = degree + 1;
    if n != ys.len() || n < p {
        return None;
    }

    let mut design = DMatrix::<f64>::zeros(n, p);
    for (i, &x) in xs.iter().enumerate() {
        let mut power = 1.0;
        for k in 0..p {
            design[(i, k)] = power;
            power *= x;
        }
    }
    let y = DVector::from_column_slice(ys);

    solve_least_squares(&design, &y).map(|beta| beta.iter().copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn polynomial_fit_recovers_quadratic() {
        let xs: Vec<f64> = (0..8).map(|i| i as f64 * 0.5).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 1.5 - 0.25 * x + 0.75 * x * x).collect();
        let p = fit_polynomial(&xs, &ys, 2).unwrap();
        assert!((p[0] - 1.5).abs() < 1e-9);
        assert!((p[1] + 0.25).abs() < 1e-9);
        assert!((p[2] - 0.75).abs() < 1e-9);
    }

    #[test]
    fn polynomial_fit_needs_enough_points() {
        assert!(fit_polynomial(&[0.0, 1.0], &[1.0, 2.0], 2).is_none());
    }
}
