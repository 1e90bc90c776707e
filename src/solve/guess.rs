//! Starting point for fitting the vertex form to samples.
//!
//! Near its lowest point `cosh(a·x + b)/a + c ≈ 1/a + c + b²/(2a) + b·x + (a/2)·x²`,
//! so a quadratic fit `p0 + p1·x + p2·x²` gives `a = 2·p2`, `b = p1`,
//! `c = p0 − 1/a − b²/(2a)`.

use tracing::debug;

use crate::error::AppError;
use crate::math::fit_polynomial;

pub fn vertex_guess(xs: &[f64], ys: &[f64]) -> Result<[f64; 3], AppError> {
    if xs.len() < 3 {
        return Err(AppError::data(format!(
            "Need at least 3 samples to derive an initial guess, got {}.",
            xs.len()
        )));
    }

    let coeffs = fit_polynomial(xs, ys, 2)
        .ok_or_else(|| AppError::runtime("Quadratic fit for the initial guess failed."))?;
    let (p0, p1, p2) = (coeffs[0], coeffs[1], coeffs[2]);
    if p2.abs() < 1e-12 {
        return Err(AppError::data(
            "Samples show no curvature; pass --guess explicitly.",
        ));
    }

    let a = 2.0 * p2;
    let b = p1;
    let c = p0 - 1.0 / a - b * b / (2.0 * a);
    debug!(a, b, c, "quadratic initial guess");
    Ok([a, b, c])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::vertex;

    #[test]
    fn close_to_true_parameters_for_a_shallow_curve() {
        let (a, b, c) = (0.5, -0.1, 1.0);
        let xs: Vec<f64> = (0..21).map(|i| -1.0 + 0.1 * i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|&x| vertex(x, a, b, c)).collect();
        let [ga, gb, gc] = vertex_guess(&xs, &ys).unwrap();
        assert!((ga - a).abs() < 0.05);
        assert!((gb - b).abs() < 0.05);
        assert!((gc - c).abs() < 0.05);
    }

    #[test]
    fn straight_line_is_rejected() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [1.0, 2.0, 3.0, 4.0];
        let err = vertex_guess(&xs, &ys).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_DATA);
    }
}
