//! Catenary model evaluation.
//!
//! The estimator and evaluator rely on three primitive operations:
//! - `y(x)` for a parameter vector (residuals, grids, plots)
//! - arc length between two abscissae (boundary problems)
//! - the same two operations on uncertain inputs (reporting)
//!
//! All formulas are generic over [`Scalar`], so the uncertain variants are the
//! plain formulas evaluated on [`Uncertain`].

use crate::domain::{CurveModel, MeasuredModel, ModelKind};
use crate::math::{Scalar, Uncertain};

/// `cosh(a·x + b) / a + c`
pub fn vertex<S: Scalar>(x: S, a: S, b: S, c: S) -> S {
    (a.clone() * x + b).cosh() / a + c
}

/// `(c1 / a) · cosh(a·(x − c2) / c1) − 1 / a`
pub fn shifted<S: Scalar>(x: S, a: S, c1: S, c2: S) -> S {
    let arg = a.clone() * (x - c2) / c1.clone();
    c1 / a.clone() * arg.cosh() - S::from(1.0) / a
}

/// Arc length of the vertex form over `[x1, x2]`: `(sinh(a·x2 + b) − sinh(a·x1 + b)) / a`.
pub fn vertex_arc_length<S: Scalar>(x1: S, x2: S, a: S, b: S) -> S {
    let s2 = (a.clone() * x2 + b.clone()).sinh();
    let s1 = (a.clone() * x1 + b).sinh();
    (s2 - s1) / a
}

/// Arc length of the shifted form over `[x1, x2]`:
/// `(c1 / a) · (sinh(a·(x2 − c2) / c1) − sinh(a·(x1 − c2) / c1))`.
pub fn shifted_arc_length<S: Scalar>(x1: S, x2: S, a: S, c1: S, c2: S) -> S {
    let s2 = (a.clone() * (x2 - c2.clone()) / c1.clone()).sinh();
    let s1 = (a.clone() * (x1 - c2) / c1.clone()).sinh();
    c1 / a * (s2 - s1)
}

/// Evaluate `y(x)` for the given model kind.
///
/// # Panics
/// Panics if `params` has fewer than `kind.param_count()` entries.
pub fn evaluate<S: Scalar>(kind: ModelKind, x: S, params: &[S]) -> S {
    let (p0, p1, p2) = (params[0].clone(), params[1].clone(), params[2].clone());
    match kind {
        ModelKind::Vertex => vertex(x, p0, p1, p2),
        ModelKind::Shifted => shifted(x, p0, p1, p2),
    }
}

/// Arc length over `[x1, x2]` for the given model kind.
///
/// # Panics
/// Panics if `params` has fewer than `kind.param_count()` entries.
pub fn arc_length<S: Scalar>(kind: ModelKind, x1: S, x2: S, params: &[S]) -> S {
    match kind {
        ModelKind::Vertex => vertex_arc_length(x1, x2, params[0].clone(), params[1].clone()),
        ModelKind::Shifted => shifted_arc_length(
            x1,
            x2,
            params[0].clone(),
            params[1].clone(),
            params[2].clone(),
        ),
    }
}

/// Predict `y(x)` for a plain-number model.
pub fn predict(model: &CurveModel, x: f64) -> f64 {
    evaluate(model.kind, x, &model.params)
}

/// Predict `y(x)` with propagated uncertainty; `x` may itself be uncertain.
pub fn predict_measured(model: &MeasuredModel, x: &Uncertain) -> Uncertain {
    evaluate(model.kind, x.clone(), &model.params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_matches_formula() {
        let (a, b, c) = (5.03, -1.841, -0.1362);
        for &x in &[0.0, 0.1, 0.3, 0.603] {
            let expected = (a * x + b).cosh() / a + c;
            assert!((vertex(x, a, b, c) - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn shifted_passes_through_vertex_offset() {
        // At x = c2 the cosh term is 1, so y = c1/a - 1/a.
        let (a, c1, c2) = (2.0, 0.5, 4.0);
        let y = shifted(c2, a, c1, c2);
        assert!((y - (c1 / a - 1.0 / a)).abs() < 1e-15);
    }

    #[test]
    fn arc_length_matches_numerical_integral() {
        // ∫ sqrt(1 + y'^2) dx with y' = sinh(a·x + b) for the vertex form.
        let (a, b) = (1.3, -0.4);
        let (x1, x2) = (-0.5, 1.2);
        let n = 20_000;
        let h = (x2 - x1) / n as f64;
        let mut integral = 0.0;
        for i in 0..n {
            let xm = x1 + (i as f64 + 0.5) * h;
            integral += (a * xm + b).cosh() * h;
        }
        let closed = vertex_arc_length(x1, x2, a, b);
        assert!((closed - integral).abs() < 1e-8);
    }

    #[test]
    fn shifted_and_vertex_agree_under_reparameterization() {
        // shifted(x; a, c1, c2) == vertex(x; k, -k·c2, -1/a) with k = a/c1.
        let (a, c1, c2) = (0.8, 1.6, 2.5);
        let k = a / c1;
        for &x in &[0.0, 1.0, 2.5, 4.0] {
            let lhs = shifted(x, a, c1, c2);
            let rhs = vertex(x, k, -k * c2, -1.0 / a);
            assert!((lhs - rhs).abs() < 1e-12);
        }
    }

    #[test]
    fn uncertain_evaluation_keeps_nominal() {
        let model = MeasuredModel {
            kind: ModelKind::Vertex,
            params: vec![
                Uncertain::new(5.03, 0.05),
                Uncertain::new(-1.841, 0.018),
                Uncertain::new(-0.1362, 0.0014),
            ],
        };
        let y = predict_measured(&model, &Uncertain::exact(0.2));
        assert!((y.nominal() - predict(&model.nominal(), 0.2)).abs() < 1e-15);
        assert!(y.std_dev() > 0.0);
    }
}
