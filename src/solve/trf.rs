//! Trust-region reflective nonlinear least squares (unbounded variant).
//!
//! Minimizes `F(x) = ½‖f(x)‖²`. Each outer iteration:
//!
//! 1. checks `‖Jᵀf‖∞ < gtol`
//! 2. takes the thin SVD `J = U S Vᵀ`
//! 3. solves the trust-region subproblem `min ‖J p + f‖` s.t. `‖p‖ ≤ Δ`
//!    exactly (Moré's secular-equation iteration on the Levenberg parameter)
//! 4. accepts the step if the cost decreased, rescaling `Δ` from the ratio of
//!    actual to predicted reduction
//!
//! and stops on the `ftol` / `xtol` criteria or when the evaluation budget
//! runs out. Running out of budget is not an error: the best point found so
//! far is returned with `success = false`.

use nalgebra::{DMatrix, DVector};
use tracing::{debug, info, trace, warn};

use crate::domain::SolverOptions;
use crate::error::AppError;
use crate::solve::Problem;

/// Why the solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    MaxEvaluations,
    Gtol,
    Ftol,
    Xtol,
    FtolXtol,
}

impl Termination {
    /// Numeric status code (0 = budget exhausted, 1..=4 = converged).
    pub fn status(self) -> i32 {
        match self {
            Termination::MaxEvaluations => 0,
            Termination::Gtol => 1,
            Termination::Ftol => 2,
            Termination::Xtol => 3,
            Termination::FtolXtol => 4,
        }
    }

    pub fn is_success(self) -> bool {
        self != Termination::MaxEvaluations
    }

    pub fn message(self) -> &'static str {
        match self {
            Termination::MaxEvaluations => "The maximum number of function evaluations is exceeded.",
            Termination::Gtol => "`gtol` termination condition is satisfied.",
            Termination::Ftol => "`ftol` termination condition is satisfied.",
            Termination::Xtol => "`xtol` termination condition is satisfied.",
            Termination::FtolXtol => "Both `ftol` and `xtol` termination conditions are satisfied.",
        }
    }
}

/// Solver output.
#[derive(Debug, Clone)]
pub struct SolveReport {
    pub x: DVector<f64>,
    /// `½‖f(x)‖²` at the returned point.
    pub cost: f64,
    /// Residuals at the returned point.
    pub fun: DVector<f64>,
    pub jac: DMatrix<f64>,
    pub grad: DVector<f64>,
    /// `‖grad‖∞` at the returned point.
    pub optimality: f64,
    pub nfev: usize,
    pub njev: usize,
    pub iterations: usize,
    pub termination: Termination,
    pub success: bool,
    pub message: String,
}

/// Solve `min ½‖f(x)‖²` from `x0`.
pub fn least_squares<P: Problem + ?Sized>(
    problem: &P,
    x0: &[f64],
    opts: &SolverOptions,
) -> Result<SolveReport, AppError> {
    validate(x0, opts)?;

    let mut x = DVector::from_column_slice(x0);
    let mut f = problem.residuals(&x);
    let mut nfev = 1usize;

    let m = f.len();
    if m == 0 {
        return Err(AppError::input("Residual vector is empty."));
    }
    if m != problem.residual_count() {
        return Err(AppError::runtime(format!(
            "Problem declared {} residuals but returned {m}.",
            problem.residual_count()
        )));
    }
    if f.iter().any(|v| !v.is_finite()) {
        return Err(AppError::runtime("Residuals are not finite in the initial point."));
    }

    let n = x.len();
    let mut jac = problem.jacobian(&x, &f);
    let mut njev = 1usize;
    let mut cost = 0.5 * f.norm_squared();
    let mut g = jac.transpose() * &f;

    let mut delta = x.norm();
    if delta == 0.0 {
        delta = 1.0;
    }
    let mut alpha = 0.0;
    let mut termination: Option<Termination> = None;
    let mut iterations = 0usize;
    let mut g_norm;

    debug!(m, n, cost, "starting trust-region solve");

    loop {
        g_norm = inf_norm(&g);
        if g_norm < opts.gtol {
            termination = Some(Termination::Gtol);
        }
        if termination.is_some() || nfev >= opts.max_nfev {
            break;
        }

        let svd = jac.clone().svd(true, true);
        let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
            return Err(AppError::runtime("SVD of the Jacobian failed."));
        };
        let s = svd.singular_values;
        let v = v_t.transpose();
        let uf = u.transpose() * &f;

        let mut actual_reduction = -1.0;
        let mut x_new = x.clone();
        let mut f_new = f.clone();
        let mut cost_new = cost;

        while actual_reduction <= 0.0 && nfev < opts.max_nfev {
            let (step, next_alpha) = solve_trust_region(m, n, &uf, &s, &v, delta, alpha);
            alpha = next_alpha;

            let predicted_reduction = -evaluate_quadratic(&jac, &g, &step);
            x_new = &x + &step;
            f_new = problem.residuals(&x_new);
            nfev += 1;

            let step_norm = step.norm();
            if f_new.iter().any(|v| !v.is_finite()) {
                delta = 0.25 * step_norm;
                continue;
            }

            cost_new = 0.5 * f_new.norm_squared();
            actual_reduction = cost - cost_new;
            let (delta_new, ratio) = update_radius(
                delta,
                actual_reduction,
                predicted_reduction,
                step_norm,
                step_norm > 0.95 * delta,
            );

            termination =
                check_termination(actual_reduction, cost, step_norm, x.norm(), ratio, opts.ftol, opts.xtol);
            if termination.is_some() {
                break;
            }

            if delta_new > 0.0 {
                alpha *= delta / delta_new;
            }
            delta = delta_new;
        }

        if actual_reduction > 0.0 {
            x = x_new;
            f = f_new;
            cost = cost_new;
            jac = problem.jacobian(&x, &f);
            njev += 1;
            g = jac.transpose() * &f;
        }

        iterations += 1;
        trace!(iterations, nfev, cost, delta, "trust-region iteration");
    }

    let termination = termination.unwrap_or(Termination::MaxEvaluations);
    let success = termination.is_success();
    if success {
        info!(nfev, njev, cost, status = termination.status(), "least-squares solve converged");
    } else {
        warn!(nfev, cost, "least-squares solve did not converge: {}", termination.message());
    }

    Ok(SolveReport {
        x,
        cost,
        fun: f,
        jac,
        grad: g,
        optimality: g_norm,
        nfev,
        njev,
        iterations,
        termination,
        success,
        message: termination.message().to_string(),
    })
}

fn validate(x0: &[f64], opts: &SolverOptions) -> Result<(), AppError> {
    if x0.is_empty() {
        return Err(AppError::input("Initial guess is empty."));
    }
    if x0.iter().any(|v| !v.is_finite()) {
        return Err(AppError::input("Initial guess must be finite."));
    }
    for (name, tol) in [("ftol", opts.ftol), ("xtol", opts.xtol), ("gtol", opts.gtol)] {
        if !(tol.is_finite() && tol >= 0.0) {
            return Err(AppError::input(format!("`{name}` must be finite and >= 0, got {tol}.")));
        }
    }
    if opts.ftol < f64::EPSILON && opts.xtol < f64::EPSILON && opts.gtol < f64::EPSILON {
        return Err(AppError::input(
            "At least one of `ftol`, `xtol`, `gtol` must exceed machine epsilon.",
        ));
    }
    if opts.max_nfev == 0 {
        return Err(AppError::input("`max_nfev` must be >= 1."));
    }
    Ok(())
}

fn inf_norm(v: &DVector<f64>) -> f64 {
    v.iter().fold(0.0, |acc, x| acc.max(x.abs()))
}

/// `½‖J s‖² + gᵀs`, the model decrease is the negative of this.
fn evaluate_quadratic(jac: &DMatrix<f64>, g: &DVector<f64>, step: &DVector<f64>) -> f64 {
    let js = jac * step;
    0.5 * js.norm_squared() + g.dot(step)
}

/// `φ(α) = ‖p(α)‖ − Δ` and `φ'(α)` with `p(α) = −V · (s ∘ uf) / (s² + α)`.
fn phi_and_derivative(alpha: f64, suf: &DVector<f64>, s: &DVector<f64>, delta: f64) -> (f64, f64) {
    let denom = s.map(|si| si * si + alpha);
    let p_norm = suf.component_div(&denom).norm();
    let phi = p_norm - delta;
    let phi_prime = -suf
        .iter()
        .zip(denom.iter())
        .map(|(sf, d)| sf * sf / (d * d * d))
        .sum::<f64>()
        / p_norm;
    (phi, phi_prime)
}

/// Exact trust-region step from the SVD of `J`.
///
/// Returns the step and the Levenberg parameter `α` (0 for a Gauss-Newton step),
/// which seeds the next call.
fn solve_trust_region(
    m: usize,
    n: usize,
    uf: &DVector<f64>,
    s: &DVector<f64>,
    v: &DMatrix<f64>,
    delta: f64,
    initial_alpha: f64,
) -> (DVector<f64>, f64) {
    let suf = s.component_mul(uf);

    let s_max = s.max();
    let s_min = s.min();
    let full_rank = m >= n && s_min > f64::EPSILON * m as f64 * s_max;

    if full_rank {
        let p = -(v * uf.component_div(s));
        if p.norm() <= delta {
            return (p, 0.0);
        }
    }

    let mut alpha_upper = suf.norm() / delta;
    let mut alpha_lower = if full_rank {
        let (phi, phi_prime) = phi_and_derivative(0.0, &suf, s, delta);
        -phi / phi_prime
    } else {
        0.0
    };

    let reset = |lower: f64, upper: f64| (0.001 * upper).max((lower * upper).sqrt());

    let mut alpha = if !full_rank && initial_alpha == 0.0 {
        reset(alpha_lower, alpha_upper)
    } else {
        initial_alpha
    };

    for _ in 0..10 {
        if alpha < alpha_lower || alpha > alpha_upper {
            alpha = reset(alpha_lower, alpha_upper);
        }

        let (phi, phi_prime) = phi_and_derivative(alpha, &suf, s, delta);
        if phi < 0.0 {
            alpha_upper = alpha;
        }

        let ratio = phi / phi_prime;
        alpha_lower = alpha_lower.max(alpha - ratio);
        alpha -= (phi + delta) * ratio / delta;

        if phi.abs() < 0.01 * delta {
            break;
        }
    }

    let denom = s.map(|si| si * si + alpha);
    let mut p = -(v * suf.component_div(&denom));
    let norm = p.norm();
    if norm > 0.0 {
        p *= delta / norm;
    }
    (p, alpha)
}

/// New radius and the actual/predicted reduction ratio.
fn update_radius(
    delta: f64,
    actual_reduction: f64,
    predicted_reduction: f64,
    step_norm: f64,
    bound_hit: bool,
) -> (f64, f64) {
    let ratio = if predicted_reduction > 0.0 {
        actual_reduction / predicted_reduction
    } else if predicted_reduction == actual_reduction && actual_reduction == 0.0 {
        1.0
    } else {
        0.0
    };

    let delta = if ratio < 0.25 {
        0.25 * step_norm
    } else if ratio > 0.75 && bound_hit {
        delta * 2.0
    } else {
        delta
    };
    (delta, ratio)
}

fn check_termination(
    d_f: f64,
    f: f64,
    dx_norm: f64,
    x_norm: f64,
    ratio: f64,
    ftol: f64,
    xtol: f64,
) -> Option<Termination> {
    let ftol_satisfied = d_f < ftol * f && ratio > 0.25;
    let xtol_satisfied = dx_norm < xtol * (xtol + x_norm);

    match (ftol_satisfied, xtol_satisfied) {
        (true, true) => Some(Termination::FtolXtol),
        (true, false) => Some(Termination::Ftol),
        (false, true) => Some(Termination::Xtol),
        (false, false) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Rosenbrock;

    impl Problem for Rosenbrock {
        fn residual_count(&self) -> usize {
            2
        }

        fn residuals(&self, x: &DVector<f64>) -> DVector<f64> {
            DVector::from_vec(vec![10.0 * (x[1] - x[0] * x[0]), 1.0 - x[0]])
        }
    }

    struct Line {
        xs: Vec<f64>,
        ys: Vec<f64>,
    }

    impl Problem for Line {
        fn residual_count(&self) -> usize {
            self.xs.len()
        }

        fn residuals(&self, p: &DVector<f64>) -> DVector<f64> {
            DVector::from_iterator(
                self.xs.len(),
                self.xs.iter().zip(&self.ys).map(|(x, y)| p[0] + p[1] * x - y),
            )
        }
    }

    #[test]
    fn solves_rosenbrock() {
        let report = least_squares(&Rosenbrock, &[2.0, 2.0], &SolverOptions::default()).unwrap();
        assert!(report.success, "{}", report.message);
        assert!((report.x[0] - 1.0).abs() < 1e-6);
        assert!((report.x[1] - 1.0).abs() < 1e-6);
        assert!(report.cost < 1e-12);
    }

    #[test]
    fn budget_exhaustion_returns_best_estimate() {
        let opts = SolverOptions {
            max_nfev: 2,
            ..SolverOptions::default()
        };
        let report = least_squares(&Rosenbrock, &[-1.2, 1.0], &opts).unwrap();
        assert!(!report.success);
        assert_eq!(report.termination, Termination::MaxEvaluations);
        assert_eq!(report.termination.status(), 0);
        assert_eq!(report.message, "The maximum number of function evaluations is exceeded.");
        assert!(report.nfev <= 2);
        // Never worse than the starting point.
        let start_cost = 0.5 * Rosenbrock.residuals(&DVector::from_vec(vec![-1.2, 1.0])).norm_squared();
        assert!(report.cost <= start_cost);
    }

    #[test]
    fn fits_overdetermined_line() {
        let xs: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 0.5 - 2.0 * x).collect();
        let report = least_squares(&Line { xs, ys }, &[0.0, 0.0], &SolverOptions::default()).unwrap();
        assert!(report.success);
        assert!((report.x[0] - 0.5).abs() < 1e-6);
        assert!((report.x[1] + 2.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_non_finite_start() {
        struct Blowup;
        impl Problem for Blowup {
            fn residual_count(&self) -> usize {
                1
            }
            fn residuals(&self, x: &DVector<f64>) -> DVector<f64> {
                DVector::from_vec(vec![1.0 / x[0]])
            }
        }
        let err = least_squares(&Blowup, &[0.0], &SolverOptions::default()).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_RUNTIME);
    }

    #[test]
    fn rejects_invalid_tolerances() {
        let opts = SolverOptions {
            ftol: f64::NAN,
            ..SolverOptions::default()
        };
        let err = least_squares(&Rosenbrock, &[0.0, 0.0], &opts).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
    }

    #[test]
    fn radius_update_follows_ratio() {
        // Poor agreement shrinks to a quarter of the step.
        assert_eq!(update_radius(1.0, 0.1, 1.0, 0.8, false), (0.2, 0.1));
        // Good agreement on the boundary doubles the radius.
        assert_eq!(update_radius(1.0, 0.9, 1.0, 1.0, true).0, 2.0);
        // Good agreement inside the region keeps it.
        assert_eq!(update_radius(1.0, 0.9, 1.0, 0.5, false).0, 1.0);
    }

    #[test]
    fn termination_flags_combine() {
        assert_eq!(
            check_termination(1e-12, 1.0, 1e-12, 1.0, 1.0, 1e-8, 1e-8),
            Some(Termination::FtolXtol)
        );
        assert_eq!(check_termination(1e-12, 1.0, 1.0, 1.0, 1.0, 1e-8, 1e-8), Some(Termination::Ftol));
        assert_eq!(check_termination(0.5, 1.0, 1e-12, 1.0, 1.0, 1e-8, 1e-8), Some(Termination::Xtol));
        assert_eq!(check_termination(0.5, 1.0, 1.0, 1.0, 1.0, 1e-8, 1e-8), None);
    }
}
