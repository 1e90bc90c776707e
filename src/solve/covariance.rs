//! Parameter covariance from the Jacobian at the solution.

use nalgebra::DMatrix;

use crate::solve::SolveReport;

/// `(JᵀJ)⁺ · 2·cost / (m − n)`, or `None` when there are no degrees of freedom.
///
/// The pseudo-inverse drops singular values below `ε · max(m, n) · s_max`.
pub fn covariance(report: &SolveReport) -> Option<DMatrix<f64>> {
    let (m, n) = report.jac.shape();
    if m <= n {
        return None;
    }

    let svd = report.jac.clone().svd(false, true);
    let v_t = svd.v_t?;
    let s = svd.singular_values;
    let threshold = f64::EPSILON * m.max(n) as f64 * s.max();

    let mut pcov = DMatrix::<f64>::zeros(n, n);
    for (k, &sk) in s.iter().enumerate() {
        if sk <= threshold {
            continue;
        }
        let w = 1.0 / (sk * sk);
        for i in 0..n {
            for j in 0..n {
                pcov[(i, j)] += v_t[(k, i)] * v_t[(k, j)] * w;
            }
        }
    }

    let scale = 2.0 * report.cost / (m - n) as f64;
    if !scale.is_finite() {
        return None;
    }
    Some(pcov * scale)
}
