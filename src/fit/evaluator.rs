//! Fit evaluation: residuals, R², and the dense grid used for plots.

use tracing::debug;

use crate::domain::{CurveModel, FitQuality, GridPoint, MeasuredModel, Sample, SampleResidual};
use crate::math::Uncertain;
use crate::models::{predict, predict_measured};

/// Everything derived from a model and a set of samples.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub residuals: Vec<SampleResidual>,
    /// `None` when there are no samples.
    pub quality: Option<FitQuality>,
    pub grid: Vec<GridPoint>,
}

/// `n` evenly spaced values over `[start, end]`, both ends included.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            out[n - 1] = end;
            out
        }
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// `1 − SSR/SST`; `None` for empty input, mismatched lengths or constant observations.
pub fn r_squared(observed: &[f64], predicted: &[f64]) -> Option<f64> {
    fit_quality(observed, predicted)?.r_squared
}

pub fn fit_quality(observed: &[f64], predicted: &[f64]) -> Option<FitQuality> {
    if observed.is_empty() || observed.len() != predicted.len() {
        return None;
    }
    let y_bar = mean(observed)?;
    let ssr: f64 = observed
        .iter()
        .zip(predicted)
        .map(|(y, y_hat)| (y - y_hat).powi(2))
        .sum();
    let sst: f64 = observed.iter().map(|y| (y - y_bar).powi(2)).sum();
    let n = observed.len();

    Some(FitQuality {
        n,
        ssr,
        sst,
        r_squared: (sst > 0.0).then(|| 1.0 - ssr / sst),
        rmse: (ssr / n as f64).sqrt(),
    })
}

/// Fitted value and `y − ŷ` for every sample, in input order.
pub fn compute_residuals(model: &CurveModel, samples: &[Sample]) -> Vec<SampleResidual> {
    samples
        .iter()
        .map(|s| {
            let y_fit = predict(model, s.x);
            SampleResidual {
                sample: *s,
                y_fit,
                residual: s.y - y_fit,
            }
        })
        .collect()
}

/// Model with propagated σ over `linspace(x_min, x_max, n)`.
pub fn evaluate_grid(model: &MeasuredModel, x_min: f64, x_max: f64, n: usize) -> Vec<GridPoint> {
    linspace(x_min, x_max, n)
        .into_iter()
        .map(|x| {
            let y = predict_measured(model, &Uncertain::exact(x));
            GridPoint {
                x,
                y: y.nominal(),
                std_dev: y.std_dev(),
            }
        })
        .collect()
}

/// The `top_n` samples with the largest |residual|, largest first.
pub fn largest_residuals(residuals: &[SampleResidual], top_n: usize) -> Vec<SampleResidual> {
    let mut sorted = residuals.to_vec();
    sorted.sort_by(|a, b| b.residual.abs().total_cmp(&a.residual.abs()));
    sorted.truncate(top_n);
    sorted
}

/// Residuals and R² against `samples`, plus the grid over `range`.
pub fn evaluate(model: &MeasuredModel, samples: &[Sample], range: (f64, f64), grid_points: usize) -> Evaluation {
    let nominal = model.nominal();
    let residuals = compute_residuals(&nominal, samples);
    let observed: Vec<f64> = residuals.iter().map(|r| r.sample.y).collect();
    let predicted: Vec<f64> = residuals.iter().map(|r| r.y_fit).collect();
    let quality = fit_quality(&observed, &predicted);
    let grid = evaluate_grid(model, range.0, range.1, grid_points);

    debug!(
        n = samples.len(),
        grid = grid.len(),
        r_squared = quality.and_then(|q| q.r_squared),
        "evaluated model"
    );

    Evaluation {
        residuals,
        quality,
        grid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelKind;

    #[test]
    fn linspace_includes_both_ends() {
        let xs = linspace(0.109, 9.252, 500);
        assert_eq!(xs.len(), 500);
        assert_eq!(xs[0], 0.109);
        assert_eq!(xs[499], 9.252);
        assert!(xs.windows(2).all(|w| w[1] > w[0]));
        assert_eq!(linspace(1.0, 2.0, 1), vec![1.0]);
        assert!(linspace(1.0, 2.0, 0).is_empty());
    }

    #[test]
    fn perfect_prediction_has_unit_r_squared() {
        let y = [1.0, 2.0, 4.0, 3.0];
        assert_eq!(r_squared(&y, &y), Some(1.0));
    }

    #[test]
    fn mean_prediction_has_zero_r_squared() {
        let y = [1.0, 2.0, 3.0];
        let r2 = r_squared(&y, &[2.0, 2.0, 2.0]).unwrap();
        assert!(r2.abs() < 1e-15);
    }

    #[test]
    fn constant_observations_leave_r_squared_undefined() {
        let q = fit_quality(&[2.0, 2.0], &[2.0, 2.1]).unwrap();
        assert_eq!(q.r_squared, None);
        assert!(q.ssr > 0.0);
        assert!(r_squared(&[], &[]).is_none());
        assert!(r_squared(&[1.0, 2.0], &[1.0]).is_none());
    }

    #[test]
    fn residuals_are_observed_minus_fitted() {
        let model = CurveModel {
            kind: ModelKind::Vertex,
            params: vec![1.0, 0.0, 0.0],
        };
        let samples = [Sample::new(0.0, 1.5), Sample::new(0.0, 0.25)];
        let res = compute_residuals(&model, &samples);
        assert!((res[0].residual - 0.5).abs() < 1e-15);
        assert!((res[1].residual + 0.75).abs() < 1e-15);

        let top = largest_residuals(&res, 1);
        assert_eq!(top.len(), 1);
        assert!((top[0].residual + 0.75).abs() < 1e-15);
    }

    #[test]
    fn grid_carries_propagated_sigma() {
        let model = MeasuredModel {
            kind: ModelKind::Vertex,
            params: vec![
                Uncertain::new(5.03, 0.05),
                Uncertain::new(-1.841, 0.018),
                Uncertain::new(-0.1362, 0.0014),
            ],
        };
        let grid = evaluate_grid(&model, 0.0, 0.6, 7);
        assert_eq!(grid.len(), 7);
        assert!(grid.iter().all(|g| g.std_dev > 0.0 && g.y.is_finite()));
    }
}
