//! Chart rendering.
//!
//! - `ascii`: fixed-size character grid for stdout
//! - `svg`: Plotters SVG export
//!
//! Both, and the TUI chart, draw from the same [`ChartSpec`].

pub mod ascii;
pub mod svg;

pub use ascii::*;
pub use svg::*;

use crate::app::pipeline::RunOutput;
use crate::domain::{CurveFile, GridPoint, Sample, Unit};
use crate::report::fmt_r_squared;

/// Series and styling switches for one overlay chart.
#[derive(Debug, Clone)]
pub struct ChartSpec<'a> {
    pub title: String,
    pub unit: Unit,
    pub samples: &'a [Sample],
    pub grid: &'a [GridPoint],
    pub error_bars: bool,
    pub band: bool,
}

impl<'a> ChartSpec<'a> {
    pub fn for_run(run: &'a RunOutput, band: bool) -> Self {
        let samples = run.dataset.as_ref().map_or(&[][..], |d| &d.samples[..]);
        Self {
            title: chart_title(run.evaluation.quality.and_then(|q| q.r_squared)),
            unit: run.unit,
            samples,
            grid: &run.evaluation.grid,
            error_bars: true,
            band,
        }
    }

    pub fn for_curve(curve: &'a CurveFile, band: bool) -> Self {
        Self {
            title: chart_title(curve.quality.and_then(|q| q.r_squared)),
            unit: curve.unit,
            samples: &[],
            grid: &curve.grid,
            error_bars: false,
            band,
        }
    }

    /// Whether any grid point carries a positive σ.
    pub fn has_band(&self) -> bool {
        self.grid.iter().any(|g| g.std_dev > 0.0)
    }

    /// Padded `[x_min, x_max]`, `[y_min, y_max]` covering every drawn element.
    pub fn bounds(&self) -> ([f64; 2], [f64; 2]) {
        let mut xs: Vec<f64> = Vec::new();
        let mut ys: Vec<f64> = Vec::new();

        for s in self.samples {
            let (sx, sy) = if self.error_bars {
                (s.x_sigma.unwrap_or(0.0), s.y_sigma.unwrap_or(0.0))
            } else {
                (0.0, 0.0)
            };
            xs.extend([s.x - sx, s.x + sx]);
            ys.extend([s.y - sy, s.y + sy]);
        }
        for g in self.grid {
            let sd = if self.band { g.std_dev } else { 0.0 };
            xs.push(g.x);
            ys.extend([g.y - sd, g.y + sd]);
        }

        (padded(&xs, [0.0, 1.0]), padded(&ys, [0.0, 1.0]))
    }
}

/// Chart title with R² to 4 decimals.
pub fn chart_title(r_squared: Option<f64>) -> String {
    format!("Catenary fit to experimental data (R^2 = {})", fmt_r_squared(r_squared))
}

fn padded(values: &[f64], fallback: [f64; 2]) -> [f64; 2] {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for &v in values.iter().filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !(lo.is_finite() && hi.is_finite()) || hi <= lo {
        return fallback;
    }
    let pad = ((hi - lo) * 0.05).max(1e-12);
    [lo - pad, hi + pad]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_cover_error_bars_and_band() {
        let samples = [Sample::with_sigma(1.0, 2.0, 0.5, 1.0)];
        let grid = [
            GridPoint { x: 0.0, y: 0.0, std_dev: 2.0 },
            GridPoint { x: 4.0, y: 3.0, std_dev: 2.0 },
        ];
        let mut spec = ChartSpec {
            title: chart_title(Some(0.5)),
            unit: Unit::Cm,
            samples: &samples,
            grid: &grid,
            error_bars: true,
            band: false,
        };
        let ([x0, x1], [y0, y1]) = spec.bounds();
        assert!(x0 < 0.0 && x1 > 4.0);
        assert!(y0 < 0.0 && y1 > 3.0);

        spec.band = true;
        let (_, [y0, y1]) = spec.bounds();
        assert!(y0 < -2.0 && y1 > 5.0);
        assert_eq!(spec.title, "Catenary fit to experimental data (R^2 = 0.5000)");
    }
}
