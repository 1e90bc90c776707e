//! Monte Carlo check of the grid's linear σ.

use tracing::info;

use crate::domain::{GridPoint, MeasuredModel};
use crate::error::AppError;
use crate::math::monte_carlo::{max_relative_gap, sampled_std_devs};
use crate::models::evaluate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossCheck {
    pub draws: usize,
    /// Largest relative gap between linear and sampled σ and the grid `x` where it occurs.
    pub worst: Option<(f64, f64)>,
}

pub fn cross_check_grid(
    model: &MeasuredModel,
    grid: &[GridPoint],
    draws: usize,
    seed: u64,
) -> Result<CrossCheck, AppError> {
    let xs: Vec<f64> = grid.iter().map(|g| g.x).collect();
    let kind = model.kind;
    let sampled = sampled_std_devs(&model.params, xs.len(), draws, seed, |params| {
        xs.iter().map(|&x| evaluate(kind, x, params)).collect()
    })?;

    let linear: Vec<f64> = grid.iter().map(|g| g.std_dev).collect();
    let worst = max_relative_gap(&linear, &sampled).map(|(gap, i)| (gap, xs[i]));
    if let Some((gap, x)) = worst {
        info!(draws, gap, x, "monte carlo cross-check");
    }
    Ok(CrossCheck { draws, worst })
}
