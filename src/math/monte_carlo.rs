//! Monte Carlo cross-check of linear uncertainty propagation.
//!
//! The linear rule is exact only for affine models. Sampling the independent
//! error sources and pushing each draw through the full nonlinear model
//! shows how far the first-order σ is from the sampled one.
//!
//! Each draw owns an RNG seeded from `seed + draw_index`, so the result is
//! deterministic even though draws are evaluated in parallel.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rayon::prelude::*;

use crate::error::AppError;
use crate::math::{SourceId, Uncertain};

/// Sampled standard deviation of each model output.
///
/// `model` receives one joint draw of `inputs` (same order) and must return
/// `outputs` values. Draws producing non-finite outputs are skipped per output.
pub fn sampled_std_devs<F>(
    inputs: &[Uncertain],
    outputs: usize,
    draws: usize,
    seed: u64,
    model: F,
) -> Result<Vec<f64>, AppError>
where
    F: Fn(&[f64]) -> Vec<f64> + Sync,
{
    if draws < 2 {
        return Err(AppError::input("Monte Carlo needs at least 2 draws."));
    }

    let mut sources: BTreeMap<SourceId, f64> = BTreeMap::new();
    for input in inputs {
        for (id, sigma) in input.sources() {
            sources.insert(id, sigma);
        }
    }
    let sources: Vec<(SourceId, f64)> = sources.into_iter().collect();

    let samples: Vec<Vec<f64>> = (0..draws)
        .into_par_iter()
        .map(|i| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
            let deviations: BTreeMap<SourceId, f64> = sources
                .iter()
                .map(|&(id, sigma)| {
                    let z: f64 = rng.sample(StandardNormal);
                    (id, z * sigma)
                })
                .collect();
            let values: Vec<f64> = inputs.iter().map(|u| u.at(&deviations)).collect();
            model(&values)
        })
        .collect();

    if samples.iter().any(|s| s.len() != outputs) {
        return Err(AppError::runtime("Monte Carlo model returned the wrong number of outputs."));
    }

    let mut out = Vec::with_capacity(outputs);
    for j in 0..outputs {
        let column: Vec<f64> = samples
            .iter()
            .map(|s| s[j])
            .filter(|v| v.is_finite())
            .collect();
        out.push(sample_std_dev(&column).unwrap_or(f64::NAN));
    }
    Ok(out)
}

/// Largest `|linear - sampled| / sampled` over outputs with positive sampled σ.
///
/// Returns the gap and the index where it occurs.
pub fn max_relative_gap(linear: &[f64], sampled: &[f64]) -> Option<(f64, usize)> {
    let mut worst: Option<(f64, usize)> = None;
    for (i, (&l, &s)) in linear.iter().zip(sampled.iter()).enumerate() {
        if !(s.is_finite() && s > 0.0 && l.is_finite()) {
            continue;
        }
        let gap = (l - s).abs() / s;
        if worst.is_none_or(|(g, _)| gap > g) {
            worst = Some((gap, i));
        }
    }
    worst
}

fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let ss: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    Some((ss / (n - 1.0)).sqrt())
}
