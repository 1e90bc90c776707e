//! Shared pipeline logic used by both CLI and TUI front-ends.
//!
//! Every command follows the same one-way flow:
//! data -> (boundary or sample solve) -> measured model -> evaluation -> report
//!
//! The front-ends then focus on presentation (printing, charts, exports).

use tracing::{info, warn};

use crate::data;
use crate::domain::{
    BoundaryConditions, Dataset, EvalConfig, FitConfig, MeasuredModel, ModelKind, OutputConfig, RegressConfig,
    SampleResidual, SolveConfig, SolverOptions, Unit,
};
use crate::error::AppError;
use crate::fit::{CrossCheck, Evaluation, cross_check_grid, evaluate, largest_residuals};
use crate::math::Uncertain;
use crate::solve::{BoundaryProblem, SampleProblem, SolveReport, covariance, least_squares, vertex_guess};

/// Which command produced a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Eval,
    Fit,
    Solve,
    Regress,
}

impl RunKind {
    pub fn name(self) -> &'static str {
        match self {
            RunKind::Eval => "eval",
            RunKind::Fit => "fit",
            RunKind::Solve => "solve",
            RunKind::Regress => "regress",
        }
    }
}

/// Where the parameter uncertainties come from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamOrigin {
    /// Supplied by the user.
    Given,
    /// Fraction of each nominal value.
    Relative(f64),
    /// Jacobian covariance at the solution (correlated).
    Covariance,
    /// No uncertainty available.
    Exact,
}

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub kind: RunKind,
    pub unit: Unit,
    pub dataset: Option<Dataset>,
    pub conditions: Option<BoundaryConditions>,
    pub guess: Option<[f64; 3]>,
    pub solve: Option<SolveReport>,
    pub model: MeasuredModel,
    pub origin: ParamOrigin,
    pub evaluation: Evaluation,
    pub largest: Vec<SampleResidual>,
    pub cross_check: Option<CrossCheck>,
}

/// Fixed vertex-form parameters evaluated against a dataset.
pub fn run_eval(config: &EvalConfig) -> Result<RunOutput, AppError> {
    let dataset = data::load(&config.data, config.unit)?;
    let model = MeasuredModel {
        kind: ModelKind::Vertex,
        params: [config.a, config.b, config.c]
            .iter()
            .map(|p| Uncertain::new(p.value, p.std_dev))
            .collect(),
    };

    finish(Stage {
        kind: RunKind::Eval,
        unit: dataset.unit,
        range: data_range(&dataset)?,
        dataset: Some(dataset),
        conditions: None,
        guess: None,
        solve: None,
        model,
        origin: ParamOrigin::Given,
        output: &config.output,
    })
}

/// Shifted-form boundary solve, evaluated against the samples.
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, AppError> {
    let dataset = data::load(&config.data, config.unit)?;

    let conditions = if config.endpoints_from_data {
        let (lo, hi) = dataset
            .endpoints()
            .ok_or_else(|| AppError::data("Dataset has no samples to take endpoints from."))?;
        BoundaryConditions {
            x1: lo.x,
            y1: lo.y,
            x2: hi.x,
            y2: hi.y,
            ..config.conditions
        }
    } else {
        config.conditions
    };

    let report = solve_boundary(ModelKind::Shifted, conditions, config.guess, &config.solver)?;
    let model = MeasuredModel::exact(&crate::domain::CurveModel {
        kind: ModelKind::Shifted,
        params: report.x.iter().copied().collect(),
    });

    finish(Stage {
        kind: RunKind::Fit,
        unit: dataset.unit,
        range: data_range(&dataset)?,
        dataset: Some(dataset),
        conditions: Some(conditions),
        guess: Some(config.guess),
        solve: Some(report),
        model,
        origin: ParamOrigin::Exact,
        output: &config.output,
    })
}

/// Vertex-form boundary solve with relative uncertainty attached to each parameter.
pub fn run_solve(config: &SolveConfig) -> Result<RunOutput, AppError> {
    let dataset = config
        .data
        .as_ref()
        .map(|input| data::load(input, config.unit))
        .transpose()?;

    let report = solve_boundary(ModelKind::Vertex, config.conditions, config.guess, &config.solver)?;
    let model = MeasuredModel {
        kind: ModelKind::Vertex,
        params: report
            .x
            .iter()
            .map(|&v| Uncertain::with_relative(v, config.relative_sigma))
            .collect(),
    };

    let range = match &dataset {
        Some(d) => data_range(d)?,
        None => {
            let c = &config.conditions;
            (c.x1.min(c.x2), c.x1.max(c.x2))
        }
    };

    finish(Stage {
        kind: RunKind::Solve,
        unit: dataset.as_ref().map_or(config.unit, |d| d.unit),
        range,
        dataset,
        conditions: Some(config.conditions),
        guess: Some(config.guess),
        solve: Some(report),
        model,
        origin: ParamOrigin::Relative(config.relative_sigma),
        output: &config.output,
    })
}

/// Vertex form fitted to every sample, σ from the Jacobian covariance.
pub fn run_regress(config: &RegressConfig) -> Result<RunOutput, AppError> {
    let dataset = data::load(&config.data, config.unit)?;
    let guess = match config.guess {
        Some(g) => g,
        None => vertex_guess(&dataset.xs(), &dataset.ys())?,
    };

    let problem = SampleProblem::new(ModelKind::Vertex, &dataset.samples);
    let report = least_squares(&problem, &guess, &config.solver)?;
    log_report(&report);

    let values: Vec<f64> = report.x.iter().copied().collect();
    let (params, origin) = match covariance(&report) {
        Some(pcov) => (Uncertain::correlated(&values, &pcov)?, ParamOrigin::Covariance),
        None => {
            warn!("covariance undefined (need more samples than parameters)");
            (values.iter().map(|&v| Uncertain::exact(v)).collect(), ParamOrigin::Exact)
        }
    };
    let model = MeasuredModel {
        kind: ModelKind::Vertex,
        params,
    };

    finish(Stage {
        kind: RunKind::Regress,
        unit: dataset.unit,
        range: data_range(&dataset)?,
        dataset: Some(dataset),
        conditions: None,
        guess: Some(guess),
        solve: Some(report),
        model,
        origin,
        output: &config.output,
    })
}

/// Everything `finish` needs; keeps the per-command functions flat.
struct Stage<'a> {
    kind: RunKind,
    unit: Unit,
    range: (f64, f64),
    dataset: Option<Dataset>,
    conditions: Option<BoundaryConditions>,
    guess: Option<[f64; 3]>,
    solve: Option<SolveReport>,
    model: MeasuredModel,
    origin: ParamOrigin,
    output: &'a OutputConfig,
}

fn finish(stage: Stage<'_>) -> Result<RunOutput, AppError> {
    let samples = stage.dataset.as_ref().map_or(&[][..], |d| &d.samples[..]);
    let evaluation = evaluate(&stage.model, samples, stage.range, stage.output.grid_points);

    if evaluation.grid.iter().any(|g| !g.y.is_finite()) {
        warn!("model produced non-finite values on the grid");
    }

    let largest = largest_residuals(&evaluation.residuals, stage.output.top_n);
    let cross_check = match stage.output.monte_carlo {
        Some(draws) => Some(cross_check_grid(&stage.model, &evaluation.grid, draws, stage.output.seed)?),
        None => None,
    };

    info!(
        command = stage.kind.name(),
        r_squared = evaluation.quality.and_then(|q| q.r_squared),
        "run complete"
    );

    Ok(RunOutput {
        kind: stage.kind,
        unit: stage.unit,
        dataset: stage.dataset,
        conditions: stage.conditions,
        guess: stage.guess,
        solve: stage.solve,
        model: stage.model,
        origin: stage.origin,
        evaluation,
        largest,
        cross_check,
    })
}

fn solve_boundary(
    kind: ModelKind,
    conditions: BoundaryConditions,
    guess: [f64; 3],
    solver: &SolverOptions,
) -> Result<SolveReport, AppError> {
    let problem = BoundaryProblem::new(kind, conditions);
    let report = least_squares(&problem, &guess, solver)?;
    log_report(&report);
    Ok(report)
}

fn log_report(report: &SolveReport) {
    if !report.success {
        warn!("solver did not converge; continuing with best estimate");
    }
}

fn data_range(dataset: &Dataset) -> Result<(f64, f64), AppError> {
    let stats = dataset
        .stats()
        .ok_or_else(|| AppError::data("Dataset is empty."))?;
    Ok((stats.x_min, stats.x_max))
}
