//! Run configuration as understood by the pipeline.
//!
//! These are derived from CLI flags (plus defaults) in `app`, after
//! validation, so the pipeline never sees half-checked input.

use std::path::PathBuf;

use crate::domain::Unit;

/// Convergence controls for the nonlinear least-squares solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOptions {
    /// Relative reduction of the cost below which the solve stops.
    pub ftol: f64,
    /// Relative step size below which the solve stops.
    pub xtol: f64,
    /// Gradient infinity norm below which the solve stops.
    pub gtol: f64,
    /// Function evaluation budget (Jacobian evaluations are not counted).
    pub max_nfev: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            ftol: 1e-8,
            xtol: 1e-8,
            gtol: 1e-8,
            max_nfev: 10_000,
        }
    }
}

/// Two endpoints the curve passes through plus the arc length between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryConditions {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub arc_length: f64,
}

/// A given parameter and its standard deviation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub value: f64,
    pub std_dev: f64,
}

/// Where samples come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataInput {
    Embedded,
    File(PathBuf),
}

/// Presentation and export settings shared by every command.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub grid_points: usize,
    pub top_n: usize,
    pub svg: Option<PathBuf>,
    pub band: bool,
    pub tui: bool,
    pub export_results: Option<PathBuf>,
    pub export_curve: Option<PathBuf>,
    pub monte_carlo: Option<usize>,
    pub seed: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            plot: false,
            plot_width: 100,
            plot_height: 25,
            grid_points: 500,
            top_n: 10,
            svg: None,
            band: false,
            tui: false,
            export_results: None,
            export_curve: None,
            monte_carlo: None,
            seed: 42,
        }
    }
}

/// `eval`: fixed vertex-form parameters against a dataset.
#[derive(Debug, Clone)]
pub struct EvalConfig {
    pub data: DataInput,
    pub unit: Unit,
    pub a: ParamSpec,
    pub b: ParamSpec,
    pub c: ParamSpec,
    pub output: OutputConfig,
}

/// `fit`: shifted-form boundary solve, then evaluation against the samples.
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub data: DataInput,
    pub unit: Unit,
    pub conditions: BoundaryConditions,
    /// Replace the configured endpoints with the extreme-x samples.
    pub endpoints_from_data: bool,
    pub guess: [f64; 3],
    pub solver: SolverOptions,
    pub output: OutputConfig,
}

/// `solve`: vertex-form boundary solve with relative uncertainty attached.
#[derive(Debug, Clone)]
pub struct SolveConfig {
    pub data: Option<DataInput>,
    pub unit: Unit,
    pub conditions: BoundaryConditions,
    pub guess: [f64; 3],
    pub relative_sigma: f64,
    pub solver: SolverOptions,
    pub output: OutputConfig,
}

/// `regress`: vertex-form fit to every sample.
#[derive(Debug, Clone)]
pub struct RegressConfig {
    pub data: DataInput,
    pub unit: Unit,
    pub guess: Option<[f64; 3]>,
    pub solver: SolverOptions,
    pub output: OutputConfig,
}
