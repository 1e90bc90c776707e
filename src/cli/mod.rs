//! Command-line parsing for the catenary fitter.
//!
//! The goal of this module is to keep **argument parsing** separate from
//! the modeling/math code. Defaults reproduce the reference experiment.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::Unit;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "catenary", version, about = "Catenary curve fitting with uncertainty propagation")]
pub struct Cli {
    /// Log level for stderr diagnostics (error, warn, info, debug, trace).
    #[arg(long, global = true, env = "CATENARY_LOG", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Evaluate fixed vertex-form parameters (with σ) against a dataset.
    Eval(EvalArgs),
    /// Solve the shifted form from two endpoints and an arc length.
    Fit(FitArgs),
    /// Solve the vertex form from two endpoints and an arc length.
    Solve(SolveArgs),
    /// Fit the vertex form to every sample of a dataset.
    Regress(RegressArgs),
    /// Plot a previously exported curve JSON.
    Plot(PlotArgs),
}

#[derive(Debug, Args, Clone)]
pub struct EvalArgs {
    /// Spreadsheet (.xlsx) or CSV with `x` and `y` columns.
    #[arg(long, value_name = "FILE", default_value = "catenaria_experimental.xlsx")]
    pub data: PathBuf,

    #[arg(long, value_enum, default_value_t = Unit::M)]
    pub unit: Unit,

    #[arg(long, allow_hyphen_values = true, default_value_t = 5.03)]
    pub a: f64,
    #[arg(long, allow_hyphen_values = true, default_value_t = 0.05)]
    pub a_sigma: f64,

    #[arg(long, allow_hyphen_values = true, default_value_t = -1.841)]
    pub b: f64,
    #[arg(long, allow_hyphen_values = true, default_value_t = 0.018)]
    pub b_sigma: f64,

    #[arg(long, allow_hyphen_values = true, default_value_t = -0.1362)]
    pub c: f64,
    #[arg(long, allow_hyphen_values = true, default_value_t = 0.0014)]
    pub c_sigma: f64,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Dataset to evaluate against (embedded 101-point dataset when omitted).
    #[arg(long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Unit::Cm)]
    pub unit: Unit,

    #[arg(long, allow_hyphen_values = true, default_value_t = 0.109)]
    pub x1: f64,
    #[arg(long, allow_hyphen_values = true, default_value_t = -0.600)]
    pub y1: f64,
    #[arg(long, allow_hyphen_values = true, default_value_t = 9.252)]
    pub x2: f64,
    #[arg(long, allow_hyphen_values = true, default_value_t = -2.817)]
    pub y2: f64,
    /// Arc length between the endpoints.
    #[arg(long, default_value_t = 9.45)]
    pub length: f64,

    /// Use the extreme-x samples as endpoints instead of --x1/--y1/--x2/--y2.
    #[arg(long)]
    pub endpoints_from_data: bool,

    /// Initial guess `a,c1,c2`.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, default_values_t = [0.01, 0.01, 0.01])]
    pub guess: Vec<f64>,

    #[command(flatten)]
    pub solver: SolverArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct SolveArgs {
    /// Optional dataset to evaluate the solved curve against.
    #[arg(long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Unit::M)]
    pub unit: Unit,

    #[arg(long, allow_hyphen_values = true, default_value_t = 0.00021)]
    pub x1: f64,
    #[arg(long, allow_hyphen_values = true, default_value_t = 0.506)]
    pub y1: f64,
    #[arg(long, allow_hyphen_values = true, default_value_t = 0.603)]
    pub x2: f64,
    #[arg(long, allow_hyphen_values = true, default_value_t = 0.221)]
    pub y2: f64,
    /// Arc length between the endpoints.
    #[arg(long, default_value_t = 0.9073)]
    pub length: f64,

    /// Initial guess `a,b,c`.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, default_values_t = [0.1, 0.01, 0.01])]
    pub guess: Vec<f64>,

    /// Relative σ attached to each solved parameter.
    #[arg(long, allow_hyphen_values = true, default_value_t = 0.01)]
    pub relative_sigma: f64,

    #[command(flatten)]
    pub solver: SolverArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct RegressArgs {
    /// Dataset to fit (embedded 101-point dataset when omitted).
    #[arg(long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Unit::Cm)]
    pub unit: Unit,

    /// Initial guess `a,b,c` (quadratic pre-fit when omitted).
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub guess: Option<Vec<f64>>,

    #[command(flatten)]
    pub solver: SolverArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct SolverArgs {
    #[arg(long, default_value_t = 1e-8)]
    pub ftol: f64,
    #[arg(long, default_value_t = 1e-8)]
    pub xtol: f64,
    #[arg(long, default_value_t = 1e-8)]
    pub gtol: f64,
    /// Function evaluation budget.
    #[arg(long, default_value_t = 10_000)]
    pub max_nfev: usize,
}

/// Presentation and export flags shared by every solving command.
#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Evaluation grid size for the fitted curve.
    #[arg(long, default_value_t = 500)]
    pub grid_points: usize,

    /// Show the N samples with the largest absolute residuals.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Write an SVG chart.
    #[arg(long, value_name = "PATH")]
    pub svg: Option<PathBuf>,

    /// Draw the ±σ band around the curve.
    #[arg(long)]
    pub band: bool,

    /// Open the interactive terminal chart after reporting.
    #[arg(long)]
    pub tui: bool,

    /// Export per-sample results to CSV.
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Export curve (model + params + grid) to JSON.
    #[arg(long = "export-curve", value_name = "PATH")]
    pub export_curve: Option<PathBuf>,

    /// Cross-check linear σ against N Monte Carlo draws.
    #[arg(long, value_name = "N")]
    pub monte_carlo: Option<usize>,

    /// Random seed for the Monte Carlo cross-check.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Options for plotting a saved curve.
#[derive(Debug, Args)]
pub struct PlotArgs {
    /// Curve JSON file produced by `--export-curve`.
    #[arg(long, value_name = "JSON")]
    pub curve: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Write an SVG chart instead of printing.
    #[arg(long, value_name = "PATH")]
    pub svg: Option<PathBuf>,

    /// Draw the ±σ band (SVG and TUI).
    #[arg(long)]
    pub band: bool,

    /// Open the interactive terminal chart.
    #[arg(long)]
    pub tui: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_defaults_match_reference_experiment() {
        let cli = Cli::try_parse_from(["catenary", "fit"]).unwrap();
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.y2, -2.817);
        assert_eq!(args.length, 9.45);
        assert_eq!(args.guess, vec![0.01, 0.01, 0.01]);
        assert_eq!(args.unit, Unit::Cm);
    }

    #[test]
    fn negative_coordinates_and_guess_lists_parse() {
        let cli = Cli::try_parse_from([
            "catenary", "solve", "--y1", "-0.5", "--guess", "-1,0.2,3", "--max-nfev", "50",
        ])
        .unwrap();
        let Command::Solve(args) = cli.command else {
            panic!("expected solve");
        };
        assert_eq!(args.y1, -0.5);
        assert_eq!(args.x2, 0.603);
        assert_eq!(args.guess, vec![-1.0, 0.2, 3.0]);
        assert_eq!(args.solver.max_nfev, 50);
    }

    #[test]
    fn negative_sigmas_reach_validation_as_values() {
        let cli = Cli::try_parse_from(["catenary", "eval", "--b-sigma", "-0.1", "--c-sigma", "-2"]).unwrap();
        let Command::Eval(args) = cli.command else {
            panic!("expected eval");
        };
        assert_eq!(args.b_sigma, -0.1);
        assert_eq!(args.c_sigma, -2.0);

        let cli = Cli::try_parse_from(["catenary", "solve", "--relative-sigma", "-0.5"]).unwrap();
        let Command::Solve(args) = cli.command else {
            panic!("expected solve");
        };
        assert_eq!(args.relative_sigma, -0.5);
    }

    #[test]
    fn plot_requires_curve() {
        assert!(Cli::try_parse_from(["catenary", "plot"]).is_err());
    }
}
