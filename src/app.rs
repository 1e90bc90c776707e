//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - installs logging
//! - converts flags into validated configs
//! - runs the pipeline and presents the result (report, plots, exports, TUI)

use std::path::PathBuf;

use clap::Parser;
use tracing::{debug, info};

use crate::app::pipeline::RunOutput;
use crate::cli::{Cli, Command, EvalArgs, FitArgs, OutputArgs, PlotArgs, RegressArgs, SolveArgs, SolverArgs};
use crate::domain::{
    BoundaryConditions, DataInput, EvalConfig, FitConfig, OutputConfig, ParamSpec, RegressConfig, SolveConfig,
    SolverOptions,
};
use crate::error::AppError;
use crate::plot::ChartSpec;

pub mod pipeline;

/// Entry point for the `catenary` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env is normal; only CATENARY_LOG is read from it.
    let _ = dotenvy::dotenv();

    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);
    crate::logging::init(&cli.log_level)?;
    debug!(command = ?cli.command, "parsed arguments");

    match cli.command {
        Command::Eval(args) => handle_eval(&args),
        Command::Fit(args) => handle_fit(&args),
        Command::Solve(args) => handle_solve(&args),
        Command::Regress(args) => handle_regress(&args),
        Command::Plot(args) => handle_plot(&args),
    }
}

fn handle_eval(args: &EvalArgs) -> Result<(), AppError> {
    let config = eval_config_from_args(args)?;
    let run = pipeline::run_eval(&config)?;
    present(&run, &config.output)
}

fn handle_fit(args: &FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(args)?;
    let run = pipeline::run_fit(&config)?;
    present(&run, &config.output)
}

fn handle_solve(args: &SolveArgs) -> Result<(), AppError> {
    let config = solve_config_from_args(args)?;
    let run = pipeline::run_solve(&config)?;
    present(&run, &config.output)
}

fn handle_regress(args: &RegressArgs) -> Result<(), AppError> {
    let config = regress_config_from_args(args)?;
    let run = pipeline::run_regress(&config)?;
    present(&run, &config.output)
}

/// Print the report, then write whatever outputs were requested.
fn present(run: &RunOutput, output: &OutputConfig) -> Result<(), AppError> {
    println!("{}", crate::report::format_run_summary(run));

    if !run.largest.is_empty() {
        println!(
            "Largest residuals:\n{}",
            crate::report::format_residual_table(&run.largest, run.unit)
        );
    }

    if output.plot && !run.evaluation.grid.is_empty() {
        let samples = run.dataset.as_ref().map_or(&[][..], |d| &d.samples[..]);
        let plot = crate::plot::render_ascii_plot(
            samples,
            &run.evaluation.grid,
            run.unit,
            output.plot_width,
            output.plot_height,
        );
        println!("{plot}");
    }

    if let Some(path) = &output.svg {
        let spec = ChartSpec::for_run(run, output.band);
        crate::plot::write_svg_chart(path, &spec, svg_size(output))?;
    }
    if let Some(path) = &output.export_results {
        crate::io::write_results_csv(path, &run.evaluation.residuals, run.unit)?;
        info!(path = %path.display(), rows = run.evaluation.residuals.len(), "wrote results CSV");
    }
    if let Some(path) = &output.export_curve {
        let curve = crate::io::build_curve_file(
            run.kind.name(),
            run.unit,
            &run.model,
            run.evaluation.quality,
            &run.evaluation.grid,
        );
        crate::io::write_curve_json(path, &curve)?;
    }

    if output.tui {
        crate::tui::run(crate::tui::TuiView::from_run(run))?;
    }

    Ok(())
}

fn handle_plot(args: &PlotArgs) -> Result<(), AppError> {
    let curve = crate::io::read_curve_json(&args.curve)?;

    if let Some(path) = &args.svg {
        let spec = ChartSpec::for_curve(&curve, args.band);
        crate::plot::write_svg_chart(path, &spec, crate::plot::SVG_SIZE)?;
    } else if !args.tui {
        let plot = crate::plot::render_ascii_plot_from_curve_file(&curve, args.width, args.height);
        println!("{plot}");
    }

    if args.tui {
        crate::tui::run(crate::tui::TuiView::from_curve(&curve))?;
    }
    Ok(())
}

/// SVG pixels scaled from the character plot size.
fn svg_size(output: &OutputConfig) -> (u32, u32) {
    let w = (output.plot_width as u32).saturating_mul(8).clamp(400, 2400);
    let h = (output.plot_height as u32).saturating_mul(24).clamp(300, 1800);
    (w, h)
}

pub fn eval_config_from_args(args: &EvalArgs) -> Result<EvalConfig, AppError> {
    Ok(EvalConfig {
        data: DataInput::File(args.data.clone()),
        unit: args.unit,
        a: param_spec("a", args.a, args.a_sigma)?,
        b: param_spec("b", args.b, args.b_sigma)?,
        c: param_spec("c", args.c, args.c_sigma)?,
        output: output_config_from_args(&args.output)?,
    })
}

pub fn fit_config_from_args(args: &FitArgs) -> Result<FitConfig, AppError> {
    Ok(FitConfig {
        data: data_input(args.data.as_ref()),
        unit: args.unit,
        conditions: boundary(args.x1, args.y1, args.x2, args.y2, args.length)?,
        endpoints_from_data: args.endpoints_from_data,
        guess: guess_triple(&args.guess)?,
        solver: solver_options_from_args(&args.solver)?,
        output: output_config_from_args(&args.output)?,
    })
}

pub fn solve_config_from_args(args: &SolveArgs) -> Result<SolveConfig, AppError> {
    if !(args.relative_sigma.is_finite() && args.relative_sigma >= 0.0) {
        return Err(AppError::input(format!(
            "--relative-sigma must be a non-negative number (got {}).",
            args.relative_sigma
        )));
    }
    let output = output_config_from_args(&args.output)?;
    if args.data.is_none() && output.export_results.is_some() {
        return Err(AppError::input("--export needs --data: there are no samples to export."));
    }

    Ok(SolveConfig {
        data: args.data.as_ref().map(|p| DataInput::File(p.clone())),
        unit: args.unit,
        conditions: boundary(args.x1, args.y1, args.x2, args.y2, args.length)?,
        guess: guess_triple(&args.guess)?,
        relative_sigma: args.relative_sigma,
        solver: solver_options_from_args(&args.solver)?,
        output,
    })
}

pub fn regress_config_from_args(args: &RegressArgs) -> Result<RegressConfig, AppError> {
    Ok(RegressConfig {
        data: data_input(args.data.as_ref()),
        unit: args.unit,
        guess: args.guess.as_deref().map(guess_triple).transpose()?,
        solver: solver_options_from_args(&args.solver)?,
        output: output_config_from_args(&args.output)?,
    })
}

fn data_input(path: Option<&PathBuf>) -> DataInput {
    match path {
        Some(p) => DataInput::File(p.clone()),
        None => DataInput::Embedded,
    }
}

fn param_spec(name: &str, value: f64, std_dev: f64) -> Result<ParamSpec, AppError> {
    if !value.is_finite() {
        return Err(AppError::input(format!("--{name} must be finite (got {value}).")));
    }
    if !(std_dev.is_finite() && std_dev >= 0.0) {
        return Err(AppError::input(format!(
            "--{name}-sigma must be a non-negative number (got {std_dev})."
        )));
    }
    Ok(ParamSpec { value, std_dev })
}

fn boundary(x1: f64, y1: f64, x2: f64, y2: f64, length: f64) -> Result<BoundaryConditions, AppError> {
    if ![x1, y1, x2, y2, length].iter().all(|v| v.is_finite()) {
        return Err(AppError::input("Endpoints and --length must be finite numbers."));
    }
    if length <= 0.0 {
        return Err(AppError::input(format!("--length must be positive (got {length}).")));
    }
    Ok(BoundaryConditions {
        x1,
        y1,
        x2,
        y2,
        arc_length: length,
    })
}

fn guess_triple(values: &[f64]) -> Result<[f64; 3], AppError> {
    match values {
        [p0, p1, p2] if values.iter().all(|v| v.is_finite()) => Ok([*p0, *p1, *p2]),
        [_, _, _] => Err(AppError::input("--guess values must be finite.")),
        _ => Err(AppError::input(format!(
            "--guess needs exactly three comma-separated values (got {}).",
            values.len()
        ))),
    }
}

fn solver_options_from_args(args: &SolverArgs) -> Result<SolverOptions, AppError> {
    for (name, tol) in [("ftol", args.ftol), ("xtol", args.xtol), ("gtol", args.gtol)] {
        if !(tol.is_finite() && tol > 0.0) {
            return Err(AppError::input(format!("--{name} must be positive (got {tol}).")));
        }
    }
    if args.max_nfev == 0 {
        return Err(AppError::input("--max-nfev must be at least 1."));
    }
    Ok(SolverOptions {
        ftol: args.ftol,
        xtol: args.xtol,
        gtol: args.gtol,
        max_nfev: args.max_nfev,
    })
}

fn output_config_from_args(args: &OutputArgs) -> Result<OutputConfig, AppError> {
    if args.grid_points < 2 {
        return Err(AppError::input(format!(
            "--grid-points must be at least 2 (got {}).",
            args.grid_points
        )));
    }
    if args.monte_carlo == Some(0) {
        return Err(AppError::input("--monte-carlo needs at least one draw."));
    }
    Ok(OutputConfig {
        plot: !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        grid_points: args.grid_points,
        top_n: args.top,
        svg: args.svg.clone(),
        band: args.band,
        tui: args.tui,
        export_results: args.export.clone(),
        export_curve: args.export_curve.clone(),
        monte_carlo: args.monte_carlo,
        seed: args.seed,
    })
}

/// Rewrite argv so bare `catenary` runs `catenary fit`.
///
/// Rules:
/// - `catenary`                      -> `catenary fit`
/// - `catenary --no-plot ...`        -> `catenary fit --no-plot ...`
/// - `catenary --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("fit".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "eval" | "fit" | "solve" | "regress" | "plot");
    if is_subcommand {
        return argv;
    }

    // A leading global flag still needs a subcommand after it.
    if arg1 == "--log-level" || arg1.starts_with("--log-level=") {
        let skip = if arg1 == "--log-level" { 3 } else { 2 };
        if argv.len() <= skip
            || !matches!(argv[skip].as_str(), "eval" | "fit" | "solve" | "regress" | "plot" | "help")
        {
            argv.insert(skip.min(argv.len()), "fit".to_string());
        }
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "fit".to_string());
        return argv;
    }

    argv
}
