//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/solver code stays clean and testable
//! - output changes are localized (snapshot tests below)

use crate::app::pipeline::{ParamOrigin, RunOutput};
use crate::domain::{DataSource, FitQuality, MeasuredModel, SampleResidual, Unit};
use crate::fit::CrossCheck;
use crate::solve::SolveReport;

/// Format the full run summary (dataset, solver, parameters, fit quality).
pub fn format_run_summary(run: &RunOutput) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "=== catenary {} - {} ===\n",
        run.kind.name(),
        run.model.kind.display_name()
    ));
    out.push_str(&format!("Model: {}\n", run.model.kind.formula()));

    if let Some(dataset) = &run.dataset {
        let source = match &dataset.source {
            DataSource::Embedded(name) => format!("embedded ({name})"),
            DataSource::File(path) => path.display().to_string(),
        };
        out.push_str(&format!("Data: {source}\n"));
        if let Some(stats) = dataset.stats() {
            out.push_str(&format!(
                "Points: n={} | x=[{:.4}, {:.4}] | y=[{:.4}, {:.4}] {}\n",
                stats.n_points,
                stats.x_min,
                stats.x_max,
                stats.y_min,
                stats.y_max,
                run.unit.label()
            ));
        }
        if !dataset.row_errors.is_empty() {
            out.push_str(&format!("Skipped rows: {}\n", dataset.row_errors.len()));
            for e in dataset.row_errors.iter().take(5) {
                out.push_str(&format!("  line {}: {}\n", e.line, e.message));
            }
        }
    }

    if let Some(c) = &run.conditions {
        out.push_str(&format!(
            "Boundary: ({}, {}) -> ({}, {}) | L={} {}\n",
            c.x1,
            c.y1,
            c.x2,
            c.y2,
            c.arc_length,
            run.unit.label()
        ));
    }

    if let Some(report) = &run.solve {
        out.push('\n');
        out.push_str(&format_solver_report(report, run.guess.as_ref().map(|g| &g[..])));
    }

    out.push('\n');
    out.push_str(&format_parameters(&run.model, run.origin));

    out.push('\n');
    out.push_str(&format_quality(run.evaluation.quality.as_ref(), run.unit));

    if let Some(check) = &run.cross_check {
        out.push_str(&format_cross_check(check));
    }

    out
}

/// Solver status block.
pub fn format_solver_report(report: &SolveReport, guess: Option<&[f64]>) -> String {
    let mut out = String::new();
    out.push_str("Solver (trust-region reflective):\n");
    if let Some(g) = guess {
        out.push_str(&format!("- initial guess: {}\n", fmt_vec(g)));
    }
    out.push_str(&format!("- success: {}\n", report.success));
    out.push_str(&format!("- status : {}\n", report.termination.status()));
    out.push_str(&format!("- message: {}\n", report.message));
    out.push_str(&format!("- cost   : {:.6e}\n", report.cost));
    out.push_str(&format!(
        "- nfev={} njev={} optimality={:.3e}\n",
        report.nfev, report.njev, report.optimality
    ));
    out
}

pub fn format_parameters(model: &MeasuredModel, origin: ParamOrigin) -> String {
    let note = match origin {
        ParamOrigin::Given => "given".to_string(),
        ParamOrigin::Relative(r) => format!("{}% relative", r * 100.0),
        ParamOrigin::Covariance => "from covariance".to_string(),
        ParamOrigin::Exact => "no uncertainty".to_string(),
    };

    let mut out = format!("Parameters ({note}):\n");
    for (name, p) in model.kind.param_names().iter().zip(&model.params) {
        out.push_str(&format!("- {name:<2} = {p}\n"));
    }
    out
}

pub fn format_quality(quality: Option<&FitQuality>, unit: Unit) -> String {
    let Some(q) = quality else {
        return "Fit quality: no samples\n".to_string();
    };
    let mut out = String::new();
    out.push_str(&format!("R^2 = {}\n", fmt_r_squared(q.r_squared)));
    out.push_str(&format!(
        "RMSE={:.4} {} | SSR={:.6} | SST={:.6} | n={}\n",
        q.rmse,
        unit.label(),
        q.ssr,
        q.sst,
        q.n
    ));
    out
}

/// R² to 4 decimals, or a note when undefined.
pub fn fmt_r_squared(r_squared: Option<f64>) -> String {
    match r_squared {
        Some(r) => format!("{r:.4}"),
        None => "undefined (constant y)".to_string(),
    }
}

fn format_cross_check(check: &CrossCheck) -> String {
    match check.worst {
        Some((gap, x)) => format!(
            "Monte Carlo ({} draws): max |σ_lin - σ_mc|/σ_mc = {:.2}% at x={:.4}\n",
            check.draws,
            gap * 100.0,
            x
        ),
        None => format!("Monte Carlo ({} draws): no uncertainty to compare\n", check.draws),
    }
}

/// Format the largest-residual table.
pub fn format_residual_table(rows: &[SampleResidual], unit: Unit) -> String {
    let mut out = String::new();
    if rows.is_empty() {
        return out;
    }

    out.push_str(&format!("Largest residuals ({}):\n", unit.label()));
    out.push_str(
        format!("{:>10} {:>10} {:>10} {:>10}\n", "x", "y_obs", "y_fit", "residual").trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:->10} {:->10} {:->10} {:->10}\n", "", "", "", "").trim_end());
    out.push('\n');

    for r in rows {
        out.push_str(
            format!(
                "{:>10.4} {:>10.4} {:>10.4} {:>10.4}\n",
                r.sample.x, r.sample.y, r.y_fit, r.residual
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x}")).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ModelKind, Sample};
    use crate::math::Uncertain;

    #[test]
    fn parameters_use_significant_digit_form() {
        let model = MeasuredModel {
            kind: ModelKind::Vertex,
            params: vec![
                Uncertain::new(5.03, 0.05),
                Uncertain::new(-1.841, 0.018),
                Uncertain::new(-0.1362, 0.0014),
            ],
        };
        let text = format_parameters(&model, ParamOrigin::Given);
        assert_eq!(
            text,
            "Parameters (given):\n- a  = 5.03+/-0.05\n- b  = -1.841+/-0.018\n- c  = -0.1362+/-0.0014\n"
        );
    }

    #[test]
    fn r_squared_has_four_decimals() {
        assert_eq!(fmt_r_squared(Some(0.987654)), "0.9877");
        assert_eq!(fmt_r_squared(None), "undefined (constant y)");
    }

    #[test]
    fn residual_table_layout() {
        let rows = vec![SampleResidual {
            sample: Sample::new(1.5, -0.75),
            y_fit: -0.7,
            residual: -0.05,
        }];
        let table = format_residual_table(&rows, Unit::Cm);
        let expected = "\
Largest residuals (cm):
         x      y_obs      y_fit   residual
---------- ---------- ---------- ----------
    1.5000    -0.7500    -0.7000    -0.0500
";
        assert_eq!(table, expected);
    }
}
