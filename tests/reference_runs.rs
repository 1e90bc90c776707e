//! End-to-end runs through the library pipeline.

use catenary_fit::app::pipeline::{ParamOrigin, run_eval, run_regress, run_solve};
use catenary_fit::domain::{
    BoundaryConditions, DataInput, EvalConfig, OutputConfig, ParamSpec, RegressConfig, SolveConfig, SolverOptions,
    Unit,
};
use catenary_fit::io::{build_curve_file, read_curve_json, write_curve_json, write_results_csv};
use catenary_fit::models::vertex;

fn output() -> OutputConfig {
    OutputConfig {
        grid_points: 100,
        ..OutputConfig::default()
    }
}

fn cable_conditions() -> BoundaryConditions {
    BoundaryConditions {
        x1: 0.00021,
        y1: 0.506,
        x2: 0.603,
        y2: 0.221,
        arc_length: 0.9073,
    }
}

#[test]
fn cable_solve_lands_near_measured_parameters() {
    let config = SolveConfig {
        data: None,
        unit: Unit::M,
        conditions: cable_conditions(),
        guess: [5.0, -1.8, -0.1],
        relative_sigma: 0.01,
        solver: SolverOptions::default(),
        output: output(),
    };
    let run = run_solve(&config).unwrap();
    let report = run.solve.as_ref().unwrap();
    assert!(report.success, "{}", report.message);

    let a = run.model.params[0].nominal();
    let b = run.model.params[1].nominal();
    assert!((a - 5.03).abs() < 0.05, "a = {a}");
    assert!((b + 1.841).abs() < 0.02, "b = {b}");
    assert!(report.fun.iter().all(|r| r.abs() < 1e-6));
}

#[test]
fn eval_at_origin_follows_linear_propagation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cable.csv");
    std::fs::write(&path, "x,y\n0.0,0.506\n0.3,0.25\n0.603,0.221\n").unwrap();

    let (a, sa, b, sb, c, sc) = (5.03, 0.05, -1.841, 0.018, -0.1362, 0.0014);
    let config = EvalConfig {
        data: DataInput::File(path),
        unit: Unit::M,
        a: ParamSpec { value: a, std_dev: sa },
        b: ParamSpec { value: b, std_dev: sb },
        c: ParamSpec { value: c, std_dev: sc },
        output: OutputConfig {
            grid_points: 2,
            ..output()
        },
    };
    let run = run_eval(&config).unwrap();
    assert_eq!(run.origin, ParamOrigin::Given);

    let at_origin = catenary_fit::models::predict_measured(&run.model, &catenary_fit::math::Uncertain::exact(0.0));
    let expected = b.cosh() / a + c;
    let d_a = -b.cosh() / (a * a);
    let d_b = b.sinh() / a;
    let sigma = ((d_a * sa).powi(2) + (d_b * sb).powi(2) + sc * sc).sqrt();

    assert!((at_origin.nominal() - expected).abs() < 1e-12);
    assert!((at_origin.nominal() - 0.506).abs() < 1e-3);
    assert!((at_origin.std_dev() - sigma).abs() < 1e-12);
}

#[test]
fn regress_recovers_synthetic_curve_and_exports() {
    let (a, b, c) = (2.0, -1.0, 0.3);
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("samples.csv");

    let mut body = String::from("x,y\n");
    for i in 0..40 {
        let x = i as f64 * 0.025;
        // Small deterministic wobble so the covariance is non-zero.
        let wobble = 1e-4 * ((i * 7 % 5) as f64 - 2.0);
        body.push_str(&format!("{x},{}\n", vertex(x, a, b, c) + wobble));
    }
    std::fs::write(&data_path, body).unwrap();

    let config = RegressConfig {
        data: DataInput::File(data_path),
        unit: Unit::M,
        guess: Some([1.8, -0.9, 0.35]),
        solver: SolverOptions::default(),
        output: output(),
    };
    let run = run_regress(&config).unwrap();
    assert_eq!(run.origin, ParamOrigin::Covariance);

    let params: Vec<f64> = run.model.params.iter().map(|p| p.nominal()).collect();
    assert!((params[0] - a).abs() < 1e-2, "{params:?}");
    assert!((params[1] - b).abs() < 1e-2, "{params:?}");
    assert!((params[2] - c).abs() < 1e-2, "{params:?}");
    assert!(run.model.params.iter().all(|p| p.std_dev() > 0.0));

    let quality = run.evaluation.quality.unwrap();
    assert_eq!(quality.n, 40);
    assert!(quality.r_squared.unwrap() > 0.999);

    let csv_path = dir.path().join("results.csv");
    write_results_csv(&csv_path, &run.evaluation.residuals, run.unit).unwrap();
    let text = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(text.lines().count(), 41);

    let curve_path = dir.path().join("curve.json");
    let curve = build_curve_file("regress", run.unit, &run.model, run.evaluation.quality, &run.evaluation.grid);
    write_curve_json(&curve_path, &curve).unwrap();
    let loaded = read_curve_json(&curve_path).unwrap();
    assert_eq!(loaded.command, "regress");
    assert_eq!(loaded.grid.len(), 100);
    assert_eq!(loaded.params[1].name, "b");
}

#[test]
fn too_few_rows_is_a_data_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.csv");
    std::fs::write(&path, "x,y\n0.0,1.0\nnot,a-number\n").unwrap();

    let config = RegressConfig {
        data: DataInput::File(path),
        unit: Unit::M,
        guess: None,
        solver: SolverOptions::default(),
        output: output(),
    };
    let err = run_regress(&config).unwrap_err();
    assert_eq!(err.exit_code(), catenary_fit::error::EXIT_DATA);
}
