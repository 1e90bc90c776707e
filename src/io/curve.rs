//! Read/write curve JSON files.
//!
//! Curve JSON is the portable representation of a run:
//! - model kind + named parameters with σ
//! - fit quality when samples were available
//! - the evaluated grid (with σ) for re-plotting via `catenary plot`
//!
//! The schema is defined by `domain::CurveFile`.

use std::fs::File;
use std::path::Path;

use chrono::Utc;
use tracing::info;

use crate::domain::{CurveFile, FitQuality, GridPoint, MeasuredModel, Unit};
use crate::error::AppError;

pub const TOOL_NAME: &str = "catenary";

pub fn build_curve_file(
    command: &str,
    unit: Unit,
    model: &MeasuredModel,
    quality: Option<FitQuality>,
    grid: &[GridPoint],
) -> CurveFile {
    CurveFile {
        tool: TOOL_NAME.to_string(),
        generated_at: Utc::now(),
        command: command.to_string(),
        unit,
        model: model.kind,
        params: model.named(),
        quality,
        grid: grid.to_vec(),
    }
}

/// Write a curve JSON file.
pub fn write_curve_json(path: &Path, curve: &CurveFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create curve JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, curve)
        .map_err(|e| AppError::input(format!("Failed to write curve JSON: {e}")))?;

    info!(path = %path.display(), points = curve.grid.len(), "wrote curve file");
    Ok(())
}

/// Read a curve JSON file.
pub fn read_curve_json(path: &Path) -> Result<CurveFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open curve JSON '{}': {e}", path.display())))?;
    let curve: CurveFile =
        serde_json::from_reader(file).map_err(|e| AppError::input(format!("Invalid curve JSON: {e}")))?;
    if curve.grid.is_empty() {
        return Err(AppError::data(format!("Curve file '{}' has an empty grid.", path.display())));
    }
    Ok(curve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelKind;
    use crate::fit::evaluate_grid;
    use crate::math::Uncertain;

    #[test]
    fn curve_file_survives_a_write_read_cycle() {
        let model = MeasuredModel {
            kind: ModelKind::Shifted,
            params: vec![
                Uncertain::new(0.3, 0.01),
                Uncertain::new(1.2, 0.02),
                Uncertain::new(-4.0, 0.1),
            ],
        };
        let grid = evaluate_grid(&model, 0.0, 9.0, 11);
        let curve = build_curve_file("fit", Unit::Cm, &model, None, &grid);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curve.json");
        write_curve_json(&path, &curve).unwrap();
        let back = read_curve_json(&path).unwrap();

        assert_eq!(back.tool, "catenary");
        assert_eq!(back.model, ModelKind::Shifted);
        assert_eq!(back.unit, Unit::Cm);
        assert_eq!(back.params[1].name, "c1");
        assert_eq!(back.grid.len(), 11);
        assert_eq!(back.generated_at, curve.generated_at);
    }

    #[test]
    fn garbage_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = read_curve_json(&path).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
    }
}
