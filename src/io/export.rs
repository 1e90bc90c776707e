//! Export per-sample results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::path::Path;

use crate::domain::{SampleResidual, Unit};
use crate::error::AppError;

/// Write per-sample results to a CSV file.
pub fn write_results_csv(path: &Path, residuals: &[SampleResidual], unit: Unit) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::input(format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writer
        .write_record(["x", "y", "x_err", "y_err", "y_fit", "residual", "unit"])
        .map_err(|e| AppError::input(format!("Failed to write export CSV header: {e}")))?;

    let opt = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
    for r in residuals {
        let s = &r.sample;
        writer
            .write_record([
                s.x.to_string(),
                s.y.to_string(),
                opt(s.x_sigma),
                opt(s.y_sigma),
                format!("{:.6}", r.y_fit),
                format!("{:.6}", r.residual),
                unit.label().to_string(),
            ])
            .map_err(|e| AppError::input(format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::input(format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Sample;

    #[test]
    fn writes_header_and_one_row_per_sample() {
        let residuals = vec![
            SampleResidual {
                sample: Sample::with_sigma(0.109, -0.6, 0.01, 0.01),
                y_fit: -0.6012,
                residual: 0.0012,
            },
            SampleResidual {
                sample: Sample::new(1.0, -0.7),
                y_fit: -0.69,
                residual: -0.01,
            },
        ];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_results_csv(&path, &residuals, Unit::Cm).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "x,y,x_err,y_err,y_fit,residual,unit");
        assert_eq!(lines[1], "0.109,-0.6,0.01,0.01,-0.601200,0.001200,cm");
        assert_eq!(lines[2], "1,-0.7,,,-0.690000,-0.010000,cm");
    }
}
