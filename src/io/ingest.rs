//! File ingest for `(x, y[, σx, σy])` samples.
//!
//! - CSV (`.csv`, `.txt`, anything unrecognised) via `csv`
//! - spreadsheets (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`) via `calamine`, first sheet
//!
//! Both paths reduce to a header row plus string cells so column resolution
//! and row validation are shared. Bad rows are skipped and reported.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use tracing::{debug, warn};

use crate::domain::{DataSource, Dataset, RowError, Sample, Unit};
use crate::error::AppError;

const X_NAMES: [&str; 1] = ["x"];
const Y_NAMES: [&str; 1] = ["y"];
const X_SIGMA_NAMES: [&str; 4] = ["x_err", "sigma_x", "dx", "x_sigma"];
const Y_SIGMA_NAMES: [&str; 4] = ["y_err", "sigma_y", "dy", "y_sigma"];

/// Minimum usable samples for any downstream stage.
pub const MIN_SAMPLES: usize = 2;

/// A row as read from the file: 1-based line number plus cells (or a parse error).
type RawRow = (usize, Result<Vec<String>, String>);

#[derive(Debug, Clone, Copy)]
struct Columns {
    x: usize,
    y: usize,
    x_sigma: Option<usize>,
    y_sigma: Option<usize>,
}

/// Load a dataset from disk, dispatching on the file extension.
pub fn load_dataset(path: &Path, unit: Unit) -> Result<Dataset, AppError> {
    if !path.exists() {
        return Err(AppError::input(format!("Input file '{}' does not exist.", path.display())));
    }

    let (headers, rows) = if is_spreadsheet(path) {
        read_spreadsheet(path)?
    } else {
        read_csv(path)?
    };

    let columns = resolve_columns(&headers)?;
    let mut samples = Vec::new();
    let mut row_errors = Vec::new();

    for (line, row) in rows {
        let parsed = row.and_then(|cells| parse_row(&cells, columns));
        match parsed {
            Ok(Some(sample)) => samples.push(sample),
            Ok(None) => {}
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if !row_errors.is_empty() {
        warn!(skipped = row_errors.len(), "skipped malformed rows in {}", path.display());
    }
    if samples.len() < MIN_SAMPLES {
        return Err(AppError::data(format!(
            "Need at least {MIN_SAMPLES} valid samples in '{}', found {}.",
            path.display(),
            samples.len()
        )));
    }
    debug!(n = samples.len(), path = %path.display(), "loaded dataset");

    Ok(Dataset {
        source: DataSource::File(path.to_path_buf()),
        unit,
        samples,
        row_errors,
    })
}

fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "xlsx" | "xlsm" | "xlsb" | "xls" | "ods"))
        .unwrap_or(false)
}

fn read_csv(path: &Path) -> Result<(Vec<String>, Vec<RawRow>), AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read CSV headers: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    let rows = reader
        .records()
        .enumerate()
        .map(|(idx, result)| {
            // Header is line 1.
            let line = idx + 2;
            let cells = result
                .map(|r| r.iter().map(str::to_string).collect())
                .map_err(|e| format!("CSV parse error: {e}"));
            (line, cells)
        })
        .collect();

    Ok((headers, rows))
}

fn read_spreadsheet(path: &Path) -> Result<(Vec<String>, Vec<RawRow>), AppError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| AppError::input(format!("Failed to open spreadsheet '{}': {e}", path.display())))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::input(format!("Spreadsheet '{}' has no worksheets.", path.display())))?
        .map_err(|e| AppError::input(format!("Failed to read first worksheet: {e}")))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| AppError::data("First worksheet is empty."))?
        .iter()
        .map(cell_text)
        .collect();

    let start_line = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);
    let body = rows
        .enumerate()
        .map(|(idx, cells)| (start_line + idx + 1, Ok(cells.iter().map(cell_text).collect())))
        .collect();

    Ok((headers, body))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        other => other.to_string().trim().to_string(),
    }
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn resolve_columns(headers: &[String]) -> Result<Columns, AppError> {
    let header_map: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect();

    let find = |names: &[&str]| names.iter().find_map(|n| header_map.get(*n).copied());

    let x = find(&X_NAMES).ok_or_else(|| AppError::input("Missing required column: `x`"))?;
    let y = find(&Y_NAMES).ok_or_else(|| AppError::input("Missing required column: `y`"))?;

    Ok(Columns {
        x,
        y,
        x_sigma: find(&X_SIGMA_NAMES),
        y_sigma: find(&Y_SIGMA_NAMES),
    })
}

/// `Ok(None)` for a fully blank row.
fn parse_row(cells: &[String], columns: Columns) -> Result<Option<Sample>, String> {
    if cells.iter().all(|c| c.trim().is_empty()) {
        return Ok(None);
    }

    let x = parse_required(cells, columns.x, "x")?;
    let y = parse_required(cells, columns.y, "y")?;
    let x_sigma = parse_sigma(cells, columns.x_sigma, "x_err")?;
    let y_sigma = parse_sigma(cells, columns.y_sigma, "y_err")?;

    Ok(Some(Sample { x, y, x_sigma, y_sigma }))
}

fn parse_required(cells: &[String], idx: usize, name: &str) -> Result<f64, String> {
    let raw = cells
        .get(idx)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))?;
    parse_number(raw, name)
}

fn parse_sigma(cells: &[String], idx: Option<usize>, name: &str) -> Result<Option<f64>, String> {
    let Some(raw) = idx.and_then(|i| cells.get(i)).map(|s| s.trim()).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let v = parse_number(raw, name)?;
    if v < 0.0 {
        return Err(format!("`{name}` must be >= 0, got {v}"));
    }
    Ok(Some(v))
}

fn parse_number(raw: &str, name: &str) -> Result<f64, String> {
    let v: f64 = raw
        .parse()
        .map_err(|_| format!("Invalid number for `{name}`: '{raw}'"))?;
    if !v.is_finite() {
        return Err(format!("Non-finite value for `{name}`: '{raw}'"));
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::error::{EXIT_DATA, EXIT_INPUT};

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_xy_with_bom_and_mixed_case_headers() {
        let file = write_csv("\u{feff}X , Y\n0.0,0.5\n0.1,0.4\n0.2,0.35\n");
        let data = load_dataset(file.path(), Unit::M).unwrap();
        assert_eq!(data.samples.len(), 3);
        assert_eq!(data.samples[1], Sample::new(0.1, 0.4));
        assert!(!data.has_sigma());
    }

    #[test]
    fn reads_optional_sigma_columns() {
        let file = write_csv("x,y,sigma_x,y_err\n1,2,0.01,0.02\n3,4,,0.03\n");
        let data = load_dataset(file.path(), Unit::Cm).unwrap();
        assert_eq!(data.samples[0].x_sigma, Some(0.01));
        assert_eq!(data.samples[0].y_sigma, Some(0.02));
        assert_eq!(data.samples[1].x_sigma, None);
        assert_eq!(data.unit, Unit::Cm);
    }

    #[test]
    fn skips_and_reports_bad_rows() {
        let file = write_csv("x,y\n0,1\nabc,2\n1,\n\n2,3\n");
        let data = load_dataset(file.path(), Unit::M).unwrap();
        assert_eq!(data.samples.len(), 2);
        let lines: Vec<usize> = data.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4]);
    }

    #[test]
    fn missing_column_is_an_input_error() {
        let file = write_csv("t,y\n0,1\n1,2\n");
        let err = load_dataset(file.path(), Unit::M).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_INPUT);
        assert!(err.message().contains("`x`"));
    }

    #[test]
    fn too_few_samples_is_a_data_error() {
        let file = write_csv("x,y\n0,1\n");
        let err = load_dataset(file.path(), Unit::M).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_DATA);
    }

    #[test]
    fn reads_first_worksheet_with_offset_header() {
        // Header sits on row 3; row 5 has text in the `x` cell.
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/profile_offset.xlsx");
        let data = load_dataset(&path, Unit::M).unwrap();

        assert_eq!(data.samples.len(), 3);
        assert_eq!(data.samples[0], Sample::with_sigma(0.0, 0.5, 0.01, 0.02));
        assert_eq!(data.samples[1].x, 0.2);
        assert_eq!(data.samples[1].x_sigma, None);
        assert_eq!(data.samples[1].y_sigma, Some(0.03));
        assert!(data.has_sigma());

        let lines: Vec<usize> = data.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![5]);
        assert!(data.row_errors[0].message.contains("oops"));
        assert_eq!(data.source, DataSource::File(path));
    }

    #[test]
    fn spreadsheet_cells_render_as_parseable_text() {
        assert_eq!(cell_text(&Data::Float(0.25)), "0.25");
        assert_eq!(cell_text(&Data::Int(3)), "3");
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::String(" 1.5 ".to_string())), "1.5");
    }

    #[test]
    fn missing_file_is_an_input_error() {
        let err = load_dataset(Path::new("/definitely/not/here.xlsx"), Unit::M).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_INPUT);
    }
}
