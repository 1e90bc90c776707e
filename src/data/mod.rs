//! Data sources: the built-in dataset, or a file via `io::ingest`.

pub mod embedded;

use crate::domain::{DataInput, Dataset, Unit};
use crate::error::AppError;
use crate::io::load_dataset;

/// Resolve a configured input to samples.
///
/// The embedded dataset keeps its own unit label; `unit` applies to files.
pub fn load(input: &DataInput, unit: Unit) -> Result<Dataset, AppError> {
    match input {
        DataInput::Embedded => Ok(embedded::dataset()),
        DataInput::File(path) => load_dataset(path, unit),
    }
}
