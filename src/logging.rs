//! Diagnostics on stderr via `tracing`.
//!
//! Report text goes to stdout; everything logged here goes to stderr so
//! piping a run's output stays clean.

use std::str::FromStr;

use tracing::Level;

use crate::error::AppError;

pub fn parse_level(raw: &str) -> Result<Level, AppError> {
    Level::from_str(raw.trim())
        .map_err(|_| AppError::input(format!("Invalid log level '{raw}' (expected error, warn, info, debug or trace).")))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(level: &str) -> Result<(), AppError> {
    let level = parse_level(level)?;
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    Ok(())
}
