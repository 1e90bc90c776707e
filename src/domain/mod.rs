//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - samples and datasets (`Sample`, `Dataset`)
//! - model descriptions (`ModelKind`, `CurveModel`, `MeasuredModel`)
//! - evaluation outputs (`SampleResidual`, `GridPoint`, `FitQuality`, `CurveFile`)
//! - run configuration (`EvalConfig`, `FitConfig`, `SolveConfig`, ...)

pub mod config;
pub mod types;

pub use config::*;
pub use types::*;
