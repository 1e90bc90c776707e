//! Shared domain types.
//!
//! These types are kept lightweight so they can be:
//!
//! - used in-memory during evaluation and fitting
//! - exported to JSON/CSV
//! - reloaded later for plotting

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::math::Uncertain;

/// Which catenary parameterization a model uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// `y = cosh(a·x + b) / a + c`
    Vertex,
    /// `y = (c1 / a) · cosh(a·(x − c2) / c1) − 1 / a`
    Shifted,
}

impl ModelKind {
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Vertex => "catenary (vertex form)",
            ModelKind::Shifted => "catenary (shifted form)",
        }
    }

    pub fn formula(self) -> &'static str {
        match self {
            ModelKind::Vertex => "y = cosh(a*x + b)/a + c",
            ModelKind::Shifted => "y = (c1/a)*cosh(a*(x - c2)/c1) - 1/a",
        }
    }

    pub fn param_names(self) -> [&'static str; 3] {
        match self {
            ModelKind::Vertex => ["a", "b", "c"],
            ModelKind::Shifted => ["a", "c1", "c2"],
        }
    }

    pub fn param_count(self) -> usize {
        3
    }
}

/// Length unit label attached to a dataset.
///
/// Labels only; values are never converted between units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    M,
    Cm,
}

impl Unit {
    pub fn label(self) -> &'static str {
        match self {
            Unit::M => "m",
            Unit::Cm => "cm",
        }
    }
}

/// One observation, optionally with per-coordinate standard deviations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub x_sigma: Option<f64>,
    pub y_sigma: Option<f64>,
}

impl Sample {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            x_sigma: None,
            y_sigma: None,
        }
    }

    pub fn with_sigma(x: f64, y: f64, x_sigma: f64, y_sigma: f64) -> Self {
        Self {
            x,
            y,
            x_sigma: Some(x_sigma),
            y_sigma: Some(y_sigma),
        }
    }

    pub fn x_measured(&self) -> Uncertain {
        Uncertain::new(self.x, self.x_sigma.unwrap_or(0.0))
    }

    pub fn y_measured(&self) -> Uncertain {
        Uncertain::new(self.y, self.y_sigma.unwrap_or(0.0))
    }
}

/// Where a dataset came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Embedded(&'static str),
    File(PathBuf),
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Embedded(name) => write!(f, "embedded:{name}"),
            DataSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A row-level problem encountered while loading a file.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Samples plus provenance.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub source: DataSource,
    pub unit: Unit,
    pub samples: Vec<Sample>,
    pub row_errors: Vec<RowError>,
}

impl Dataset {
    pub fn xs(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.x).collect()
    }

    pub fn ys(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.y).collect()
    }

    pub fn has_sigma(&self) -> bool {
        self.samples
            .iter()
            .any(|s| s.x_sigma.is_some() || s.y_sigma.is_some())
    }

    /// Summary stats, or `None` for an empty dataset.
    pub fn stats(&self) -> Option<DatasetStats> {
        let first = self.samples.first()?;
        let mut stats = DatasetStats {
            n_points: self.samples.len(),
            x_min: first.x,
            x_max: first.x,
            y_min: first.y,
            y_max: first.y,
        };
        for s in &self.samples[1..] {
            stats.x_min = stats.x_min.min(s.x);
            stats.x_max = stats.x_max.max(s.x);
            stats.y_min = stats.y_min.min(s.y);
            stats.y_max = stats.y_max.max(s.y);
        }
        Some(stats)
    }

    /// The samples with the smallest and largest `x`.
    pub fn endpoints(&self) -> Option<(Sample, Sample)> {
        let cmp = |a: &&Sample, b: &&Sample| a.x.total_cmp(&b.x);
        let lo = self.samples.iter().min_by(cmp)?;
        let hi = self.samples.iter().max_by(cmp)?;
        Some((*lo, *hi))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub n_points: usize,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

/// Plain-number model (fitting, residuals).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveModel {
    pub kind: ModelKind,
    pub params: Vec<f64>,
}

/// Model whose parameters carry uncertainty (reporting, grids).
#[derive(Debug, Clone)]
pub struct MeasuredModel {
    pub kind: ModelKind,
    pub params: Vec<Uncertain>,
}

impl MeasuredModel {
    pub fn exact(model: &CurveModel) -> Self {
        Self {
            kind: model.kind,
            params: model.params.iter().map(|&p| Uncertain::exact(p)).collect(),
        }
    }

    pub fn nominal(&self) -> CurveModel {
        CurveModel {
            kind: self.kind,
            params: self.params.iter().map(Uncertain::nominal).collect(),
        }
    }

    /// Parameters paired with their names, in model order.
    pub fn named(&self) -> Vec<NamedMeasurement> {
        self.kind
            .param_names()
            .iter()
            .zip(self.params.iter())
            .map(|(name, p)| NamedMeasurement {
                name: (*name).to_string(),
                value: p.nominal(),
                std_dev: p.std_dev(),
            })
            .collect()
    }
}

/// Serializable snapshot of an uncertain parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedMeasurement {
    pub name: String,
    pub value: f64,
    pub std_dev: f64,
}

/// Fitted value and residual for one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleResidual {
    pub sample: Sample,
    pub y_fit: f64,
    pub residual: f64,
}

/// One point of the dense evaluation grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: f64,
    pub y: f64,
    pub std_dev: f64,
}

/// Goodness-of-fit diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitQuality {
    pub n: usize,
    pub ssr: f64,
    pub sst: f64,
    /// `None` when SST is zero (constant observations).
    pub r_squared: Option<f64>,
    pub rmse: f64,
}

/// A saved curve file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub command: String,
    pub unit: Unit,
    pub model: ModelKind,
    pub params: Vec<NamedMeasurement>,
    pub quality: Option<FitQuality>,
    pub grid: Vec<GridPoint>,
}
