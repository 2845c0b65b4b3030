//! Shared domain types.
//!
//! These types are kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV
//! - built directly from CLI flags

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::solver::{Bounds, LMConfig};

/// Built-in model functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// `a·x + b`
    Linear,
    /// `a·x² + b·x + c`
    Quadratic,
    /// `a·exp(b·x) + c`
    Exponential,
    /// `a·exp(-(x - mu)² / (2·sigma²))`
    Gaussian,
    /// `a·x^b`
    Power,
}

impl ModelKind {
    pub const ALL: [ModelKind; 5] = [
        ModelKind::Linear,
        ModelKind::Quadratic,
        ModelKind::Exponential,
        ModelKind::Gaussian,
        ModelKind::Power,
    ];

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Linear => "linear",
            ModelKind::Quadratic => "quadratic",
            ModelKind::Exponential => "exponential",
            ModelKind::Gaussian => "gaussian",
            ModelKind::Power => "power",
        }
    }

    /// The model formula, for reports.
    pub fn formula(self) -> &'static str {
        match self {
            ModelKind::Linear => "a*x + b",
            ModelKind::Quadratic => "a*x^2 + b*x + c",
            ModelKind::Exponential => "a*exp(b*x) + c",
            ModelKind::Gaussian => "a*exp(-(x - mu)^2 / (2*sigma^2))",
            ModelKind::Power => "a*x^b",
        }
    }

    /// Parameter names in fit order.
    pub fn param_names(self) -> &'static [&'static str] {
        match self {
            ModelKind::Linear => &["a", "b"],
            ModelKind::Quadratic => &["a", "b", "c"],
            ModelKind::Exponential => &["a", "b", "c"],
            ModelKind::Gaussian => &["a", "mu", "sigma"],
            ModelKind::Power => &["a", "b"],
        }
    }

    pub fn param_len(self) -> usize {
        self.param_names().len()
    }
}

/// One observation: independent value, dependent value, and its uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    pub x: f64,
    pub y: f64,
    pub sigma: Option<f64>,
}

/// Observed vs fitted value for one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleResidual {
    pub point: SamplePoint,
    pub y_fit: f64,
    pub residual: f64,
}

/// Fit quality diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitQuality {
    pub n: usize,
    /// Degrees of freedom `n - k`.
    pub dof: usize,
    /// Unweighted sum of squared residuals.
    pub sse: f64,
    pub rmse: f64,
    /// Weighted χ² divided by `dof`; `None` when `dof == 0`.
    pub reduced_chi2: Option<f64>,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags, environment defaults, and built-in defaults.
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub input: PathBuf,
    pub model: ModelKind,
    pub initial_guess: Option<Vec<f64>>,
    pub bounds: Option<Bounds>,
    /// Treat `sigma` as absolute errors (no rescaling of the covariance).
    pub absolute_sigma: bool,
    /// Include the covariance matrix in the output.
    pub return_covariance: bool,
    /// Extra jittered starting points tried in parallel.
    pub restarts: usize,
    pub seed: u64,
    pub solver: LMConfig,
    pub export_json: Option<PathBuf>,
    pub export_residuals: Option<PathBuf>,
}

/// Settings for synthetic sample generation.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub model: ModelKind,
    pub params: Vec<f64>,
    pub n: usize,
    pub x_min: f64,
    pub x_max: f64,
    /// Standard deviation of the Gaussian noise added to `y`.
    pub noise: f64,
    pub seed: u64,
}
