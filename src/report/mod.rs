//! Reporting utilities: residuals, fit quality, and the exportable report.
//!
//! Terminal formatting lives in `format`.

pub mod format;

pub use format::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{FitQuality, ModelKind, SamplePoint, SampleResidual};
use crate::error::AppError;
use crate::fit::{FitDiagnostics, UncertainFit};
use crate::models::Model;

/// Compute fitted values and residuals (`y - y_fit`) for each sample.
pub fn compute_residuals<M>(
    model: &M,
    params: &[f64],
    samples: &[SamplePoint],
) -> Result<Vec<SampleResidual>, AppError>
where
    M: Model + ?Sized,
{
    let mut out = Vec::with_capacity(samples.len());
    for p in samples {
        let y_fit = model.eval(p.x, params);
        if !y_fit.is_finite() {
            return Err(AppError::new(4, "Non-finite model prediction during residual computation."));
        }
        out.push(SampleResidual {
            point: *p,
            y_fit,
            residual: p.y - y_fit,
        });
    }
    Ok(out)
}

/// Quality statistics for residuals of a fit with `n_params` parameters.
///
/// Reduced χ² weights each residual by its sample's sigma (1 when absent).
pub fn fit_quality(residuals: &[SampleResidual], n_params: usize) -> FitQuality {
    let n = residuals.len();
    let dof = n.saturating_sub(n_params);

    let sse: f64 = residuals.iter().map(|r| r.residual * r.residual).sum();
    let chi2: f64 = residuals
        .iter()
        .map(|r| {
            let z = r.residual / r.point.sigma.unwrap_or(1.0);
            z * z
        })
        .sum();

    FitQuality {
        n,
        dof,
        sse,
        rmse: if n > 0 { (sse / n as f64).sqrt() } else { 0.0 },
        reduced_chi2: (dof > 0).then(|| chi2 / dof as f64),
    }
}

/// One fitted parameter with its standard error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterEstimate {
    pub name: String,
    pub value: f64,
    /// `0.0` when `estimated` is false.
    pub error: f64,
    pub estimated: bool,
}

/// Machine-readable record of a fit run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub model: ModelKind,
    pub formula: String,
    pub parameters: Vec<ParameterEstimate>,
    /// Covariance rows; non-finite entries are written as `null`.
    pub covariance: Option<Vec<Vec<Option<f64>>>>,
    pub quality: FitQuality,
    pub diagnostics: FitDiagnostics,
}

impl FitReport {
    pub fn new(model: ModelKind, fit: &UncertainFit, quality: FitQuality) -> Self {
        let parameters = model
            .param_names()
            .iter()
            .zip(&fit.params)
            .zip(fit.errors.iter().zip(&fit.error_estimated))
            .map(|((name, &value), (&error, &estimated))| ParameterEstimate {
                name: (*name).to_string(),
                value,
                error,
                estimated,
            })
            .collect();

        let covariance = fit.covariance.as_ref().map(|pcov| {
            pcov.row_iter()
                .map(|row| row.iter().map(|v| v.is_finite().then_some(*v)).collect())
                .collect()
        });

        Self {
            tool: "curvefit".to_string(),
            generated_at: Utc::now(),
            model,
            formula: model.formula().to_string(),
            parameters,
            covariance,
            quality,
            diagnostics: fit.diagnostics.clone(),
        }
    }
}
