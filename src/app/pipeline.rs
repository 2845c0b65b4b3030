//! Shared "fit pipeline" logic.
//!
//! Keeping this in one place keeps the core workflow testable without the CLI:
//! CSV ingest -> starting point(s) -> fit with uncertainties -> residuals -> quality

use crate::domain::{FitConfig, FitQuality, SampleResidual};
use crate::error::AppError;
use crate::fit::{CurveFitOptions, UncertainFit, fit_multistart, fit_with_uncertainty, jittered_starts};
use crate::io::{IngestedSamples, load_samples};
use crate::models::initial_guess;
use crate::report::{compute_residuals, fit_quality};

/// Relative spread of randomized restarts around the base starting point.
const RESTART_SCALE: f64 = 0.5;

/// All computed outputs of a single `curvefit fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedSamples,
    pub fit: UncertainFit,
    pub residuals: Vec<SampleResidual>,
    pub quality: FitQuality,
}

/// Execute the full fitting pipeline and return the computed outputs.
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, AppError> {
    let ingest = load_samples(&config.input)?;
    tracing::info!(
        rows_read = ingest.rows_read,
        rows_used = ingest.rows_used,
        path = %config.input.display(),
        "loaded samples"
    );
    run_fit_on_samples(config, ingest)
}

/// Execute the fitting pipeline on already-ingested samples.
pub fn run_fit_on_samples(config: &FitConfig, ingest: IngestedSamples) -> Result<RunOutput, AppError> {
    let model = config.model;
    let x = ingest.xs();
    let y = ingest.ys();

    let mut options = CurveFitOptions::default()
        .with_solver(config.solver.clone())
        .with_absolute_sigma(config.absolute_sigma);
    if let Some(sigma) = ingest.sigmas() {
        options = options.with_sigma(sigma);
    }
    if let Some(bounds) = &config.bounds {
        options = options.with_bounds(bounds.clone());
    }

    let base = match &config.initial_guess {
        Some(p0) => p0.clone(),
        None => {
            let mut guess = initial_guess(model, &x, &y);
            if let Some(bounds) = &config.bounds {
                if bounds.len() == guess.len() {
                    for (i, g) in guess.iter_mut().enumerate() {
                        *g = bounds.clamp(i, *g);
                    }
                }
            }
            tracing::debug!(?guess, "data-driven initial guess");
            guess
        }
    };

    let fit = if config.restarts == 0 {
        fit_with_uncertainty(
            &model,
            &x,
            &y,
            config.return_covariance,
            &options.with_initial_guess(base),
        )?
    } else {
        let starts = jittered_starts(
            &base,
            config.restarts,
            RESTART_SCALE,
            config.seed,
            config.bounds.as_ref(),
        );
        fit_multistart(&model, &x, &y, &starts, config.return_covariance, &options)?
    };

    let residuals = compute_residuals(&model, &fit.params, &ingest.points)?;
    let quality = fit_quality(&residuals, model.param_len());

    Ok(RunOutput {
        ingest,
        fit,
        residuals,
        quality,
    })
}
