//! Nonlinear curve fitting: `y ≈ f(x, θ)`.
//!
//! Given:
//! - a model `f(x, θ₁…θₖ)`
//! - samples `x_i`, `y_i` and optional per-sample uncertainties `σ_i`
//!
//! we minimize `Σ ((f(x_i, θ) - y_i) / σ_i)²` with the Levenberg–Marquardt
//! solver and estimate the parameter covariance from the Jacobian at the
//! optimum:
//!
//! ```text
//! pcov = (JᵀJ)⁺ · s²,   s² = Σ r_i² / (m - k)
//! ```
//!
//! With `absolute_sigma` the `s²` rescaling is skipped, so `σ` is taken as the
//! true measurement error. When the covariance cannot be estimated, every
//! entry of `pcov` is `+inf`.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::FitError;
use crate::math::{fill_infinite, forward_difference, unscaled_covariance};
use crate::models::Model;
use crate::solver::{Bounds, LMConfig, LevenbergMarquardt, Termination};

/// Options accepted by [`curve_fit`].
#[derive(Debug, Clone, PartialEq)]
pub struct CurveFitOptions {
    /// Starting parameters, one per model parameter.
    ///
    /// Defaults to all ones (made feasible when bounds are set).
    pub initial_guess: Option<Vec<f64>>,
    /// Per-sample uncertainty of `y`; residuals are divided by it.
    pub sigma: Option<Vec<f64>>,
    /// Treat `sigma` as absolute errors (do not rescale the covariance).
    pub absolute_sigma: bool,
    pub bounds: Option<Bounds>,
    /// Reject NaN/inf in `x` and `y` up front (default: `true`).
    pub check_finite: bool,
    pub solver: LMConfig,
}

impl Default for CurveFitOptions {
    fn default() -> Self {
        Self {
            initial_guess: None,
            sigma: None,
            absolute_sigma: false,
            bounds: None,
            check_finite: true,
            solver: LMConfig::default(),
        }
    }
}

impl CurveFitOptions {
    pub fn with_initial_guess(mut self, p0: Vec<f64>) -> Self {
        self.initial_guess = Some(p0);
        self
    }

    pub fn with_sigma(mut self, sigma: Vec<f64>) -> Self {
        self.sigma = Some(sigma);
        self
    }

    pub fn with_absolute_sigma(mut self, absolute_sigma: bool) -> Self {
        self.absolute_sigma = absolute_sigma;
        self
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_solver(mut self, solver: LMConfig) -> Self {
        self.solver = solver;
        self
    }
}

/// Solver statistics for a finished fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitDiagnostics {
    /// Weighted sum of squared residuals at the optimum.
    pub cost: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub termination: Termination,
    /// Degrees of freedom `m - k`.
    pub dof: usize,
    /// `false` when `pcov` was filled with `+inf`.
    pub covariance_estimated: bool,
}

/// Raw solver output: best-fit parameters and their covariance.
#[derive(Debug, Clone)]
pub struct CurveFitOutcome {
    pub params: Vec<f64>,
    pub covariance: DMatrix<f64>,
    pub diagnostics: FitDiagnostics,
}

/// Fit `model` to `(x, y)` by nonlinear least squares.
pub fn curve_fit<M>(
    model: &M,
    x: &[f64],
    y: &[f64],
    options: &CurveFitOptions,
) -> Result<CurveFitOutcome, FitError>
where
    M: Model + ?Sized,
{
    let m = y.len();
    let k = model.param_count();

    validate(x, y, k, options)?;

    let p0 = starting_point(k, options)?;
    let weights: Vec<f64> = match &options.sigma {
        Some(sigma) => sigma.iter().map(|s| 1.0 / s).collect(),
        None => vec![1.0; m],
    };

    let mut residuals = |p: &DVector<f64>| {
        let params = p.as_slice();
        DVector::from_iterator(
            m,
            x.iter()
                .zip(y.iter())
                .zip(weights.iter())
                .map(|((&xi, &yi), &w)| (model.eval(xi, params) - yi) * w),
        )
    };

    let solver = LevenbergMarquardt::new(options.solver.clone());
    let result = solver.minimize(&mut residuals, DVector::from_vec(p0), options.bounds.as_ref())?;

    let jac = forward_difference(&mut residuals, &result.params, &result.residuals, options.bounds.as_ref());
    let mut covariance = unscaled_covariance(&jac);

    let dof = m - k;
    let mut covariance_estimated = true;
    if covariance.iter().any(|v| v.is_nan()) {
        fill_infinite(&mut covariance);
        covariance_estimated = false;
    } else if !options.absolute_sigma {
        if dof > 0 {
            covariance *= result.cost / dof as f64;
        } else {
            fill_infinite(&mut covariance);
            covariance_estimated = false;
        }
    }
    if !covariance_estimated {
        tracing::warn!(samples = m, params = k, "covariance of the parameters could not be estimated");
    }

    tracing::debug!(
        cost = result.cost,
        iterations = result.iterations,
        evaluations = result.evaluations,
        termination = ?result.termination,
        "curve fit converged"
    );

    Ok(CurveFitOutcome {
        params: result.params.iter().copied().collect(),
        covariance,
        diagnostics: FitDiagnostics {
            cost: result.cost,
            iterations: result.iterations,
            evaluations: result.evaluations,
            termination: result.termination,
            dof,
            covariance_estimated,
        },
    })
}

fn validate(x: &[f64], y: &[f64], k: usize, options: &CurveFitOptions) -> Result<(), FitError> {
    if x.len() != y.len() {
        return Err(FitError::LengthMismatch { x: x.len(), y: y.len() });
    }
    if y.is_empty() {
        return Err(FitError::EmptyData);
    }
    if k == 0 {
        return Err(FitError::NoParameters);
    }
    if k > y.len() {
        return Err(FitError::TooFewSamples {
            samples: y.len(),
            params: k,
        });
    }
    if let Some(p0) = &options.initial_guess {
        if p0.len() != k {
            return Err(FitError::InitialGuessLength {
                expected: k,
                got: p0.len(),
            });
        }
    }
    if let Some(sigma) = &options.sigma {
        if sigma.len() != y.len() {
            return Err(FitError::SigmaLength {
                expected: y.len(),
                got: sigma.len(),
            });
        }
        if let Some(index) = sigma.iter().position(|s| !(s.is_finite() && *s > 0.0)) {
            return Err(FitError::InvalidSigma { index });
        }
    }
    if options.check_finite && x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(FitError::NonFiniteInput);
    }
    if let Some(bounds) = &options.bounds {
        bounds.check()?;
        if bounds.len() != k {
            return Err(FitError::InvalidBounds(format!(
                "expected {k} bounds, got {}",
                bounds.len()
            )));
        }
        if let Some(p0) = &options.initial_guess {
            if let Some(index) = (0..k).find(|&i| !bounds.contains(i, p0[i])) {
                return Err(FitError::InitialGuessOutOfBounds { index });
            }
        }
    }
    Ok(())
}

fn starting_point(k: usize, options: &CurveFitOptions) -> Result<Vec<f64>, FitError> {
    if let Some(p0) = &options.initial_guess {
        return Ok(p0.clone());
    }
    Ok(match &options.bounds {
        Some(bounds) => (0..k).map(|i| bounds.feasible_start(i)).collect(),
        None => vec![1.0; k],
    })
}
