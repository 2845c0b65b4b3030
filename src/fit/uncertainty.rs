//! Best-fit parameters together with their 1-sigma uncertainties.
//!
//! This is a thin layer over [`curve_fit`]: the fit itself is delegated
//! unchanged, then each parameter's standard error is read from the diagonal
//! of the covariance matrix.
//!
//! An error of `0.0` means the uncertainty could not be estimated (missing,
//! negative, or non-finite variance), not that the parameter is exact. The
//! matching `error_estimated` flag is `false` in that case.

use nalgebra::DMatrix;

use super::curve_fit::{CurveFitOptions, FitDiagnostics, curve_fit};
use crate::error::FitError;
use crate::models::Model;

/// Fit output with per-parameter standard errors.
#[derive(Debug, Clone)]
pub struct UncertainFit {
    /// Best-fit parameters, in model parameter order.
    pub params: Vec<f64>,
    /// Standard error per parameter; `0.0` when it could not be estimated.
    pub errors: Vec<f64>,
    /// `false` where `errors[i]` is the `0.0` placeholder.
    pub error_estimated: Vec<bool>,
    /// The solver's covariance matrix, when requested.
    pub covariance: Option<DMatrix<f64>>,
    pub diagnostics: FitDiagnostics,
}

/// Fit `model` to `(x, y)` and derive 1-sigma parameter uncertainties.
///
/// Solver and input failures propagate unchanged. When `return_covariance`
/// is set, the raw covariance matrix is returned as well.
///
/// ```
/// use curvefit::fit::{CurveFitOptions, fit_with_uncertainty};
/// use curvefit::models::FnModel;
///
/// let line = FnModel::new(2, |x, p| p[0] * x + p[1]);
/// let fit = fit_with_uncertainty(
///     &line,
///     &[0.0, 1.0, 2.0, 3.0],
///     &[1.0, 3.0, 5.0, 7.0],
///     false,
///     &CurveFitOptions::default(),
/// )
/// .unwrap();
///
/// assert!((fit.params[0] - 2.0).abs() < 1e-6);
/// assert!((fit.params[1] - 1.0).abs() < 1e-6);
/// assert!(fit.errors.iter().all(|e| e.abs() < 1e-6));
/// assert!(fit.covariance.is_none());
/// ```
pub fn fit_with_uncertainty<M>(
    model: &M,
    x: &[f64],
    y: &[f64],
    return_covariance: bool,
    options: &CurveFitOptions,
) -> Result<UncertainFit, FitError>
where
    M: Model + ?Sized,
{
    let outcome = curve_fit(model, x, y, options)?;
    let (errors, error_estimated) = standard_errors(outcome.params.len(), &outcome.covariance);

    let unestimated = error_estimated.iter().filter(|ok| !**ok).count();
    if unestimated > 0 {
        tracing::debug!(unestimated, "some parameter uncertainties could not be estimated");
    }

    Ok(UncertainFit {
        params: outcome.params,
        errors,
        error_estimated,
        covariance: return_covariance.then_some(outcome.covariance),
        diagnostics: outcome.diagnostics,
    })
}

/// Standard errors `sqrt(pcov[i][i])` for `i in 0..n_params`.
///
/// Entries that are missing from `pcov` (wrong shape), negative, or not
/// finite yield `0.0` with a `false` flag.
pub fn standard_errors(n_params: usize, pcov: &DMatrix<f64>) -> (Vec<f64>, Vec<bool>) {
    (0..n_params)
        .map(|i| match pcov.get((i, i)) {
            Some(&var) if var.is_finite() && var >= 0.0 => (var.sqrt(), true),
            _ => (0.0, false),
        })
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelKind;

    #[test]
    fn errors_are_sqrt_of_positive_diagonal() {
        let pcov = DMatrix::from_row_slice(2, 2, &[4.0, 0.5, 0.5, 0.25]);
        let (errors, ok) = standard_errors(2, &pcov);
        assert_eq!(errors, vec![2.0, 0.5]);
        assert_eq!(ok, vec![true, true]);
    }

    #[test]
    fn invalid_variances_become_zero() {
        let pcov = DMatrix::from_row_slice(
            4,
            4,
            &[
                -1.0, 0.0, 0.0, 0.0, //
                0.0, f64::NAN, 0.0, 0.0, //
                0.0, 0.0, f64::INFINITY, 0.0, //
                0.0, 0.0, 0.0, 9.0,
            ],
        );
        let (errors, ok) = standard_errors(4, &pcov);
        assert_eq!(errors, vec![0.0, 0.0, 0.0, 3.0]);
        assert_eq!(ok, vec![false, false, false, true]);
    }

    #[test]
    fn missing_entries_become_zero() {
        let pcov = DMatrix::from_row_slice(1, 1, &[1.0]);
        let (errors, ok) = standard_errors(3, &pcov);
        assert_eq!(errors, vec![1.0, 0.0, 0.0]);
        assert_eq!(ok, vec![true, false, false]);
    }

    #[test]
    fn covariance_is_returned_only_on_request() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [1.2, 2.8, 5.1, 7.2, 8.9];
        let opts = CurveFitOptions::default();

        let without = fit_with_uncertainty(&ModelKind::Linear, &x, &y, false, &opts).unwrap();
        assert!(without.covariance.is_none());

        let with = fit_with_uncertainty(&ModelKind::Linear, &x, &y, true, &opts).unwrap();
        let pcov = with.covariance.as_ref().unwrap();
        assert_eq!(pcov.nrows(), 2);
        for i in 0..2 {
            assert!((with.errors[i] - pcov[(i, i)].sqrt()).abs() < 1e-15);
            assert!(with.error_estimated[i]);
        }
    }

    #[test]
    fn unestimable_covariance_yields_zero_errors() {
        // Two samples, two parameters: no residual degrees of freedom.
        let fit = fit_with_uncertainty(&ModelKind::Linear, &[0.0, 1.0], &[1.0, 3.0], true, &CurveFitOptions::default())
            .unwrap();
        assert_eq!(fit.errors, vec![0.0, 0.0]);
        assert_eq!(fit.error_estimated, vec![false, false]);
        assert!(fit.covariance.unwrap().iter().all(|v| v.is_infinite()));
    }
}
