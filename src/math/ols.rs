//! Linear least squares via SVD.
//!
//! Two callers need a plain `min ‖X β - y‖²` solve:
//!
//! - the built-in models' initial guesses (polynomial and log–log regressions)
//! - the Levenberg–Marquardt step, when the damped normal equations are not
//!   positive definite enough for Cholesky
//!
//! SVD handles tall and rank-deficient systems where `QR::solve` would not.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if the strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Fit a polynomial of the given degree; coefficients are highest power first.
pub fn polyfit(x: &[f64], y: &[f64], degree: usize) -> Option<Vec<f64>> {
    let n = x.len().min(y.len());
    if n <= degree {
        return None;
    }
    let cols = degree + 1;
    let design = DMatrix::from_fn(n, cols, |i, j| x[i].powi((degree - j) as i32));
    let target = DVector::from_row_slice(&y[..n]);
    solve_least_squares(&design, &target).map(|beta| beta.iter().copied().collect())
}
