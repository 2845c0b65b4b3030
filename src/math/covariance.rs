//! Parameter covariance from the Jacobian at the optimum.
//!
//! `pcov = (JᵀJ)⁺` computed through the thin SVD of `J = U S Vᵀ`, so
//! `pcov = V S⁻² Vᵀ` with singular values below
//! `eps · max(m, n) · s_max` treated as zero.

use nalgebra::{DMatrix, DVector};

/// Unscaled covariance `(JᵀJ)⁺` of the parameters.
///
/// Returns a NaN-filled matrix if the decomposition fails to produce finite
/// factors (e.g. the Jacobian itself contains NaN).
pub fn unscaled_covariance(jac: &DMatrix<f64>) -> DMatrix<f64> {
    let n = jac.ncols();
    if jac.iter().any(|v| !v.is_finite()) {
        return DMatrix::from_element(n, n, f64::NAN);
    }

    let svd = jac.clone().svd(false, true);
    let Some(v_t) = svd.v_t else {
        return DMatrix::from_element(n, n, f64::NAN);
    };
    let s = &svd.singular_values;

    let s_max = s.max();
    let threshold = f64::EPSILON * jac.nrows().max(n) as f64 * s_max;

    let inv_sq = DVector::from_iterator(
        s.len(),
        s.iter().map(|&v| if v > threshold { 1.0 / (v * v) } else { 0.0 }),
    );

    // Vᵀ has one row per singular value.
    let scaled = DMatrix::from_diagonal(&inv_sq) * &v_t;
    v_t.transpose() * scaled
}

/// Fill `pcov` with `+inf`, marking the covariance as not estimable.
pub fn fill_infinite(pcov: &mut DMatrix<f64>) {
    pcov.fill(f64::INFINITY);
}
