//! Forward-difference Jacobian of a residual vector.

use nalgebra::{DMatrix, DVector};

use crate::solver::Bounds;

/// Relative step used for finite differences (`sqrt(f64::EPSILON)`).
pub const FD_REL_STEP: f64 = 1.490_116_119_384_765_6e-8;

/// Approximate `J[i, j] = ∂r_i / ∂p_j` by forward differences.
///
/// `r0` must be `residuals(params)`. When the forward step would leave the
/// upper bound, the backward step is used instead. Each column costs one
/// residual evaluation.
pub fn forward_difference<R>(
    residuals: &mut R,
    params: &DVector<f64>,
    r0: &DVector<f64>,
    bounds: Option<&Bounds>,
) -> DMatrix<f64>
where
    R: FnMut(&DVector<f64>) -> DVector<f64>,
{
    let m = r0.len();
    let n = params.len();
    let mut jac = DMatrix::<f64>::zeros(m, n);
    let mut probe = params.clone();

    for j in 0..n {
        let p = params[j];
        let mut h = FD_REL_STEP * p.abs().max(1.0);
        if let Some(b) = bounds {
            if p + h > b.upper[j] {
                h = -h;
            }
        }

        probe[j] = p + h;
        let r = residuals(&probe);
        probe[j] = p;

        for i in 0..m {
            jac[(i, j)] = (r[i] - r0[i]) / h;
        }
    }

    jac
}
