//! Levenberg–Marquardt minimizer for `min Σ r_i(p)²`.
//!
//! Each outer iteration:
//!
//! 1. builds the forward-difference Jacobian `J` at the current point
//! 2. solves `(JᵀJ + λ D) Δ = -Jᵀr` with `D = diag(JᵀJ)` (Marquardt scaling)
//! 3. projects `p + Δ` onto the bounds and accepts it if the cost drops,
//!    otherwise raises λ and retries
//!
//! The residual closure is the only problem-specific input, which keeps the
//! solver independent of models and data layout.

use std::cell::Cell;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use super::config::{Bounds, LMConfig};
use crate::error::SolverError;
use crate::math::{forward_difference, solve_least_squares};

const LAMBDA_MIN: f64 = 1e-15;
const LAMBDA_MAX: f64 = 1e16;
const DIAG_FLOOR: f64 = 1e-12;

/// Why a successful minimization stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Residuals are exactly zero.
    ExactFit,
    /// Gradient infinity norm fell below `gtol`.
    Gradient,
    /// Relative cost reduction fell below `ftol`.
    CostTolerance,
    /// Relative step size fell below `xtol`.
    StepTolerance,
    /// Damping saturated without finding a lower cost.
    Stalled,
}

impl Termination {
    pub fn describe(self) -> &'static str {
        match self {
            Termination::ExactFit => "residuals are exactly zero",
            Termination::Gradient => "gradient below gtol",
            Termination::CostTolerance => "relative cost reduction below ftol",
            Termination::StepTolerance => "relative step size below xtol",
            Termination::Stalled => "no further decrease possible",
        }
    }
}

/// Output of a successful minimization.
#[derive(Debug, Clone)]
pub struct LMResult {
    pub params: DVector<f64>,
    pub residuals: DVector<f64>,
    /// Sum of squared residuals at `params`.
    pub cost: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub termination: Termination,
}

#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    config: LMConfig,
}

impl LevenbergMarquardt {
    pub fn new(config: LMConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LMConfig {
        &self.config
    }

    /// Minimize the squared norm of `residuals` starting from `x0`.
    ///
    /// `x0` must lie inside `bounds` when bounds are given.
    pub fn minimize<R>(
        &self,
        mut residuals: R,
        x0: DVector<f64>,
        bounds: Option<&Bounds>,
    ) -> Result<LMResult, SolverError>
    where
        R: FnMut(&DVector<f64>) -> DVector<f64>,
    {
        let cfg = &self.config;
        let n = x0.len();

        if let Some(b) = bounds {
            if let Some(index) = (0..n).find(|&i| !b.contains(i, x0[i])) {
                return Err(SolverError::InfeasibleStart { index });
            }
        }

        let budget = cfg.evaluation_budget(n);
        let evaluations = Cell::new(0usize);
        let mut eval = |p: &DVector<f64>| {
            evaluations.set(evaluations.get() + 1);
            residuals(p)
        };

        let mut params = x0;
        let mut r = eval(&params);
        if r.iter().any(|v| !v.is_finite()) {
            return Err(SolverError::NonFiniteResiduals);
        }
        let mut cost = r.norm_squared();
        let mut lambda = cfg.initial_damping;

        for iteration in 0..cfg.max_iterations {
            if cost == 0.0 {
                return Ok(finish(params, r, cost, iteration, evaluations.get(), Termination::ExactFit));
            }
            if evaluations.get() + n > budget {
                return Err(SolverError::MaxEvaluations {
                    evaluations: evaluations.get(),
                });
            }

            let jac = forward_difference(&mut eval, &params, &r, bounds);
            if jac.iter().any(|v| !v.is_finite()) {
                return Err(SolverError::NonFiniteJacobian { iteration });
            }
            let gradient = jac.transpose() * &r;
            let grad_inf = gradient.iter().fold(0.0_f64, |m, g| m.max(g.abs()));
            if grad_inf <= cfg.gtol {
                return Ok(finish(params, r, cost, iteration + 1, evaluations.get(), Termination::Gradient));
            }

            let jtj = jac.transpose() * &jac;
            let scale: Vec<f64> = jtj.diagonal().iter().map(|d| d.max(DIAG_FLOOR)).collect();
            let rhs = -gradient;

            loop {
                if evaluations.get() >= budget {
                    return Err(SolverError::MaxEvaluations {
                        evaluations: evaluations.get(),
                    });
                }

                let mut damped = jtj.clone();
                for (i, s) in scale.iter().enumerate() {
                    damped[(i, i)] += lambda * s;
                }

                let step = match damped.clone().cholesky() {
                    Some(chol) => Some(chol.solve(&rhs)),
                    None => solve_least_squares(&damped, &rhs),
                };

                if let Some(step) = step {
                    let mut trial = &params + &step;
                    if let Some(b) = bounds {
                        for i in 0..n {
                            trial[i] = b.clamp(i, trial[i]);
                        }
                    }
                    let step_norm = (&trial - &params).norm();
                    let param_norm = params.norm();

                    let r_trial = eval(&trial);
                    let cost_trial = r_trial.norm_squared();

                    if cost_trial.is_finite() && cost_trial < cost {
                        let reduction = cost - cost_trial;
                        let previous = cost;
                        params = trial;
                        r = r_trial;
                        cost = cost_trial;
                        lambda = (lambda / cfg.damping_decrease).max(LAMBDA_MIN);

                        tracing::debug!(iteration, cost, lambda, step_norm, "accepted step");

                        if reduction <= cfg.ftol * previous {
                            return Ok(finish(
                                params,
                                r,
                                cost,
                                iteration + 1,
                                evaluations.get(),
                                Termination::CostTolerance,
                            ));
                        }
                        if step_norm <= cfg.xtol * (cfg.xtol + param_norm) {
                            return Ok(finish(
                                params,
                                r,
                                cost,
                                iteration + 1,
                                evaluations.get(),
                                Termination::StepTolerance,
                            ));
                        }
                        break;
                    }

                    tracing::trace!(iteration, cost_trial, lambda, "rejected step");
                }

                lambda *= cfg.damping_increase;
                if lambda > LAMBDA_MAX {
                    return Ok(finish(params, r, cost, iteration + 1, evaluations.get(), Termination::Stalled));
                }
            }
        }

        Err(SolverError::DidNotConverge {
            iterations: cfg.max_iterations,
        })
    }
}

fn finish(
    params: DVector<f64>,
    residuals: DVector<f64>,
    cost: f64,
    iterations: usize,
    evaluations: usize,
    termination: Termination,
) -> LMResult {
    tracing::debug!(iterations, evaluations, cost, ?termination, "minimization finished");
    LMResult {
        params,
        residuals,
        cost,
        iterations,
        evaluations,
        termination,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimizes_shifted_quadratic() {
        // r = [p0 - 2, p1 - 3]
        let solver = LevenbergMarquardt::default();
        let result = solver
            .minimize(
                |p: &DVector<f64>| DVector::from_row_slice(&[p[0] - 2.0, p[1] - 3.0]),
                DVector::from_row_slice(&[0.0, 0.0]),
                None,
            )
            .unwrap();

        assert!((result.params[0] - 2.0).abs() < 1e-6);
        assert!((result.params[1] - 3.0).abs() < 1e-6);
        assert!(result.cost < 1e-12);
    }

    #[test]
    fn solves_rosenbrock() {
        // r = [10 (p1 - p0²), 1 - p0], minimum at (1, 1).
        let solver = LevenbergMarquardt::new(LMConfig {
            max_iterations: 500,
            max_evaluations: Some(5000),
            ..LMConfig::default()
        });
        let result = solver
            .minimize(
                |p: &DVector<f64>| DVector::from_row_slice(&[10.0 * (p[1] - p[0] * p[0]), 1.0 - p[0]]),
                DVector::from_row_slice(&[-1.2, 1.0]),
                None,
            )
            .unwrap();

        assert!((result.params[0] - 1.0).abs() < 1e-4);
        assert!((result.params[1] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn respects_bounds() {
        // Unconstrained minimum at 5, upper bound at 3.
        let solver = LevenbergMarquardt::default();
        let bounds = Bounds::new(vec![0.0], vec![3.0]).unwrap();
        let result = solver
            .minimize(
                |p: &DVector<f64>| DVector::from_row_slice(&[p[0] - 5.0]),
                DVector::from_row_slice(&[1.0]),
                Some(&bounds),
            )
            .unwrap();

        assert!(result.params[0] <= 3.0);
        assert!((result.params[0] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_infeasible_start() {
        let solver = LevenbergMarquardt::default();
        let bounds = Bounds::new(vec![0.0], vec![1.0]).unwrap();
        let err = solver
            .minimize(
                |p: &DVector<f64>| DVector::from_row_slice(&[p[0]]),
                DVector::from_row_slice(&[2.0]),
                Some(&bounds),
            )
            .unwrap_err();
        assert_eq!(err, SolverError::InfeasibleStart { index: 0 });
    }

    #[test]
    fn non_finite_start_is_reported() {
        let solver = LevenbergMarquardt::default();
        let err = solver
            .minimize(
                |p: &DVector<f64>| DVector::from_row_slice(&[p[0].ln()]),
                DVector::from_row_slice(&[-1.0]),
                None,
            )
            .unwrap_err();
        assert_eq!(err, SolverError::NonFiniteResiduals);
    }

    #[test]
    fn nan_jacobian_is_an_error_not_convergence() {
        // (-x)^p is finite at p = 1 but NaN one finite-difference step away.
        let xs = [-1.0_f64, -2.0, -3.0];
        let ys = [1.0, 4.0, 9.0];
        let solver = LevenbergMarquardt::default();
        let err = solver
            .minimize(
                |p: &DVector<f64>| DVector::from_iterator(3, xs.iter().zip(ys.iter()).map(|(x, y)| x.powf(p[0]) - y)),
                DVector::from_row_slice(&[1.0]),
                None,
            )
            .unwrap_err();
        assert_eq!(err, SolverError::NonFiniteJacobian { iteration: 0 });
    }

    #[test]
    fn evaluation_budget_is_enforced() {
        let solver = LevenbergMarquardt::new(LMConfig {
            max_evaluations: Some(3),
            ..LMConfig::default()
        });
        let err = solver
            .minimize(
                |p: &DVector<f64>| DVector::from_row_slice(&[10.0 * (p[1] - p[0] * p[0]), 1.0 - p[0]]),
                DVector::from_row_slice(&[-1.2, 1.0]),
                None,
            )
            .unwrap_err();
        assert!(matches!(err, SolverError::MaxEvaluations { .. }));
    }
}
