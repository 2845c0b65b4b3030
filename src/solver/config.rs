//! Solver configuration and parameter bounds.

use serde::{Deserialize, Serialize};

use crate::error::FitError;

/// Levenberg–Marquardt settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LMConfig {
    /// Relative reduction in the cost below which the fit is considered converged.
    pub ftol: f64,
    /// Relative step size below which the fit is considered converged.
    pub xtol: f64,
    /// Infinity norm of the gradient below which the fit is considered converged.
    pub gtol: f64,
    /// Maximum number of outer (Jacobian) iterations.
    pub max_iterations: usize,
    /// Maximum number of residual evaluations, Jacobian columns included.
    ///
    /// `None` means `200 * (n_params + 1)`.
    pub max_evaluations: Option<usize>,
    /// Starting value of the damping parameter λ.
    pub initial_damping: f64,
    /// Factor applied to λ after a rejected step.
    pub damping_increase: f64,
    /// Divisor applied to λ after an accepted step.
    pub damping_decrease: f64,
}

impl Default for LMConfig {
    fn default() -> Self {
        Self {
            ftol: 1e-8,
            xtol: 1e-8,
            gtol: 1e-10,
            max_iterations: 200,
            max_evaluations: None,
            initial_damping: 1e-3,
            damping_increase: 10.0,
            damping_decrease: 10.0,
        }
    }
}

impl LMConfig {
    /// Evaluation budget for a problem with `n_params` parameters.
    pub fn evaluation_budget(&self, n_params: usize) -> usize {
        self.max_evaluations.unwrap_or(200 * (n_params + 1))
    }
}

/// Box constraints `lower[i] <= p[i] <= upper[i]`.
///
/// Either side may be infinite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Bounds {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self, FitError> {
        let bounds = Self { lower, upper };
        bounds.check()?;
        Ok(bounds)
    }

    /// Check that both sides have the same length and `lower[i] < upper[i]`.
    ///
    /// The fields are public, so a `Bounds` built by hand is re-checked here
    /// before any fit uses it.
    pub fn check(&self) -> Result<(), FitError> {
        if self.lower.len() != self.upper.len() {
            return Err(FitError::InvalidBounds(format!(
                "lower has {} values, upper has {}",
                self.lower.len(),
                self.upper.len()
            )));
        }
        for (i, (lo, hi)) in self.lower.iter().zip(self.upper.iter()).enumerate() {
            if lo.is_nan() || hi.is_nan() || lo >= hi {
                return Err(FitError::InvalidBounds(format!(
                    "parameter {i}: lower ({lo}) must be strictly less than upper ({hi})"
                )));
            }
        }
        Ok(())
    }

    /// Unbounded in every direction.
    pub fn unbounded(n: usize) -> Self {
        Self {
            lower: vec![f64::NEG_INFINITY; n],
            upper: vec![f64::INFINITY; n],
        }
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    pub fn contains(&self, index: usize, value: f64) -> bool {
        value >= self.lower[index] && value <= self.upper[index]
    }

    /// Clamp `value` into the bounds of parameter `index`.
    pub fn clamp(&self, index: usize, value: f64) -> f64 {
        value.max(self.lower[index]).min(self.upper[index])
    }

    /// A feasible default starting value for parameter `index`.
    ///
    /// Midpoint when both bounds are finite, one unit inside a single finite
    /// bound, and `1.0` when unbounded.
    pub fn feasible_start(&self, index: usize) -> f64 {
        let lo = self.lower[index];
        let hi = self.upper[index];
        match (lo.is_finite(), hi.is_finite()) {
            (true, true) => 0.5 * (lo + hi),
            (true, false) => lo + 1.0,
            (false, true) => hi - 1.0,
            (false, false) => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_reject_inverted_interval() {
        let err = Bounds::new(vec![1.0], vec![0.0]).unwrap_err();
        assert!(matches!(err, FitError::InvalidBounds(_)));
    }

    #[test]
    fn bounds_reject_length_mismatch() {
        assert!(Bounds::new(vec![0.0, 0.0], vec![1.0]).is_err());
    }

    #[test]
    fn check_catches_hand_built_bounds() {
        let short_upper = Bounds {
            lower: vec![0.0, 0.0],
            upper: vec![5.0],
        };
        assert!(matches!(short_upper.check(), Err(FitError::InvalidBounds(_))));

        let inverted = Bounds {
            lower: vec![1.0, 0.0],
            upper: vec![0.0, 5.0],
        };
        assert!(matches!(inverted.check(), Err(FitError::InvalidBounds(_))));
        assert!(Bounds::unbounded(3).check().is_ok());
    }

    #[test]
    fn feasible_start_cases() {
        let b = Bounds::new(
            vec![0.0, 2.0, f64::NEG_INFINITY, f64::NEG_INFINITY],
            vec![4.0, f64::INFINITY, -3.0, f64::INFINITY],
        )
        .unwrap();
        assert_eq!(b.feasible_start(0), 2.0);
        assert_eq!(b.feasible_start(1), 3.0);
        assert_eq!(b.feasible_start(2), -4.0);
        assert_eq!(b.feasible_start(3), 1.0);
    }

    #[test]
    fn default_evaluation_budget_scales_with_parameters() {
        let cfg = LMConfig::default();
        assert_eq!(cfg.evaluation_budget(2), 600);
        let cfg = LMConfig {
            max_evaluations: Some(7),
            ..LMConfig::default()
        };
        assert_eq!(cfg.evaluation_budget(2), 7);
    }
}
