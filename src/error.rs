//! Error types.
//!
//! Library code returns [`FitError`] / [`SolverError`] so callers can tell
//! "the data was unusable" apart from "the solver gave up". The binary wraps
//! everything in [`AppError`], which carries a process exit code.

use thiserror::Error;

/// Failure of the least-squares solver itself.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("initial guess is outside the parameter bounds (parameter {index})")]
    InfeasibleStart { index: usize },

    #[error("residuals are not finite at the initial point")]
    NonFiniteResiduals,

    #[error("Jacobian is not finite at iteration {iteration}; the model is undefined near the current parameters")]
    NonFiniteJacobian { iteration: usize },

    #[error("optimal parameters not found: number of function evaluations reached {evaluations}")]
    MaxEvaluations { evaluations: usize },

    #[error("optimal parameters not found: no convergence after {iterations} iterations")]
    DidNotConverge { iterations: usize },
}

/// Failure of a curve fit: invalid input, or a propagated solver failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("x and y must have the same length (x: {x}, y: {y})")]
    LengthMismatch { x: usize, y: usize },

    #[error("y must not be empty")]
    EmptyData,

    #[error("model has no parameters to fit")]
    NoParameters,

    #[error("improper input: {params} parameters must not exceed {samples} samples")]
    TooFewSamples { samples: usize, params: usize },

    #[error("initial guess has {got} values, model expects {expected}")]
    InitialGuessLength { expected: usize, got: usize },

    #[error("initial guess for parameter {index} is outside its bounds")]
    InitialGuessOutOfBounds { index: usize },

    #[error("sigma has {got} values, expected one per sample ({expected})")]
    SigmaLength { expected: usize, got: usize },

    #[error("sigma must be finite and > 0 (sample {index})")]
    InvalidSigma { index: usize },

    #[error("x and y must not contain NaN or infinite values")]
    NonFiniteInput,

    #[error("invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("no starting points were supplied")]
    NoStarts,

    #[error(transparent)]
    Solver(#[from] SolverError),
}

impl FitError {
    /// Whether the error came from the solver (as opposed to input validation).
    pub fn is_solver_failure(&self) -> bool {
        matches!(self, FitError::Solver(_))
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        let code = if err.is_solver_failure() { 4 } else { 2 };
        AppError::new(code, format!("Fit failed: {err}"))
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solver_failures_map_to_exit_code_4() {
        let err: AppError = FitError::from(SolverError::DidNotConverge { iterations: 10 }).into();
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().contains("10 iterations"));
    }

    #[test]
    fn validation_failures_map_to_exit_code_2() {
        let err: AppError = FitError::LengthMismatch { x: 4, y: 3 }.into();
        assert_eq!(err.exit_code(), 2);

        let err: AppError = FitError::InitialGuessOutOfBounds { index: 0 }.into();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn non_finite_jacobian_maps_to_exit_code_4() {
        let err: AppError = FitError::from(SolverError::NonFiniteJacobian { iteration: 0 }).into();
        assert_eq!(err.exit_code(), 4);
    }
}
