//! Curve fitting.
//!
//! Responsibilities:
//!
//! - validate samples and run the nonlinear least-squares fit (`curve_fit`)
//! - turn the covariance matrix into per-parameter standard errors (`uncertainty`)
//! - try several starting points in parallel and keep the best (`multistart`)

pub mod curve_fit;
pub mod multistart;
pub mod uncertainty;

pub use curve_fit::*;
pub use multistart::*;
pub use uncertainty::*;
