//! Nonlinear least-squares solver.
//!
//! The curve-fitting layer treats this module as an external collaborator:
//! it hands over a residual closure and a starting point and gets back the
//! optimum or a classified [`SolverError`](crate::error::SolverError).

pub mod config;
pub mod levenberg_marquardt;

pub use config::*;
pub use levenberg_marquardt::*;
