//! Numerical building blocks: linear least squares, finite-difference
//! Jacobians, and covariance estimation.

pub mod covariance;
pub mod jacobian;
pub mod ols;

pub use covariance::*;
pub use jacobian::*;
pub use ols::*;
