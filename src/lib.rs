//! `curvefit` library crate.
//!
//! Nonlinear least-squares curve fitting that reports each parameter's
//! standard error next to its best-fit value.
//!
//! The binary (`curvefit`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the fitting API (`fit::fit_with_uncertainty`) is usable on its own

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod logging;
pub mod math;
pub mod models;
pub mod report;
pub mod solver;
