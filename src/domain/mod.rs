//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - built-in model kinds (`ModelKind`)
//! - sample observations and residuals (`SamplePoint`, `SampleResidual`)
//! - fit diagnostics (`FitQuality`)
//! - resolved run configuration (`FitConfig`, `SampleConfig`)

pub mod types;

pub use types::*;
