//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - result exports (JSON report, residual CSV, sample CSV) (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
