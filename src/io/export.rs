//! Export fit results and generated samples.
//!
//! CSV exports are meant to be easy to consume in spreadsheets or downstream
//! scripts; the JSON report is the machine-readable record of a fit.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{SamplePoint, SampleResidual};
use crate::error::AppError;
use crate::report::FitReport;

/// Write the fit report as pretty-printed JSON.
pub fn write_report_json(path: &Path, report: &FitReport) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create report JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, report)
        .map_err(|e| AppError::new(2, format!("Failed to write report JSON: {e}")))?;
    Ok(())
}

/// Write per-sample fitted values and residuals to a CSV file.
pub fn write_residuals_csv(path: &Path, residuals: &[SampleResidual]) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create residuals CSV '{}': {e}", path.display())))?;

    writeln!(file, "x,y,sigma,y_fit,residual")
        .map_err(|e| AppError::new(2, format!("Failed to write residuals CSV header: {e}")))?;

    for r in residuals {
        let p = &r.point;
        writeln!(
            file,
            "{},{},{},{},{}",
            p.x,
            p.y,
            p.sigma.map(|s| s.to_string()).unwrap_or_default(),
            r.y_fit,
            r.residual,
        )
        .map_err(|e| AppError::new(2, format!("Failed to write residuals CSV row: {e}")))?;
    }

    Ok(())
}

/// Write samples as `x,y,sigma` CSV (readable by `load_samples`).
pub fn write_samples_csv<W: Write>(mut out: W, points: &[SamplePoint]) -> Result<(), AppError> {
    let write_err = |e: std::io::Error| AppError::new(2, format!("Failed to write samples CSV: {e}"));

    let with_sigma = points.iter().all(|p| p.sigma.is_some());
    if with_sigma {
        writeln!(out, "x,y,sigma").map_err(write_err)?;
    } else {
        writeln!(out, "x,y").map_err(write_err)?;
    }

    for p in points {
        let row = match p.sigma {
            Some(s) if with_sigma => writeln!(out, "{},{},{}", p.x, p.y, s),
            _ => writeln!(out, "{},{}", p.x, p.y),
        };
        row.map_err(write_err)?;
    }

    out.flush().map_err(write_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::read_samples;

    #[test]
    fn samples_csv_reads_back() {
        let points = vec![
            SamplePoint { x: 0.0, y: 1.5, sigma: Some(0.1) },
            SamplePoint { x: 0.5, y: -2.25, sigma: Some(0.2) },
        ];
        let mut buf = Vec::new();
        write_samples_csv(&mut buf, &points).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("x,y,sigma\n"));

        let back = read_samples(buf.as_slice()).unwrap();
        assert_eq!(back.points, points);
    }

    #[test]
    fn samples_without_sigma_omit_the_column() {
        let points = vec![SamplePoint { x: 1.0, y: 2.0, sigma: None }];
        let mut buf = Vec::new();
        write_samples_csv(&mut buf, &points).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "x,y\n1,2\n");
    }
}
