//! CSV ingest of `(x, y[, sigma])` samples.
//!
//! Design goals:
//! - **Strict schema** for required columns (`x`, `y`; clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **No fitting logic here**

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::SamplePoint;
use crate::error::AppError;

/// Summary stats about the samples actually used for fitting.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleStats {
    pub n_points: usize,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: usable samples + stats + skipped rows.
#[derive(Debug, Clone)]
pub struct IngestedSamples {
    pub points: Vec<SamplePoint>,
    pub stats: SampleStats,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
    /// Whether the file had a `sigma` column.
    pub has_sigma: bool,
}

impl IngestedSamples {
    pub fn xs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    pub fn ys(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }

    /// Per-sample sigma, if every used row has one.
    pub fn sigmas(&self) -> Option<Vec<f64>> {
        if !self.has_sigma {
            return None;
        }
        self.points.iter().map(|p| p.sigma).collect()
    }
}

/// Load samples from a CSV file.
pub fn load_samples(path: &Path) -> Result<IngestedSamples, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_samples(file)
}

/// Load samples from any CSV reader (header row required).
pub fn read_samples<R: Read>(input: R) -> Result<IngestedSamples, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let x_col = require_column(&header_map, "x")?;
    let y_col = require_column(&header_map, "y")?;
    let sigma_col = header_map.get("sigma").copied();

    let mut points = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header, and lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, x_col, y_col, sigma_col) {
            Ok(point) => points.push(point),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    for err in &row_errors {
        tracing::warn!(line = err.line, "skipped row: {}", err.message);
    }

    let rows_used = points.len();
    let stats = compute_stats(&points)
        .ok_or_else(|| AppError::new(3, "No valid rows remain after validation."))?;

    Ok(IngestedSamples {
        points,
        stats,
        row_errors,
        rows_read,
        rows_used,
        has_sigma: sigma_col.is_some(),
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

fn require_column(header_map: &HashMap<String, usize>, name: &str) -> Result<usize, AppError> {
    header_map
        .get(name)
        .copied()
        .ok_or_else(|| AppError::new(2, format!("Missing required CSV column '{name}'.")))
}

fn parse_row(
    record: &StringRecord,
    x_col: usize,
    y_col: usize,
    sigma_col: Option<usize>,
) -> Result<SamplePoint, String> {
    let x = parse_finite(record, x_col, "x")?;
    let y = parse_finite(record, y_col, "y")?;
    let sigma = match sigma_col {
        Some(col) => {
            let s = parse_finite(record, col, "sigma")?;
            if s <= 0.0 {
                return Err(format!("sigma must be > 0, got {s}"));
            }
            Some(s)
        }
        None => None,
    };
    Ok(SamplePoint { x, y, sigma })
}

fn parse_finite(record: &StringRecord, col: usize, name: &str) -> Result<f64, String> {
    let raw = record
        .get(col)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("missing value for '{name}'"))?;
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("invalid number for '{name}': '{raw}'"))?;
    if !value.is_finite() {
        return Err(format!("non-finite value for '{name}': '{raw}'"));
    }
    Ok(value)
}

fn compute_stats(points: &[SamplePoint]) -> Option<SampleStats> {
    if points.is_empty() {
        return None;
    }
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;

    for p in points {
        x_min = x_min.min(p.x);
        x_max = x_max.max(p.x);
        y_min = y_min.min(p.y);
        y_max = y_max.max(p.y);
    }

    Some(SampleStats {
        n_points: points.len(),
        x_min,
        x_max,
        y_min,
        y_max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_samples_and_skips_bad_rows() {
        let csv = "\u{feff}X, y ,Sigma\n0,1,0.1\n1,3,0.1\nabc,5,0.1\n3,NaN,0.1\n4,9,0\n5,11,0.2\n";
        let data = read_samples(csv.as_bytes()).unwrap();

        assert_eq!(data.rows_read, 6);
        assert_eq!(data.rows_used, 3);
        assert_eq!(data.row_errors.len(), 3);
        assert_eq!(data.row_errors[0].line, 4);
        assert_eq!(data.xs(), vec![0.0, 1.0, 5.0]);
        assert_eq!(data.sigmas(), Some(vec![0.1, 0.1, 0.2]));
        assert_eq!(data.stats.y_max, 11.0);
    }

    #[test]
    fn sigma_column_is_optional() {
        let data = read_samples("x,y\n0,1\n1,2\n".as_bytes()).unwrap();
        assert_eq!(data.sigmas(), None);
        assert_eq!(data.ys(), vec![1.0, 2.0]);
    }

    #[test]
    fn missing_required_column_is_exit_code_2() {
        let err = read_samples("x,z\n0,1\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn no_usable_rows_is_exit_code_3() {
        let err = read_samples("x,y\nfoo,bar\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
