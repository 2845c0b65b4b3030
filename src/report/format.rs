//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized

use crate::domain::{FitConfig, FitQuality};
use crate::fit::UncertainFit;
use crate::io::IngestedSamples;

/// Format the full run summary (dataset stats + parameters + fit diagnostics).
pub fn format_fit_summary(
    ingest: &IngestedSamples,
    config: &FitConfig,
    fit: &UncertainFit,
    quality: &FitQuality,
) -> String {
    let mut out = String::new();

    out.push_str("=== curvefit ===\n");
    out.push_str(&format!(
        "Model: {} | {}\n",
        config.model.display_name(),
        config.model.formula()
    ));
    out.push_str(&format!(
        "Samples: n={} (rows read {}, skipped {}) | x=[{:.4}, {:.4}] | y=[{:.4}, {:.4}]\n",
        ingest.stats.n_points,
        ingest.rows_read,
        ingest.row_errors.len(),
        ingest.stats.x_min,
        ingest.stats.x_max,
        ingest.stats.y_min,
        ingest.stats.y_max,
    ));
    let sigma_mode = match (ingest.has_sigma, config.absolute_sigma) {
        (false, _) => "unweighted",
        (true, false) => "relative sigma",
        (true, true) => "absolute sigma",
    };
    out.push_str(&format!("Weights: {sigma_mode}\n"));
    if config.restarts > 0 {
        out.push_str(&format!("Starts: {} (seed {})\n", config.restarts + 1, config.seed));
    }

    out.push_str("\nParameters:\n");
    let names = config.model.param_names();
    for (i, value) in fit.params.iter().enumerate() {
        let name = names.get(i).copied().unwrap_or("?");
        let error = if fit.error_estimated.get(i).copied().unwrap_or(false) {
            format!("{:.6e}", fit.errors[i])
        } else {
            "n/a".to_string()
        };
        out.push_str(&format!("  {name:<6} = {value:>14.6e} ± {error}\n"));
    }

    out.push_str("\nQuality:\n");
    out.push_str(&format!(
        "  SSE={:.6e} RMSE={:.6e} dof={}",
        quality.sse, quality.rmse, quality.dof
    ));
    match quality.reduced_chi2 {
        Some(chi2) => out.push_str(&format!(" reduced_chi2={chi2:.4}\n")),
        None => out.push('\n'),
    }

    let d = &fit.diagnostics;
    out.push_str(&format!(
        "Solver: {} after {} iterations, {} evaluations\n",
        d.termination.describe(),
        d.iterations,
        d.evaluations
    ));
    if !d.covariance_estimated {
        out.push_str("Warning: covariance of the parameters could not be estimated\n");
    }

    if let Some(pcov) = &fit.covariance {
        out.push_str("\nCovariance:\n");
        for row in pcov.row_iter() {
            let cells: Vec<String> = row.iter().map(|v| format!("{v:>14.6e}")).collect();
            out.push_str(&format!("  {}\n", cells.join(" ")));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelKind;
    use crate::fit::FitDiagnostics;
    use crate::io::read_samples;
    use crate::solver::{LMConfig, Termination};
    use nalgebra::DMatrix;
    use std::path::PathBuf;

    fn config() -> FitConfig {
        FitConfig {
            input: PathBuf::from("data.csv"),
            model: ModelKind::Linear,
            initial_guess: None,
            bounds: None,
            absolute_sigma: false,
            return_covariance: true,
            restarts: 0,
            seed: 0,
            solver: LMConfig::default(),
            export_json: None,
            export_residuals: None,
        }
    }

    fn fit() -> UncertainFit {
        UncertainFit {
            params: vec![2.0, 1.0],
            errors: vec![0.05, 0.0],
            error_estimated: vec![true, false],
            covariance: Some(DMatrix::from_row_slice(2, 2, &[0.0025, -0.001, -0.001, -0.5])),
            diagnostics: FitDiagnostics {
                cost: 0.1,
                iterations: 3,
                evaluations: 12,
                termination: Termination::CostTolerance,
                dof: 2,
                covariance_estimated: true,
            },
        }
    }

    #[test]
    fn summary_shows_errors_and_na() {
        let ingest = read_samples("x,y\n0,1\n1,3\n2,5\n3,7\n".as_bytes()).unwrap();
        let quality = FitQuality {
            n: 4,
            dof: 2,
            sse: 0.1,
            rmse: 0.158,
            reduced_chi2: Some(0.05),
        };
        let text = format_fit_summary(&ingest, &config(), &fit(), &quality);

        assert!(text.contains("Model: linear"));
        assert!(text.contains("Weights: unweighted"));
        assert!(text.contains("2.000000e0 ± 5.000000e-2"));
        assert!(text.contains("1.000000e0 ± n/a"));
        assert!(text.contains("relative cost reduction below ftol"));
        assert!(text.contains("Covariance:"));
    }
}
