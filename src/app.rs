//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and installs logging
//! - resolves the run configuration (env defaults + flags)
//! - runs the fit pipeline or the sample generator
//! - prints the report and writes optional exports

use std::fs::File;
use std::io::BufWriter;

use clap::Parser;

use crate::cli::{Cli, Command, FitArgs, GenerateArgs};
use crate::domain::{FitConfig, SampleConfig};
use crate::error::AppError;
use crate::solver::{Bounds, LMConfig};

pub mod pipeline;

/// Entry point for the `curvefit` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    crate::logging::init(cli.verbose);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Generate(args) => handle_generate(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let solver = crate::config::solver_config_from_env()?;
    let config = fit_config_from_args(&args, solver)?;
    let run = pipeline::run_fit(&config)?;

    println!(
        "{}",
        crate::report::format_fit_summary(&run.ingest, &config, &run.fit, &run.quality)
    );

    // Optional exports.
    if let Some(path) = &config.export_json {
        let report = crate::report::FitReport::new(config.model, &run.fit, run.quality.clone());
        crate::io::write_report_json(path, &report)?;
        tracing::info!(path = %path.display(), "wrote report JSON");
    }
    if let Some(path) = &config.export_residuals {
        crate::io::write_residuals_csv(path, &run.residuals)?;
        tracing::info!(path = %path.display(), "wrote residuals CSV");
    }

    Ok(())
}

fn handle_generate(args: GenerateArgs) -> Result<(), AppError> {
    let config = sample_config_from_args(&args);
    let points = crate::data::generate_sample(&config)?;

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| AppError::new(2, format!("Failed to create CSV '{}': {e}", path.display())))?;
            crate::io::write_samples_csv(BufWriter::new(file), &points)?;
            tracing::info!(path = %path.display(), n = points.len(), "wrote samples CSV");
        }
        None => crate::io::write_samples_csv(std::io::stdout().lock(), &points)?,
    }

    Ok(())
}

/// Resolve a [`FitConfig`] from CLI flags on top of `solver` defaults.
pub fn fit_config_from_args(args: &FitArgs, solver: LMConfig) -> Result<FitConfig, AppError> {
    let mut solver = solver;
    if let Some(v) = args.ftol {
        solver.ftol = v;
    }
    if let Some(v) = args.xtol {
        solver.xtol = v;
    }
    if let Some(v) = args.gtol {
        solver.gtol = v;
    }
    if args.max_evaluations.is_some() {
        solver.max_evaluations = args.max_evaluations;
    }

    Ok(FitConfig {
        input: args.input.clone(),
        model: args.model,
        initial_guess: args.p0.clone(),
        bounds: bounds_from_args(args.lower.as_deref(), args.upper.as_deref())?,
        absolute_sigma: args.absolute_sigma,
        return_covariance: args.covariance,
        restarts: args.restarts,
        seed: args.seed,
        solver,
        export_json: args.export_json.clone(),
        export_residuals: args.export_residuals.clone(),
    })
}

/// Build bounds from optional `--lower` / `--upper` lists.
///
/// A missing side is unbounded with the length of the given side.
fn bounds_from_args(lower: Option<&[f64]>, upper: Option<&[f64]>) -> Result<Option<Bounds>, AppError> {
    let (lower, upper) = match (lower, upper) {
        (None, None) => return Ok(None),
        (Some(lo), None) => (lo.to_vec(), vec![f64::INFINITY; lo.len()]),
        (None, Some(hi)) => (vec![f64::NEG_INFINITY; hi.len()], hi.to_vec()),
        (Some(lo), Some(hi)) => (lo.to_vec(), hi.to_vec()),
    };
    Ok(Some(Bounds::new(lower, upper)?))
}

pub fn sample_config_from_args(args: &GenerateArgs) -> SampleConfig {
    SampleConfig {
        model: args.model,
        params: args.params.clone(),
        n: args.n,
        x_min: args.x_min,
        x_max: args.x_max,
        noise: args.noise,
        seed: args.seed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fit_args(extra: &[&str]) -> FitArgs {
        let mut argv = vec!["curvefit", "fit", "--input", "d.csv", "--model", "linear"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Command::Fit(args) => args,
            Command::Generate(_) => panic!("expected fit"),
        }
    }

    #[test]
    fn flags_override_solver_defaults() {
        let env = LMConfig {
            ftol: 1e-4,
            xtol: 1e-4,
            ..LMConfig::default()
        };
        let config = fit_config_from_args(&fit_args(&["--ftol", "1e-12", "--max-evaluations", "99"]), env).unwrap();
        assert_eq!(config.solver.ftol, 1e-12);
        assert_eq!(config.solver.xtol, 1e-4);
        assert_eq!(config.solver.max_evaluations, Some(99));
        assert!(config.bounds.is_none());
    }

    #[test]
    fn one_sided_bounds_are_completed() {
        let config = fit_args(&["--lower", "0,0"]);
        let config = fit_config_from_args(&config, LMConfig::default()).unwrap();
        let bounds = config.bounds.unwrap();
        assert_eq!(bounds.lower, vec![0.0, 0.0]);
        assert_eq!(bounds.upper, vec![f64::INFINITY, f64::INFINITY]);
    }

    #[test]
    fn inverted_bounds_are_exit_code_2() {
        let args = fit_args(&["--lower", "1,1", "--upper", "0,2"]);
        let err = fit_config_from_args(&args, LMConfig::default()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
