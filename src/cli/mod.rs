//! Command-line parsing for the curve fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::domain::ModelKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "curvefit", version, about = "Nonlinear curve fitting with parameter uncertainties")]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a model to `x,y[,sigma]` samples from a CSV file.
    Fit(FitArgs),
    /// Generate noisy samples from a model and write them as CSV.
    Generate(GenerateArgs),
}

/// Options for fitting.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Input CSV with columns `x`, `y` and optionally `sigma`.
    #[arg(short, long, value_name = "CSV")]
    pub input: PathBuf,

    /// Model to fit.
    #[arg(short, long, value_enum)]
    pub model: ModelKind,

    /// Initial guess, comma separated (default: data-driven guess).
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub p0: Option<Vec<f64>>,

    /// Lower parameter bounds, comma separated (`-inf` allowed).
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub lower: Option<Vec<f64>>,

    /// Upper parameter bounds, comma separated (`inf` allowed).
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub upper: Option<Vec<f64>>,

    /// Treat `sigma` as absolute errors (no rescaling of the covariance).
    #[arg(long)]
    pub absolute_sigma: bool,

    /// Print (and export) the full covariance matrix.
    #[arg(long)]
    pub covariance: bool,

    /// Extra randomized starting points tried in parallel.
    #[arg(long, default_value_t = 0)]
    pub restarts: usize,

    /// Seed for randomized starting points.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Maximum number of model evaluations (default: 200 * (params + 1)).
    #[arg(long)]
    pub max_evaluations: Option<usize>,

    /// Relative cost tolerance.
    #[arg(long)]
    pub ftol: Option<f64>,

    /// Relative step tolerance.
    #[arg(long)]
    pub xtol: Option<f64>,

    /// Gradient tolerance.
    #[arg(long)]
    pub gtol: Option<f64>,

    /// Export the fit report to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,

    /// Export per-sample fitted values and residuals to CSV.
    #[arg(long = "export-residuals", value_name = "CSV")]
    pub export_residuals: Option<PathBuf>,
}

/// Options for sample generation.
#[derive(Debug, Parser, Clone)]
pub struct GenerateArgs {
    /// Model to sample from.
    #[arg(short, long, value_enum)]
    pub model: ModelKind,

    /// True model parameters, comma separated.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
    pub params: Vec<f64>,

    /// Number of samples.
    #[arg(short = 'n', long, default_value_t = 50)]
    pub n: usize,

    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub x_min: f64,

    #[arg(long, default_value_t = 10.0, allow_negative_numbers = true)]
    pub x_max: f64,

    /// Standard deviation of the Gaussian noise added to `y`.
    #[arg(long, default_value_t = 0.1)]
    pub noise: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Output CSV (default: stdout).
    #[arg(short, long, value_name = "CSV")]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fit_with_lists_and_verbosity() {
        let cli = Cli::parse_from([
            "curvefit", "-vv", "fit", "--input", "d.csv", "--model", "gaussian", "--p0", "1,-2.5,0.5",
            "--lower", "0,-inf,0", "--covariance",
        ]);
        assert_eq!(cli.verbose, 2);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.model, ModelKind::Gaussian);
        assert_eq!(args.p0, Some(vec![1.0, -2.5, 0.5]));
        assert_eq!(args.lower, Some(vec![0.0, f64::NEG_INFINITY, 0.0]));
        assert!(args.covariance);
        assert_eq!(args.restarts, 0);
    }

    #[test]
    fn parses_generate() {
        let cli = Cli::parse_from([
            "curvefit", "generate", "--model", "linear", "--params", "2,1", "-n", "5", "--x-min", "-1",
        ]);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.params, vec![2.0, 1.0]);
        assert_eq!(args.n, 5);
        assert_eq!(args.x_min, -1.0);
        assert!(args.output.is_none());
    }
}
