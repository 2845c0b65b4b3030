//! Solver defaults from the environment.
//!
//! Recognised variables (a `.env` file is honoured):
//! - `CURVEFIT_FTOL`, `CURVEFIT_XTOL`, `CURVEFIT_GTOL`
//! - `CURVEFIT_MAX_ITERATIONS`, `CURVEFIT_MAX_EVALUATIONS`
//!
//! CLI flags override anything set here.

use std::str::FromStr;

use crate::error::AppError;
use crate::solver::LMConfig;

pub const ENV_FTOL: &str = "CURVEFIT_FTOL";
pub const ENV_XTOL: &str = "CURVEFIT_XTOL";
pub const ENV_GTOL: &str = "CURVEFIT_GTOL";
pub const ENV_MAX_ITERATIONS: &str = "CURVEFIT_MAX_ITERATIONS";
pub const ENV_MAX_EVALUATIONS: &str = "CURVEFIT_MAX_EVALUATIONS";

/// Solver config from the process environment (after loading `.env`).
pub fn solver_config_from_env() -> Result<LMConfig, AppError> {
    dotenvy::dotenv().ok();
    solver_config_from_lookup(|key| std::env::var(key).ok())
}

/// Solver config from an arbitrary key lookup, starting from the defaults.
pub fn solver_config_from_lookup<F>(lookup: F) -> Result<LMConfig, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = LMConfig::default();

    if let Some(v) = parse_var::<f64, _>(&lookup, ENV_FTOL)? {
        config.ftol = positive(ENV_FTOL, v)?;
    }
    if let Some(v) = parse_var::<f64, _>(&lookup, ENV_XTOL)? {
        config.xtol = positive(ENV_XTOL, v)?;
    }
    if let Some(v) = parse_var::<f64, _>(&lookup, ENV_GTOL)? {
        config.gtol = positive(ENV_GTOL, v)?;
    }
    if let Some(v) = parse_var::<usize, _>(&lookup, ENV_MAX_ITERATIONS)? {
        config.max_iterations = v;
    }
    if let Some(v) = parse_var::<usize, _>(&lookup, ENV_MAX_EVALUATIONS)? {
        config.max_evaluations = Some(v);
    }

    Ok(config)
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, AppError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| AppError::new(2, format!("Invalid value for {key}: '{raw}'.")))
}

fn positive(key: &str, value: f64) -> Result<f64, AppError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(AppError::new(2, format!("{key} must be finite and >= 0, got {value}.")))
    }
}
