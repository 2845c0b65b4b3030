//! Multi-start fitting.
//!
//! Each starting point is fit independently (in parallel) and the lowest-cost
//! result wins. Selection is deterministic: ties go to the lowest start index.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;
use rayon::prelude::*;

use super::curve_fit::CurveFitOptions;
use super::uncertainty::{UncertainFit, fit_with_uncertainty};
use crate::error::FitError;
use crate::models::Model;
use crate::solver::Bounds;

/// Fit from every start in `starts` and keep the best converged result.
///
/// `options.initial_guess` is ignored; each start supplies its own. An input
/// error on any start is returned as-is. If every start fails in the solver,
/// the error of the first start is returned.
pub fn fit_multistart<M>(
    model: &M,
    x: &[f64],
    y: &[f64],
    starts: &[Vec<f64>],
    return_covariance: bool,
    options: &CurveFitOptions,
) -> Result<UncertainFit, FitError>
where
    M: Model + Sync + ?Sized,
{
    if starts.is_empty() {
        return Err(FitError::NoStarts);
    }

    let outcomes: Vec<Result<UncertainFit, FitError>> = starts
        .par_iter()
        .map(|start| {
            let opts = CurveFitOptions {
                initial_guess: Some(start.clone()),
                ..options.clone()
            };
            fit_with_uncertainty(model, x, y, return_covariance, &opts)
        })
        .collect();

    if let Some(Err(e)) = outcomes.iter().find(|o| matches!(o, Err(e) if !e.is_solver_failure())) {
        return Err(e.clone());
    }

    let mut best: Option<(usize, UncertainFit)> = None;
    let mut first_error: Option<FitError> = None;
    let mut failed = 0usize;

    for (idx, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(fit) if fit.diagnostics.cost.is_finite() => {
                let better = match &best {
                    Some((_, b)) => fit.diagnostics.cost < b.diagnostics.cost,
                    None => true,
                };
                if better {
                    best = Some((idx, fit));
                }
            }
            Ok(_) => failed += 1,
            Err(e) => {
                failed += 1;
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    match best {
        Some((idx, fit)) => {
            tracing::debug!(
                starts = starts.len(),
                failed,
                best_start = idx,
                cost = fit.diagnostics.cost,
                "multi-start fit finished"
            );
            Ok(fit)
        }
        None => Err(first_error.unwrap_or(FitError::NoStarts)),
    }
}

/// `base` followed by `count` seeded perturbations of it.
///
/// Each perturbed entry is `p + scale · max(|p|, 1) · z` with `z ~ N(0, 1)`,
/// clamped into `bounds` when given.
pub fn jittered_starts(
    base: &[f64],
    count: usize,
    scale: f64,
    seed: u64,
    bounds: Option<&Bounds>,
) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = Vec::with_capacity(count + 1);
    out.push(base.to_vec());

    for _ in 0..count {
        let start: Vec<f64> = base
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                let z: f64 = rng.sample(StandardNormal);
                let v = p + scale * p.abs().max(1.0) * z;
                match bounds {
                    Some(b) if i < b.len() => b.clamp(i, v),
                    _ => v,
                }
            })
            .collect();
        out.push(start);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelKind;
    use crate::models::predict;

    #[test]
    fn empty_starts_is_an_error() {
        let err = fit_multistart(
            &ModelKind::Linear,
            &[0.0, 1.0, 2.0],
            &[0.0, 1.0, 2.0],
            &[],
            false,
            &CurveFitOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, FitError::NoStarts);
    }

    #[test]
    fn picks_global_minimum_over_bad_start() {
        // A narrow peak: starting far away on the flat tail does not find it.
        let xs: Vec<f64> = (0..81).map(|i| -10.0 + 0.25 * i as f64).collect();
        let truth = [3.0, 4.0, 0.6];
        let ys: Vec<f64> = xs.iter().map(|&x| predict(ModelKind::Gaussian, x, &truth)).collect();

        let starts = vec![vec![1.0, -8.0, 0.5], vec![2.5, 3.5, 1.0]];
        let fit = fit_multistart(&ModelKind::Gaussian, &xs, &ys, &starts, false, &CurveFitOptions::default())
            .unwrap();

        assert!((fit.params[0] - 3.0).abs() < 1e-5);
        assert!((fit.params[1] - 4.0).abs() < 1e-5);
        assert!((fit.params[2].abs() - 0.6).abs() < 1e-5);
    }

    #[test]
    fn start_outside_bounds_is_not_masked_by_other_starts() {
        let options = CurveFitOptions::default().with_bounds(Bounds::new(vec![0.0, 0.0], vec![5.0, 5.0]).unwrap());
        let starts = vec![vec![1.0, 9.0], vec![1.0, 1.0]];
        let err = fit_multistart(
            &ModelKind::Linear,
            &[0.0, 1.0, 2.0],
            &[1.0, 3.0, 5.0],
            &starts,
            false,
            &options,
        )
        .unwrap_err();
        assert_eq!(err, FitError::InitialGuessOutOfBounds { index: 1 });
    }

    #[test]
    fn jittered_starts_are_seeded_and_bounded() {
        let bounds = Bounds::new(vec![0.0, 0.0], vec![2.0, 2.0]).unwrap();
        let a = jittered_starts(&[1.0, 1.0], 5, 3.0, 7, Some(&bounds));
        let b = jittered_starts(&[1.0, 1.0], 5, 3.0, 7, Some(&bounds));

        assert_eq!(a, b);
        assert_eq!(a.len(), 6);
        assert_eq!(a[0], vec![1.0, 1.0]);
        for start in &a {
            assert!(start.iter().all(|v| (0.0..=2.0).contains(v)));
        }
    }
}
