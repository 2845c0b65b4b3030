//! Data-driven starting points for the built-in models.
//!
//! A nonlinear fit only finds the optimum near its starting point, so each
//! built-in model gets a cheap heuristic guess from the samples. Linear and
//! quadratic guesses are exact least-squares solutions already.

use crate::domain::ModelKind;
use crate::math::polyfit;

/// Heuristic initial parameters for `model` given the samples.
///
/// Always returns `model.param_len()` finite values; falls back to ones when
/// the data gives nothing usable.
pub fn initial_guess(model: ModelKind, x: &[f64], y: &[f64]) -> Vec<f64> {
    let guess = match model {
        ModelKind::Linear => polyfit(x, y, 1),
        ModelKind::Quadratic => polyfit(x, y, 2),
        ModelKind::Exponential => guess_exponential(x, y),
        ModelKind::Gaussian => guess_gaussian(x, y),
        ModelKind::Power => guess_power(x, y),
    };

    match guess {
        Some(g) if g.len() == model.param_len() && g.iter().all(|v| v.is_finite()) => g,
        _ => vec![1.0; model.param_len()],
    }
}

fn sorted_pairs(x: &[f64], y: &[f64]) -> Vec<(f64, f64)> {
    let mut pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(&a, &b)| (a, b))
        .collect();
    pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    pairs
}

fn guess_exponential(x: &[f64], y: &[f64]) -> Option<Vec<f64>> {
    let pairs = sorted_pairs(x, y);
    if pairs.len() < 3 {
        return None;
    }
    let (x0, y0) = pairs[0];
    let (xm, ym) = pairs[pairs.len() / 2];
    let (x1, y1) = pairs[pairs.len() - 1];
    let span = x1 - x0;
    if span <= 0.0 {
        return None;
    }

    // Growth when the far half changes more than the near half.
    if (y1 - ym).abs() > (ym - y0).abs() {
        let c = y0;
        let ratio = (ym - c) / (y1 - c);
        let b = if ratio > 0.0 && ratio < 1.0 && x1 > xm {
            -ratio.ln() / (x1 - xm)
        } else {
            1.0 / span
        };
        let a = (y1 - c) * (-b * x1).exp();
        Some(vec![a, b, c])
    } else {
        let c = y1;
        let ratio = (ym - c) / (y0 - c);
        let b = if ratio > 0.0 && ratio < 1.0 && xm > x0 {
            ratio.ln() / (xm - x0)
        } else {
            -1.0 / span
        };
        let a = (y0 - c) * (-b * x0).exp();
        Some(vec![a, b, c])
    }
}

fn guess_gaussian(x: &[f64], y: &[f64]) -> Option<Vec<f64>> {
    let pairs = sorted_pairs(x, y);
    let (x_peak, y_peak) = pairs
        .iter()
        .copied()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))?;

    let mut weight_sum = 0.0;
    let mut second_moment = 0.0;
    for &(xi, yi) in &pairs {
        let w = yi.max(0.0);
        weight_sum += w;
        second_moment += w * (xi - x_peak) * (xi - x_peak);
    }

    let span = pairs.last()?.0 - pairs.first()?.0;
    let sigma = if weight_sum > 0.0 && second_moment > 0.0 {
        (second_moment / weight_sum).sqrt()
    } else {
        span / 4.0
    };
    if !(sigma.is_finite() && sigma > 0.0) {
        return None;
    }

    Some(vec![y_peak, x_peak, sigma])
}

fn guess_power(x: &[f64], y: &[f64]) -> Option<Vec<f64>> {
    if x.iter().chain(y.iter()).any(|v| !(v.is_finite() && *v > 0.0)) {
        return None;
    }
    let lx: Vec<f64> = x.iter().map(|v| v.ln()).collect();
    let ly: Vec<f64> = y.iter().map(|v| v.ln()).collect();
    let coef = polyfit(&lx, &ly, 1)?;
    Some(vec![coef[1].exp(), coef[0]])
}
