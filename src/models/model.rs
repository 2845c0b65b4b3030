//! Model evaluation.
//!
//! The fitter only needs one primitive from a model: evaluate `ŷ = f(x, θ)`.
//! The [`Model`] trait captures that together with the parameter count and
//! names (for reports). Built-in [`ModelKind`]s implement it directly and any
//! closure can be wrapped in a [`FnModel`].

use crate::domain::ModelKind;

/// A parametrised function `f(x, θ₁…θₖ)` that can be fit to data.
pub trait Model {
    /// Number of parameters `k`.
    fn param_count(&self) -> usize;

    /// Parameter names in fit order.
    fn param_names(&self) -> Vec<String> {
        (0..self.param_count()).map(|i| format!("p{i}")).collect()
    }

    /// Evaluate the model at `x`. `params.len()` equals `param_count()`.
    fn eval(&self, x: f64, params: &[f64]) -> f64;
}

impl<M: Model + ?Sized> Model for &M {
    fn param_count(&self) -> usize {
        (**self).param_count()
    }

    fn param_names(&self) -> Vec<String> {
        (**self).param_names()
    }

    fn eval(&self, x: f64, params: &[f64]) -> f64 {
        (**self).eval(x, params)
    }
}

/// Adapter for caller-supplied model closures.
///
/// ```
/// use curvefit::models::{FnModel, Model};
///
/// let line = FnModel::new(2, |x, p| p[0] * x + p[1]);
/// assert_eq!(line.eval(3.0, &[2.0, 1.0]), 7.0);
/// ```
#[derive(Clone)]
pub struct FnModel<F> {
    param_count: usize,
    names: Option<Vec<String>>,
    f: F,
}

impl<F> FnModel<F>
where
    F: Fn(f64, &[f64]) -> f64,
{
    pub fn new(param_count: usize, f: F) -> Self {
        Self {
            param_count,
            names: None,
            f,
        }
    }

    /// Attach parameter names; ignored unless there is one per parameter.
    pub fn with_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.len() == self.param_count {
            self.names = Some(names);
        }
        self
    }
}

impl<F> Model for FnModel<F>
where
    F: Fn(f64, &[f64]) -> f64,
{
    fn param_count(&self) -> usize {
        self.param_count
    }

    fn param_names(&self) -> Vec<String> {
        match &self.names {
            Some(names) => names.clone(),
            None => (0..self.param_count).map(|i| format!("p{i}")).collect(),
        }
    }

    fn eval(&self, x: f64, params: &[f64]) -> f64 {
        (self.f)(x, params)
    }
}

impl Model for ModelKind {
    fn param_count(&self) -> usize {
        self.param_len()
    }

    fn param_names(&self) -> Vec<String> {
        ModelKind::param_names(*self).iter().map(|s| s.to_string()).collect()
    }

    fn eval(&self, x: f64, params: &[f64]) -> f64 {
        predict(*self, x, params)
    }
}

/// Predict `y(x)` for a built-in model kind.
///
/// # Panics
/// Panics if `params` is shorter than `model.param_len()`.
pub fn predict(model: ModelKind, x: f64, params: &[f64]) -> f64 {
    match model {
        ModelKind::Linear => params[0] * x + params[1],
        ModelKind::Quadratic => (params[0] * x + params[1]) * x + params[2],
        ModelKind::Exponential => params[0] * (params[1] * x).exp() + params[2],
        ModelKind::Gaussian => {
            let z = (x - params[1]) / params[2];
            params[0] * (-0.5 * z * z).exp()
        }
        ModelKind::Power => params[0] * x.powf(params[1]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_builtin_models() {
        assert_eq!(predict(ModelKind::Linear, 3.0, &[2.0, 1.0]), 7.0);
        assert_eq!(predict(ModelKind::Quadratic, 2.0, &[1.0, -1.0, 3.0]), 5.0);
        assert!((predict(ModelKind::Exponential, 0.0, &[2.0, -1.0, 0.5]) - 2.5).abs() < 1e-12);
        assert!((predict(ModelKind::Gaussian, 1.0, &[4.0, 1.0, 0.3]) - 4.0).abs() < 1e-12);
        assert!((predict(ModelKind::Power, 4.0, &[3.0, 0.5]) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn fn_model_names_default_and_custom() {
        let m = FnModel::new(2, |x, p| p[0] * x + p[1]);
        assert_eq!(m.param_names(), vec!["p0", "p1"]);

        let m = m.with_names(["slope", "intercept"]);
        assert_eq!(m.param_names(), vec!["slope", "intercept"]);

        // Wrong count is ignored.
        let m = FnModel::new(2, |x, p| p[0] * x + p[1]).with_names(["only"]);
        assert_eq!(m.param_names(), vec!["p0", "p1"]);
    }

    #[test]
    fn model_kind_implements_model() {
        let m = ModelKind::Gaussian;
        assert_eq!(Model::param_count(&m), 3);
        assert_eq!(Model::param_names(&m), vec!["a", "mu", "sigma"]);
    }
}
