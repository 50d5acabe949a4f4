//! Least-squares regression on top of aprender's linear models

use aprender::linear_model::{LinearRegression as Ols, Ridge};
use aprender::primitives::{Matrix, Vector};
use aprender::traits::Estimator;
use ndarray::Array1;

use super::{
    bad_value, check_features, check_samples, from_vector, model_error, to_matrix, to_vector,
    unknown_param, Regressor,
};
use crate::frame::Frame;
use crate::params::ParamValue;
use crate::{Error, Result};

#[derive(Debug, Clone)]
enum Fitted {
    Ols(Ols),
    Ridge(Ridge),
}

impl Fitted {
    fn predict(&self, x: &Matrix<f32>) -> Vector<f32> {
        match self {
            Self::Ols(m) => m.predict(x),
            Self::Ridge(m) => m.predict(x),
        }
    }

    fn coefficients(&self) -> &Vector<f32> {
        match self {
            Self::Ols(m) => m.coefficients(),
            Self::Ridge(m) => m.coefficients(),
        }
    }

    fn intercept(&self) -> f32 {
        match self {
            Self::Ols(m) => m.intercept(),
            Self::Ridge(m) => m.intercept(),
        }
    }
}

/// Linear regression with optional L2 penalty.
///
/// `alpha == 0` fits ordinary least squares, `alpha > 0` fits ridge.
/// Parameters: `fit_intercept` (bool), `alpha` (float ≥ 0).
#[derive(Debug, Clone)]
pub struct LinearRegression {
    fit_intercept: bool,
    alpha: f64,
    fitted: Option<Fitted>,
    n_features: usize,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    /// Create an unregularized model that fits an intercept.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fit_intercept: true,
            alpha: 0.0,
            fitted: None,
            n_features: 0,
        }
    }

    /// Enable/disable fitting the intercept.
    #[must_use]
    pub const fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    /// Set the L2 penalty.
    #[must_use]
    pub const fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Fitted coefficients, if any.
    #[must_use]
    pub fn coefficients(&self) -> Option<Array1<f64>> {
        self.fitted.as_ref().map(|f| from_vector(f.coefficients()))
    }

    /// Fitted intercept (0 when not fitted or `fit_intercept = false`).
    #[must_use]
    pub fn intercept(&self) -> f64 {
        self.fitted.as_ref().map_or(0.0, |f| f64::from(f.intercept()))
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &Frame, y: &Array1<f64>) -> Result<()> {
        check_samples(x, y)?;
        if x.nrows() == 0 {
            return Err(Error::InvalidInput("cannot fit on zero samples".to_string()));
        }
        let (xm, yv) = (to_matrix(x)?, to_vector(y));

        #[allow(clippy::cast_possible_truncation)]
        let fitted = if self.alpha > 0.0 {
            let mut model = Ridge::new(self.alpha as f32).with_intercept(self.fit_intercept);
            model.fit(&xm, &yv).map_err(model_error)?;
            Fitted::Ridge(model)
        } else {
            let mut model = Ols::new().with_intercept(self.fit_intercept);
            model.fit(&xm, &yv).map_err(model_error)?;
            Fitted::Ols(model)
        };

        self.fitted = Some(fitted);
        self.n_features = x.ncols();
        Ok(())
    }

    fn predict(&self, x: &Frame) -> Result<Array1<f64>> {
        let fitted = self
            .fitted
            .as_ref()
            .ok_or_else(|| Error::NotFitted("LinearRegression::predict".to_string()))?;
        check_features(self.n_features, x)?;
        Ok(from_vector(&fitted.predict(&to_matrix(x)?)))
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match name {
            "fit_intercept" => {
                self.fit_intercept = value
                    .as_bool()
                    .ok_or_else(|| bad_value("LinearRegression", name, "a bool", value))?;
            }
            "alpha" => {
                self.alpha = value
                    .as_f64()
                    .filter(|a| *a >= 0.0)
                    .ok_or_else(|| bad_value("LinearRegression", name, "a float >= 0", value))?;
            }
            _ => return Err(unknown_param("LinearRegression", name)),
        }
        Ok(())
    }

    fn box_clone(&self) -> Box<dyn Regressor> {
        Box::new(self.clone())
    }
}
