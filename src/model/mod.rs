//! Modeling surface consumed by the search harness
//!
//! Fitting, prediction, fold splitting and scoring are delegated to
//! [aprender](https://docs.rs/aprender). This module only adapts it to the
//! harness:
//!
//! - [`Transformer`]: `fit(data, optional target)` + `transform(data)`
//! - [`Regressor`]: `fit(data, target)` + `predict(data)`
//! - [`Pipeline`]: ordered named stages, the last one usually a regressor
//! - [`GridSearchCv`]: k-fold cross-validated search over a parameter grid
//! - [`mean_squared_error`] / [`r2_score`]
//!
//! Every adapter accepts its hyperparameters by name through `set_param`, and
//! converts between the `f64` [`Frame`] used by the harness and aprender's
//! `f32` [`Matrix`] / [`Vector`]. Dataset-specific transforms live in
//! [`crate::steps`].

mod linear;
mod metrics;
mod pipeline;
mod scaler;
mod selection;
mod tree;

use std::fmt;

use aprender::primitives::{Matrix, Vector};
use ndarray::{Array1, Array2};

use crate::frame::Frame;
use crate::params::ParamValue;
use crate::{Error, Result};

pub use linear::LinearRegression;
pub use metrics::{mean_squared_error, r2_score};
pub use pipeline::Pipeline;
pub use scaler::StandardScaler;
pub use selection::{CvResult, GridSearchCv};
pub use tree::DecisionTreeRegressor;

/// A stage that learns from data and rewrites it.
pub trait Transformer: fmt::Debug + Send + Sync {
    /// Learn data-dependent state.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is unusable for this transform.
    fn fit(&mut self, x: &Frame, y: Option<&Array1<f64>>) -> Result<()>;

    /// Apply the learned transform.
    ///
    /// # Errors
    ///
    /// Returns an error if the transform is not fitted or the data does not match.
    fn transform(&self, x: &Frame) -> Result<Frame>;

    /// Fit then transform the same data.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Transformer::fit`] and [`Transformer::transform`].
    fn fit_transform(&mut self, x: &Frame, y: Option<&Array1<f64>>) -> Result<Frame> {
        self.fit(x, y)?;
        self.transform(x)
    }

    /// Set a configuration parameter by its local name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for unknown names or ill-typed values.
    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()>;

    /// Clone into a new box.
    fn box_clone(&self) -> Box<dyn Transformer>;
}

/// A supervised regression estimator.
pub trait Regressor: fmt::Debug + Send + Sync {
    /// Fit the model.
    ///
    /// # Errors
    ///
    /// Returns an error on shape mismatch or numerical failure.
    fn fit(&mut self, x: &Frame, y: &Array1<f64>) -> Result<()>;

    /// Predict targets for `x`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFitted`] before fit, or a shape error.
    fn predict(&self, x: &Frame) -> Result<Array1<f64>>;

    /// Set a hyperparameter by its local name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for unknown names or ill-typed values.
    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()>;

    /// Clone into a new box.
    fn box_clone(&self) -> Box<dyn Regressor>;
}

impl Clone for Box<dyn Transformer> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

impl Clone for Box<dyn Regressor> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// One pipeline stage: either a transform or the final estimator.
#[derive(Debug, Clone)]
pub enum Stage {
    /// Intermediate data transform
    Transform(Box<dyn Transformer>),
    /// Final regression estimator
    Estimate(Box<dyn Regressor>),
}

impl Stage {
    /// Wrap a transformer.
    pub fn transformer(t: impl Transformer + 'static) -> Self {
        Self::Transform(Box::new(t))
    }

    /// Wrap a regressor.
    pub fn regressor(r: impl Regressor + 'static) -> Self {
        Self::Estimate(Box::new(r))
    }

    /// Forward a parameter to the wrapped stage.
    ///
    /// # Errors
    ///
    /// Propagates the stage's own validation error.
    pub fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match self {
            Self::Transform(t) => t.set_param(name, value),
            Self::Estimate(r) => r.set_param(name, value),
        }
    }

    /// Whether this stage is the estimator kind.
    #[must_use]
    pub const fn is_estimator(&self) -> bool {
        matches!(self, Self::Estimate(_))
    }
}

/// Build the error every stage returns for an unknown parameter name.
pub(crate) fn unknown_param(stage: &str, name: &str) -> Error {
    Error::InvalidInput(format!("{stage} has no parameter '{name}'"))
}

/// Build the error every stage returns for a value of the wrong type.
pub(crate) fn bad_value(stage: &str, name: &str, expected: &str, value: &ParamValue) -> Error {
    Error::InvalidInput(format!(
        "{stage}.{name} expects {expected}, got {value:?}"
    ))
}

/// Check that `x` and `y` describe the same number of samples.
pub(crate) fn check_samples(x: &Frame, y: &Array1<f64>) -> Result<()> {
    if x.nrows() == y.len() {
        Ok(())
    } else {
        Err(Error::ShapeMismatch {
            expected: format!("{} target values", x.nrows()),
            actual: format!("{} target values", y.len()),
        })
    }
}

/// Wrap an estimator failure, whichever error form the estimator reports it in.
pub(crate) fn model_error(e: impl Into<aprender::AprenderError>) -> Error {
    Error::Model(e.into())
}

/// Check that `x` has the feature count a stage was fitted with.
pub(crate) fn check_features(expected: usize, x: &Frame) -> Result<()> {
    if x.ncols() == expected {
        Ok(())
    } else {
        Err(Error::ShapeMismatch {
            expected: format!("{expected} features"),
            actual: format!("{} features", x.ncols()),
        })
    }
}

/// Copy a frame into an aprender matrix.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn to_matrix(x: &Frame) -> Result<Matrix<f32>> {
    let values = x.data().iter().map(|&v| v as f32).collect();
    Matrix::from_vec(x.nrows(), x.ncols(), values)
        .map_err(|e| Error::Computation(format!("cannot build feature matrix: {e}")))
}

/// Copy an aprender matrix back into an `f64` array.
pub(crate) fn from_matrix(m: &Matrix<f32>) -> Result<Array2<f64>> {
    let values = m.as_slice().iter().map(|&v| f64::from(v)).collect();
    Array2::from_shape_vec(m.shape(), values)
        .map_err(|e| Error::Computation(format!("cannot read transformed matrix: {e}")))
}

/// Copy a target into an aprender vector.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn to_vector(y: &Array1<f64>) -> Vector<f32> {
    Vector::from_vec(y.iter().map(|&v| v as f32).collect())
}

/// Copy an aprender vector back into an `f64` array.
pub(crate) fn from_vector(v: &Vector<f32>) -> Array1<f64> {
    v.as_slice().iter().map(|&v| f64::from(v)).collect()
}
