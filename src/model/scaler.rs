//! Standardization (zero mean, unit variance)

use aprender::preprocessing::StandardScaler as Standardizer;
use aprender::traits::Transformer as _;
use ndarray::Array1;

use super::{
    bad_value, check_features, from_matrix, model_error, to_matrix, unknown_param, Transformer,
};
use crate::frame::Frame;
use crate::params::ParamValue;
use crate::{Error, Result};

/// Per-column standardization using the population standard deviation.
///
/// Parameters: `with_mean` (bool), `with_std` (bool). Constant columns are only centered.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    with_mean: bool,
    with_std: bool,
    fitted: Option<Standardizer>,
    n_features: usize,
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardScaler {
    /// Center and scale.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            with_mean: true,
            with_std: true,
            fitted: None,
            n_features: 0,
        }
    }

    /// Toggle centering.
    #[must_use]
    pub const fn with_mean(mut self, with_mean: bool) -> Self {
        self.with_mean = with_mean;
        self
    }

    /// Toggle scaling.
    #[must_use]
    pub const fn with_std(mut self, with_std: bool) -> Self {
        self.with_std = with_std;
        self
    }
}

impl Transformer for StandardScaler {
    fn fit(&mut self, x: &Frame, _y: Option<&Array1<f64>>) -> Result<()> {
        if x.nrows() == 0 {
            return Err(Error::InvalidInput(
                "cannot fit a scaler on zero samples".to_string(),
            ));
        }
        let mut scaler = Standardizer::new()
            .with_mean(self.with_mean)
            .with_std(self.with_std);
        scaler.fit(&to_matrix(x)?).map_err(model_error)?;
        self.fitted = Some(scaler);
        self.n_features = x.ncols();
        Ok(())
    }

    fn transform(&self, x: &Frame) -> Result<Frame> {
        let scaler = self
            .fitted
            .as_ref()
            .ok_or_else(|| Error::NotFitted("StandardScaler::transform".to_string()))?;
        check_features(self.n_features, x)?;
        let scaled = scaler.transform(&to_matrix(x)?).map_err(model_error)?;
        x.with_data(from_matrix(&scaled)?)
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        let slot = match name {
            "with_mean" => &mut self.with_mean,
            "with_std" => &mut self.with_std,
            _ => return Err(unknown_param("StandardScaler", name)),
        };
        *slot = value
            .as_bool()
            .ok_or_else(|| bad_value("StandardScaler", name, "a bool", value))?;
        Ok(())
    }

    fn box_clone(&self) -> Box<dyn Transformer> {
        Box::new(self.clone())
    }
}
