//! Regression tree backed by aprender's CART implementation

use aprender::tree::DecisionTreeRegressor as RegressionTree;
use ndarray::Array1;

use super::{
    bad_value, check_features, check_samples, from_vector, model_error, to_matrix, to_vector,
    unknown_param, Regressor,
};
use crate::frame::Frame;
use crate::params::ParamValue;
use crate::{Error, Result};

/// Decision-tree regressor splitting on MSE.
///
/// Parameters: `max_depth` (int ≥ 1, or `None` for unlimited), `min_samples_split`
/// (int ≥ 2), `min_samples_leaf` (int ≥ 1).
#[derive(Debug, Clone)]
pub struct DecisionTreeRegressor {
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    fitted: Option<RegressionTree>,
    n_features: usize,
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTreeRegressor {
    /// Unlimited depth, splitting any node with two or more samples.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            fitted: None,
            n_features: 0,
        }
    }

    /// Limit the tree depth.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Configured depth limit.
    #[must_use]
    pub const fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    fn build(&self) -> RegressionTree {
        let tree = RegressionTree::new()
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf);
        match self.max_depth {
            Some(depth) => tree.with_max_depth(depth),
            None => tree,
        }
    }
}

impl Regressor for DecisionTreeRegressor {
    fn fit(&mut self, x: &Frame, y: &Array1<f64>) -> Result<()> {
        check_samples(x, y)?;
        if x.nrows() == 0 {
            return Err(Error::InvalidInput("cannot fit on zero samples".to_string()));
        }
        let mut tree = self.build();
        tree.fit(&to_matrix(x)?, &to_vector(y))
            .map_err(model_error)?;
        self.fitted = Some(tree);
        self.n_features = x.ncols();
        Ok(())
    }

    fn predict(&self, x: &Frame) -> Result<Array1<f64>> {
        let tree = self
            .fitted
            .as_ref()
            .ok_or_else(|| Error::NotFitted("DecisionTreeRegressor::predict".to_string()))?;
        check_features(self.n_features, x)?;
        Ok(from_vector(&tree.predict(&to_matrix(x)?)))
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        const STAGE: &str = "DecisionTreeRegressor";
        match name {
            "max_depth" => {
                self.max_depth = if value.is_none() {
                    None
                } else {
                    Some(
                        value
                            .as_usize()
                            .filter(|d| *d >= 1)
                            .ok_or_else(|| bad_value(STAGE, name, "an int >= 1 or None", value))?,
                    )
                };
            }
            "min_samples_split" => {
                self.min_samples_split = value
                    .as_usize()
                    .filter(|n| *n >= 2)
                    .ok_or_else(|| bad_value(STAGE, name, "an int >= 2", value))?;
            }
            "min_samples_leaf" => {
                self.min_samples_leaf = value
                    .as_usize()
                    .filter(|n| *n >= 1)
                    .ok_or_else(|| bad_value(STAGE, name, "an int >= 1", value))?;
            }
            _ => return Err(unknown_param(STAGE, name)),
        }
        Ok(())
    }

    fn box_clone(&self) -> Box<dyn Regressor> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn steps() -> (Frame, Array1<f64>) {
        (
            Frame::from_array(array![[0.0], [1.0], [2.0], [10.0], [11.0], [12.0]]),
            array![1.0, 1.0, 1.0, 5.0, 5.0, 5.0],
        )
    }

    #[test]
    fn test_fits_step_function() {
        let (x, y) = steps();
        let mut tree = DecisionTreeRegressor::new().with_max_depth(2);
        tree.fit(&x, &y).unwrap();
        let pred = tree.predict(&Frame::from_array(array![[0.5], [11.5]])).unwrap();
        assert!((pred[0] - 1.0).abs() < 1e-5);
        assert!((pred[1] - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_max_depth_accepts_none() {
        let mut tree = DecisionTreeRegressor::new().with_max_depth(3);
        tree.set_param("max_depth", &ParamValue::None).unwrap();
        assert_eq!(tree.max_depth(), None);
        tree.set_param("max_depth", &ParamValue::Int(4)).unwrap();
        assert_eq!(tree.max_depth(), Some(4));
    }

    #[test]
    fn test_set_param_validation() {
        let mut tree = DecisionTreeRegressor::new();
        assert!(tree.set_param("max_depth", &ParamValue::Int(0)).is_err());
        assert!(tree.set_param("min_samples_split", &ParamValue::Int(1)).is_err());
        assert!(tree.set_param("min_samples_leaf", &ParamValue::Int(0)).is_err());
        assert!(tree.set_param("alpha", &ParamValue::Float(1.0)).is_err());
    }

    #[test]
    fn test_predict_before_fit() {
        let tree = DecisionTreeRegressor::new();
        assert!(matches!(
            tree.predict(&Frame::from_array(array![[1.0]])),
            Err(Error::NotFitted(_))
        ));
    }
}
