//! Ordered, named processing stages ending in an estimator

use ndarray::Array1;
use rustc_hash::FxHashSet;

use super::Stage;
use crate::frame::Frame;
use crate::params::{check_key_part, ParamSet};
use crate::{Error, Result};

/// A sequence of named stages executed in order.
///
/// Every stage but the last must be a transform. Parameters are routed with
/// [`Pipeline::set_params`] using the stage name of each [`crate::params::ParamKey`].
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<(String, Stage)>,
    fitted: bool,
}

impl Pipeline {
    /// Build a pipeline from `(name, stage)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the list is empty, a name repeats or contains
    /// `"__"`, or an estimator appears before the last position.
    pub fn new(stages: Vec<(String, Stage)>) -> Result<Self> {
        if stages.is_empty() {
            return Err(Error::InvalidInput("a pipeline needs at least one stage".to_string()));
        }
        {
            let mut seen = FxHashSet::default();
            for (idx, (name, stage)) in stages.iter().enumerate() {
                check_key_part("stage name", name)?;
                if !seen.insert(name.as_str()) {
                    return Err(Error::InvalidInput(format!("duplicate stage name '{name}'")));
                }
                if stage.is_estimator() && idx + 1 != stages.len() {
                    return Err(Error::InvalidInput(format!(
                        "estimator stage '{name}' must be the last stage"
                    )));
                }
            }
        }
        Ok(Self {
            stages,
            fitted: false,
        })
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|(name, _)| name.as_str())
    }

    /// Number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always false for a constructed pipeline.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Whether [`Pipeline::fit`] has completed.
    #[must_use]
    pub const fn is_fitted(&self) -> bool {
        self.fitted
    }

    /// Apply every parameter to the stage its key names.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an unknown stage, and propagates the
    /// stage's own error for unknown or ill-typed parameters.
    pub fn set_params(&mut self, params: &ParamSet) -> Result<()> {
        for (key, value) in params.iter() {
            let (_, stage) = self
                .stages
                .iter_mut()
                .find(|(name, _)| name == key.stage())
                .ok_or_else(|| {
                    Error::InvalidInput(format!(
                        "parameter '{key}' targets unknown stage '{}'",
                        key.stage()
                    ))
                })?;
            stage.set_param(key.name(), value)?;
        }
        self.fitted = false;
        Ok(())
    }

    /// Fit every transform on the output of the previous one, then the estimator.
    ///
    /// # Errors
    ///
    /// Propagates the first stage failure.
    pub fn fit(&mut self, x: &Frame, y: &Array1<f64>) -> Result<()> {
        let mut current = x.clone();
        for (_, stage) in &mut self.stages {
            match stage {
                Stage::Transform(t) => current = t.fit_transform(&current, Some(y))?,
                Stage::Estimate(r) => r.fit(&current, y)?,
            }
        }
        self.fitted = true;
        Ok(())
    }

    /// Run `x` through every transform stage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFitted`] before fit, or the first stage failure.
    pub fn transform(&self, x: &Frame) -> Result<Frame> {
        if !self.fitted {
            return Err(Error::NotFitted("Pipeline::transform".to_string()));
        }
        let mut current = x.clone();
        for (_, stage) in &self.stages {
            if let Stage::Transform(t) = stage {
                current = t.transform(&current)?;
            }
        }
        Ok(current)
    }

    /// Transform `x` and predict with the final estimator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFitted`] before fit, [`Error::InvalidState`] when the last
    /// stage is not an estimator, or the first stage failure.
    pub fn predict(&self, x: &Frame) -> Result<Array1<f64>> {
        let transformed = self.transform(x)?;
        match self.stages.last() {
            Some((_, Stage::Estimate(r))) => r.predict(&transformed),
            _ => Err(Error::InvalidState(
                "pipeline has no final estimator to predict with".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LinearRegression, StandardScaler};
    use crate::params::{ParamKey, ParamValue};
    use ndarray::array;

    fn scaled_linear() -> Pipeline {
        Pipeline::new(vec![
            ("scale".to_string(), Stage::transformer(StandardScaler::new())),
            ("lr".to_string(), Stage::regressor(LinearRegression::new())),
        ])
        .unwrap()
    }

    #[test]
    fn test_fit_predict() {
        let mut pipe = scaled_linear();
        let x = Frame::from_array(array![[1.0], [2.0], [3.0], [4.0]]);
        let y = array![2.0, 4.0, 6.0, 8.0];
        pipe.fit(&x, &y).unwrap();
        let pred = pipe.predict(&Frame::from_array(array![[5.0]])).unwrap();
        assert!((pred[0] - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_estimator_must_be_last() {
        let result = Pipeline::new(vec![
            ("lr".to_string(), Stage::regressor(LinearRegression::new())),
            ("scale".to_string(), Stage::transformer(StandardScaler::new())),
        ]);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_stage_name_with_separator_rejected() {
        let result = Pipeline::new(vec![(
            "lin__reg".to_string(),
            Stage::regressor(LinearRegression::new()),
        )]);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_set_params_unknown_stage() {
        let mut pipe = scaled_linear();
        let params: ParamSet = [(ParamKey::new("pca", "n"), ParamValue::Int(2))]
            .into_iter()
            .collect();
        assert!(matches!(pipe.set_params(&params), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_predict_before_fit() {
        let pipe = scaled_linear();
        assert!(matches!(
            pipe.predict(&Frame::from_array(array![[1.0]])),
            Err(Error::NotFitted(_))
        ));
    }
}
