//! Removal of highly correlated features

use ndarray::{Array1, Array2, ArrayView1};
use tracing::debug;

use crate::frame::Frame;
use crate::model::{bad_value, unknown_param, Transformer};
use crate::params::ParamValue;
use crate::{Error, Result};

/// Pearson correlation of two columns; NaN when either column is constant.
fn pearson(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    let mean_a = a.mean().unwrap_or(f64::NAN);
    let mean_b = b.mean().unwrap_or(f64::NAN);
    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b.iter()) {
        let (dx, dy) = (x - mean_a, y - mean_b);
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    let denom = (var_a * var_b).sqrt();
    if denom == 0.0 {
        f64::NAN
    } else {
        cov / denom
    }
}

/// Absolute pairwise correlation matrix of the columns of `x`.
#[must_use]
pub fn abs_correlation_matrix(x: &Array2<f64>) -> Array2<f64> {
    let n = x.ncols();
    let mut corr = Array2::<f64>::from_elem((n, n), 1.0);
    for i in 0..n {
        for j in (i + 1)..n {
            let c = pearson(x.column(i), x.column(j)).abs();
            corr[[i, j]] = c;
            corr[[j, i]] = c;
        }
    }
    corr
}

/// Drops every column whose absolute correlation with an earlier column reaches
/// `corr_threshold`.
///
/// Only the strict upper triangle of the correlation matrix is inspected, so of a
/// correlated pair the later column goes and the earlier one stays. The threshold is
/// configuration, set with [`HighCorrFeaturesRemover::set_corr_threshold`] or the
/// `corr_threshold` parameter, never by `fit`.
#[derive(Debug, Clone, Default)]
pub struct HighCorrFeaturesRemover {
    corr_threshold: Option<f64>,
    cols_to_drop: Option<Vec<String>>,
}

impl HighCorrFeaturesRemover {
    /// Create a remover with no threshold yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            corr_threshold: None,
            cols_to_drop: None,
        }
    }

    /// Set the threshold, which must lie in (0, 1].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for values outside (0, 1].
    pub fn set_corr_threshold(&mut self, threshold: f64) -> Result<&mut Self> {
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(Error::InvalidInput(format!(
                "corr_threshold must be in (0, 1], got {threshold}"
            )));
        }
        self.corr_threshold = Some(threshold);
        Ok(self)
    }

    /// Configured threshold.
    #[must_use]
    pub const fn corr_threshold(&self) -> Option<f64> {
        self.corr_threshold
    }

    /// Columns marked for removal by the last fit.
    #[must_use]
    pub fn cols_to_drop(&self) -> Option<&[String]> {
        self.cols_to_drop.as_deref()
    }

    /// Fit on an unlabeled matrix (columns named by position).
    ///
    /// # Errors
    ///
    /// Same as [`Transformer::fit`].
    pub fn fit_array(&mut self, x: &Array2<f64>) -> Result<()> {
        self.fit(&Frame::from_array(x.clone()), None)
    }

    /// Transform an unlabeled matrix (columns named by position).
    ///
    /// # Errors
    ///
    /// Same as [`Transformer::transform`].
    pub fn transform_array(&self, x: &Array2<f64>) -> Result<Frame> {
        self.transform(&Frame::from_array(x.clone()))
    }
}

impl Transformer for HighCorrFeaturesRemover {
    fn fit(&mut self, x: &Frame, _y: Option<&Array1<f64>>) -> Result<()> {
        let threshold = self.corr_threshold.ok_or_else(|| {
            Error::InvalidState("corr_threshold must be set before fit".to_string())
        })?;
        let corr = abs_correlation_matrix(x.data());
        let n = x.ncols();

        let cols_to_drop: Vec<String> = (0..n)
            .filter(|&j| (0..j).any(|i| corr[[i, j]] >= threshold))
            .map(|j| x.columns()[j].clone())
            .collect();

        debug!(removed = cols_to_drop.len(), threshold, "correlated features marked");
        self.cols_to_drop = Some(cols_to_drop);
        Ok(())
    }

    fn transform(&self, x: &Frame) -> Result<Frame> {
        let cols = self
            .cols_to_drop
            .as_ref()
            .ok_or_else(|| Error::NotFitted("HighCorrFeaturesRemover::transform".to_string()))?;
        Ok(x.drop_columns(cols))
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        if name != "corr_threshold" {
            return Err(unknown_param("HighCorrFeaturesRemover", name));
        }
        let threshold = value
            .as_f64()
            .ok_or_else(|| bad_value("HighCorrFeaturesRemover", name, "a float in (0, 1]", value))?;
        self.set_corr_threshold(threshold)?;
        Ok(())
    }

    fn box_clone(&self) -> Box<dyn Transformer> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample() -> Array2<f64> {
        // col1 = 2 * col0, col2 unrelated
        array![
            [1.0, 2.0, 5.0],
            [2.0, 4.0, 1.0],
            [3.0, 6.0, 4.0],
            [4.0, 8.0, 2.0],
        ]
    }

    #[test]
    fn test_drops_later_of_correlated_pair() {
        let mut remover = HighCorrFeaturesRemover::new();
        remover.set_corr_threshold(0.95).unwrap();
        remover.fit_array(&sample()).unwrap();
        assert_eq!(remover.cols_to_drop().unwrap(), &["1".to_string()]);

        let out = remover.transform_array(&sample()).unwrap();
        assert_eq!(out.columns(), &["0", "2"]);
    }

    #[test]
    fn test_fit_requires_threshold() {
        let mut remover = HighCorrFeaturesRemover::new();
        assert!(matches!(remover.fit_array(&sample()), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_threshold_range() {
        let mut remover = HighCorrFeaturesRemover::new();
        assert!(remover.set_corr_threshold(0.0).is_err());
        assert!(remover.set_corr_threshold(1.5).is_err());
        assert!(remover.set_corr_threshold(1.0).is_ok());
        assert!(remover
            .set_param("corr_threshold", &ParamValue::Float(0.8))
            .is_ok());
        assert_eq!(remover.corr_threshold(), Some(0.8));
    }

    #[test]
    fn test_constant_column_never_marked() {
        let x = array![[1.0, 7.0], [2.0, 7.0], [3.0, 7.0]];
        let mut remover = HighCorrFeaturesRemover::new();
        remover.set_corr_threshold(0.1).unwrap();
        remover.fit_array(&x).unwrap();
        assert!(remover.cols_to_drop().unwrap().is_empty());
    }

    #[test]
    fn test_transform_before_fit() {
        let remover = HighCorrFeaturesRemover::new();
        assert!(matches!(
            remover.transform_array(&sample()),
            Err(Error::NotFitted(_))
        ));
    }
}
