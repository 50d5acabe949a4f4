//! Regression scores

use aprender::metrics::{mse, r_squared};
use ndarray::Array1;

use super::to_vector;
use crate::{Error, Result};

fn check_pair(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(Error::ShapeMismatch {
            expected: format!("{} predictions", y_true.len()),
            actual: format!("{} predictions", y_pred.len()),
        });
    }
    if y_true.is_empty() {
        return Err(Error::InvalidInput("cannot score an empty target".to_string()));
    }
    Ok(())
}

/// Mean of squared residuals.
///
/// # Errors
///
/// Returns an error on length mismatch or empty input.
pub fn mean_squared_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    check_pair(y_true, y_pred)?;
    Ok(f64::from(mse(&to_vector(y_pred), &to_vector(y_true))))
}

/// Coefficient of determination.
///
/// A constant target scores 0.0.
///
/// # Errors
///
/// Returns an error on length mismatch or empty input.
pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    check_pair(y_true, y_pred)?;
    Ok(f64::from(r_squared(&to_vector(y_pred), &to_vector(y_true))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mse() {
        let mse = mean_squared_error(&array![1.0, 2.0, 3.0], &array![1.0, 2.0, 5.0]).unwrap();
        assert!((mse - 4.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_r2_perfect_and_mean() {
        let y = array![1.0, 2.0, 3.0];
        assert!((r2_score(&y, &y).unwrap() - 1.0).abs() < 1e-6);
        assert!(r2_score(&y, &array![2.0, 2.0, 2.0]).unwrap().abs() < 1e-6);
    }

    #[test]
    fn test_r2_is_not_symmetric() {
        let y_true = array![1.0, 2.0, 3.0];
        let y_pred = array![1.0, 1.0, 1.0];
        assert!((r2_score(&y_true, &y_pred).unwrap() + 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_r2_constant_target() {
        let y = array![4.0, 4.0];
        assert!(r2_score(&y, &array![3.0, 4.0]).unwrap().abs() < 1e-6);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(
            mean_squared_error(&array![1.0], &array![1.0, 2.0]),
            Err(Error::ShapeMismatch { .. })
        ));
        assert!(matches!(
            r2_score(&Array1::zeros(0), &Array1::zeros(0)),
            Err(Error::InvalidInput(_))
        ));
    }
}
