//! Dataset loading and train/test splitting

use std::path::Path;

use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::frame::Frame;
use crate::{Error, Result};

/// Feature frame plus regression target.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    features: Frame,
    target: Array1<f64>,
}

impl Dataset {
    /// Pair features with a target.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the row counts differ.
    pub fn new(features: Frame, target: Array1<f64>) -> Result<Self> {
        if features.nrows() != target.len() {
            return Err(Error::ShapeMismatch {
                expected: format!("{} target values", features.nrows()),
                actual: format!("{} target values", target.len()),
            });
        }
        Ok(Self { features, target })
    }

    /// Load a numeric CSV with a header row.
    ///
    /// `target` becomes the target vector; columns in `drop` (e.g. identifiers) are
    /// skipped; every other column becomes a feature.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingResource`] if the target column is absent,
    /// [`Error::InvalidInput`] naming the row and column of a non-numeric cell, or a
    /// CSV/IO error.
    pub fn from_csv<S: AsRef<str>>(path: impl AsRef<Path>, target: &str, drop: &[S]) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let target_idx = headers.iter().position(|h| h == target).ok_or_else(|| {
            Error::MissingResource(format!(
                "target column '{target}' not found in {}",
                path.display()
            ))
        })?;
        let feature_idx: Vec<usize> = (0..headers.len())
            .filter(|&i| i != target_idx && !drop.iter().any(|d| d.as_ref() == headers[i]))
            .collect();

        let mut values = Vec::new();
        let mut targets = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let parse = |col: usize| -> Result<f64> {
                let cell = record.get(col).unwrap_or("");
                cell.trim().parse::<f64>().map_err(|_| {
                    Error::InvalidInput(format!(
                        "row {row}, column '{}': '{cell}' is not a number",
                        headers[col]
                    ))
                })
            };
            targets.push(parse(target_idx)?);
            for &col in &feature_idx {
                values.push(parse(col)?);
            }
        }

        let nrows = targets.len();
        let data = Array2::from_shape_vec((nrows, feature_idx.len()), values).map_err(|e| {
            Error::ShapeMismatch {
                expected: format!("{nrows}x{} matrix", feature_idx.len()),
                actual: e.to_string(),
            }
        })?;
        let columns = feature_idx.iter().map(|&i| headers[i].clone()).collect();
        debug!(path = %path.display(), rows = nrows, features = feature_idx.len(), "Loaded dataset");
        Self::new(Frame::new(columns, data)?, Array1::from(targets))
    }

    /// Feature frame.
    #[must_use]
    pub const fn features(&self) -> &Frame {
        &self.features
    }

    /// Target vector.
    #[must_use]
    pub const fn target(&self) -> &Array1<f64> {
        &self.target
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.target.len()
    }

    /// Whether there are no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }
}

/// Train and test partitions of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitData {
    /// Training features
    pub x_train: Frame,
    /// Test features
    pub x_test: Frame,
    /// Training target
    pub y_train: Array1<f64>,
    /// Test target
    pub y_test: Array1<f64>,
}

/// Shuffle with a seeded `ChaCha8` generator and hold out `ceil(n * test_fraction)`
/// samples for testing.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if `test_fraction` is not in (0, 1) or either
/// partition would be empty.
pub fn train_test_split(dataset: &Dataset, test_fraction: f64, seed: u64) -> Result<SplitData> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(Error::InvalidInput(format!(
            "test_fraction must be in (0, 1), got {test_fraction}"
        )));
    }
    let n = dataset.len();
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let n_test = (n as f64 * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(Error::InvalidInput(format!(
            "cannot split {n} samples with test_fraction {test_fraction}"
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    let (test_idx, train_idx) = indices.split_at(n_test);

    Ok(SplitData {
        x_train: dataset.features.select_rows(train_idx),
        x_test: dataset.features.select_rows(test_idx),
        y_train: train_idx.iter().map(|&i| dataset.target[i]).collect(),
        y_test: test_idx.iter().map(|&i| dataset.target[i]).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::fs;

    fn dataset(n: usize) -> Dataset {
        #[allow(clippy::cast_precision_loss)]
        let x = Array2::from_shape_fn((n, 2), |(i, j)| (i * 2 + j) as f64);
        let y = x.column(0).to_owned();
        Dataset::new(Frame::from_array(x), y).unwrap()
    }

    #[test]
    fn test_from_csv_drops_and_targets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.csv");
        fs::write(&path, "a,material,b,critical_temp\n1,0,2,10\n3,0,4,20\n").unwrap();
        let ds = Dataset::from_csv(&path, "critical_temp", &["material"]).unwrap();
        assert_eq!(ds.features().columns(), &["a", "b"]);
        assert_eq!(ds.features().data(), &array![[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(ds.target(), &array![10.0, 20.0]);
    }

    #[test]
    fn test_from_csv_non_numeric_cell() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.csv");
        fs::write(&path, "a,y\nx,1\n").unwrap();
        let err = Dataset::from_csv(&path, "y", &[] as &[&str]).unwrap_err();
        assert!(err.to_string().contains("column 'a'"));
    }

    #[test]
    fn test_from_csv_missing_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.csv");
        fs::write(&path, "a,b\n1,2\n").unwrap();
        assert!(matches!(
            Dataset::from_csv(&path, "y", &[] as &[&str]),
            Err(Error::MissingResource(_))
        ));
    }

    #[test]
    fn test_split_sizes_and_determinism() {
        let ds = dataset(10);
        let a = train_test_split(&ds, 0.25, 42).unwrap();
        let b = train_test_split(&ds, 0.25, 42).unwrap();
        assert_eq!(a.x_test.nrows(), 3);
        assert_eq!(a.x_train.nrows(), 7);
        assert_eq!(a, b);
        // rows stay aligned with their target
        for (row, y) in a.x_train.data().rows().into_iter().zip(a.y_train.iter()) {
            assert!((row[0] - y).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        assert!(train_test_split(&dataset(10), 1.0, 0).is_err());
        assert!(train_test_split(&dataset(1), 0.5, 0).is_err());
    }
}
