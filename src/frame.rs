//! Labeled feature matrix
//!
//! A [`Frame`] pairs an `ndarray` matrix (rows = samples, columns = features) with
//! column names, so that column-based transforms can address features by name.

use ndarray::{Array2, Axis};
use rustc_hash::FxHashSet;

use crate::{Error, Result};

/// Feature matrix with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    columns: Vec<String>,
    data: Array2<f64>,
}

impl Frame {
    /// Create a frame from column names and a matrix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] when the number of names differs from the
    /// number of matrix columns, or [`Error::InvalidInput`] on duplicate names.
    pub fn new(columns: Vec<String>, data: Array2<f64>) -> Result<Self> {
        if columns.len() != data.ncols() {
            return Err(Error::ShapeMismatch {
                expected: format!("{} column names", data.ncols()),
                actual: format!("{} column names", columns.len()),
            });
        }
        {
            let mut seen = FxHashSet::default();
            for name in &columns {
                if !seen.insert(name.as_str()) {
                    return Err(Error::InvalidInput(format!("duplicate column name '{name}'")));
                }
            }
        }
        Ok(Self { columns, data })
    }

    /// Coerce an unlabeled matrix into a frame with positional names `"0".."n-1"`.
    #[must_use]
    pub fn from_array(data: Array2<f64>) -> Self {
        let columns = (0..data.ncols()).map(|i| i.to_string()).collect();
        Self { columns, data }
    }

    /// Column names in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Underlying matrix.
    #[must_use]
    pub const fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Number of samples.
    #[must_use]
    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of features.
    #[must_use]
    pub fn ncols(&self) -> usize {
        self.data.ncols()
    }

    /// Position of a column by name.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Drop the named columns. Names not present in the frame are ignored.
    #[must_use]
    pub fn drop_columns<S: AsRef<str>>(&self, names: &[S]) -> Self {
        let drop: FxHashSet<&str> = names.iter().map(AsRef::as_ref).collect();
        let keep: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| !drop.contains(c.as_str()))
            .map(|(i, _)| i)
            .collect();
        self.select_columns(&keep)
    }

    /// Keep only the columns at the given positions, in that order.
    #[must_use]
    pub fn select_columns(&self, indices: &[usize]) -> Self {
        Self {
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            data: self.data.select(Axis(1), indices),
        }
    }

    /// Keep only the rows at the given positions, in that order.
    #[must_use]
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            data: self.data.select(Axis(0), indices),
        }
    }

    /// Replace the matrix, keeping the column names.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the column count changes.
    pub fn with_data(&self, data: Array2<f64>) -> Result<Self> {
        Self::new(self.columns.clone(), data)
    }
}

impl From<Array2<f64>> for Frame {
    fn from(data: Array2<f64>) -> Self {
        Self::from_array(data)
    }
}
