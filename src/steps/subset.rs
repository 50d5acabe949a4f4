//! Column-subset selectors for the superconductivity dataset
//!
//! The dataset ships as two files sharing a target column: `train.csv` holds the
//! material-properties features and `formula_train.csv` the chemical-formula features
//! (plus a `material` id column). A merged frame carries both families; these steps keep
//! one family by dropping the columns of the other.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ndarray::Array1;

use crate::config::{SearchConfig, DEFAULT_DATA_DIR};
use crate::frame::Frame;
use crate::model::{unknown_param, Transformer};
use crate::params::ParamValue;
use crate::{Error, Result};

/// Target column present in both reference files.
pub const TARGET_COLUMN: &str = "critical_temp";

/// Id column present in the formula file.
pub const MATERIAL_COLUMN: &str = "material";

/// Properties reference file name.
pub const PROPERTIES_FILE: &str = "train.csv";

/// Formula reference file name.
pub const FORMULA_FILE: &str = "formula_train.csv";

/// Provides the feature names belonging to each family.
pub trait FeatureFamilies: fmt::Debug + Send + Sync {
    /// Feature columns of the properties family.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingResource`] when the backing source is unavailable.
    fn properties_features(&self) -> Result<Vec<String>>;

    /// Feature columns of the formula family.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingResource`] when the backing source is unavailable.
    fn formula_features(&self) -> Result<Vec<String>>;
}

/// Reads the families from the headers of the reference CSV files.
///
/// Headers are read on every call, so edits to the files are picked up at
/// transform time.
#[derive(Debug, Clone)]
pub struct CsvFeatureFamilies {
    data_dir: PathBuf,
}

impl CsvFeatureFamilies {
    /// Look for the reference files under `data_dir`.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Look for the reference files in the configured data directory.
    #[must_use]
    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(config.data_dir())
    }

    /// Directory searched for the reference files.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn feature_columns(&self, file: &str, non_features: &[&str]) -> Result<Vec<String>> {
        let path = self.data_dir.join(file);
        let headers = read_headers(&path)?;
        for required in non_features {
            if !headers.iter().any(|h| h == required) {
                return Err(Error::MissingResource(format!(
                    "{} has no '{required}' column",
                    path.display()
                )));
            }
        }
        Ok(headers
            .into_iter()
            .filter(|h| !non_features.contains(&h.as_str()))
            .collect())
    }
}

impl Default for CsvFeatureFamilies {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}

impl FeatureFamilies for CsvFeatureFamilies {
    fn properties_features(&self) -> Result<Vec<String>> {
        self.feature_columns(PROPERTIES_FILE, &[TARGET_COLUMN])
    }

    fn formula_features(&self) -> Result<Vec<String>> {
        self.feature_columns(FORMULA_FILE, &[TARGET_COLUMN, MATERIAL_COLUMN])
    }
}

fn read_headers(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        Error::MissingResource(format!("cannot open {}: {e}", path.display()))
    })?;
    let headers = reader.headers().map_err(|e| {
        Error::MissingResource(format!("cannot read header of {}: {e}", path.display()))
    })?;
    Ok(headers.iter().map(str::to_string).collect())
}

/// Keeps only the properties features by dropping the formula family.
#[derive(Debug, Clone)]
pub struct OnlyProperties {
    families: Arc<dyn FeatureFamilies>,
}

impl OnlyProperties {
    /// Use the reference files under the default `data/` directory.
    #[must_use]
    pub fn new() -> Self {
        Self::with_families(Arc::new(CsvFeatureFamilies::default()))
    }

    /// Use the reference files under the configured data directory.
    #[must_use]
    pub fn from_config(config: &SearchConfig) -> Self {
        Self::with_families(Arc::new(CsvFeatureFamilies::from_config(config)))
    }

    /// Use a custom family provider.
    #[must_use]
    pub fn with_families(families: Arc<dyn FeatureFamilies>) -> Self {
        Self { families }
    }
}

impl Default for OnlyProperties {
    fn default() -> Self {
        Self::new()
    }
}

impl Transformer for OnlyProperties {
    fn fit(&mut self, _x: &Frame, _y: Option<&Array1<f64>>) -> Result<()> {
        Ok(())
    }

    fn transform(&self, x: &Frame) -> Result<Frame> {
        Ok(x.drop_columns(&self.families.formula_features()?))
    }

    fn set_param(&mut self, name: &str, _value: &ParamValue) -> Result<()> {
        Err(unknown_param("OnlyProperties", name))
    }

    fn box_clone(&self) -> Box<dyn Transformer> {
        Box::new(self.clone())
    }
}

/// Keeps only the formula features by dropping the properties family.
#[derive(Debug, Clone)]
pub struct OnlyFormula {
    families: Arc<dyn FeatureFamilies>,
}

impl OnlyFormula {
    /// Use the reference files under the default `data/` directory.
    #[must_use]
    pub fn new() -> Self {
        Self::with_families(Arc::new(CsvFeatureFamilies::default()))
    }

    /// Use the reference files under the configured data directory.
    #[must_use]
    pub fn from_config(config: &SearchConfig) -> Self {
        Self::with_families(Arc::new(CsvFeatureFamilies::from_config(config)))
    }

    /// Use a custom family provider.
    #[must_use]
    pub fn with_families(families: Arc<dyn FeatureFamilies>) -> Self {
        Self { families }
    }
}

impl Default for OnlyFormula {
    fn default() -> Self {
        Self::new()
    }
}

impl Transformer for OnlyFormula {
    fn fit(&mut self, _x: &Frame, _y: Option<&Array1<f64>>) -> Result<()> {
        Ok(())
    }

    fn transform(&self, x: &Frame) -> Result<Frame> {
        Ok(x.drop_columns(&self.families.properties_features()?))
    }

    fn set_param(&mut self, name: &str, _value: &ParamValue) -> Result<()> {
        Err(unknown_param("OnlyFormula", name))
    }

    fn box_clone(&self) -> Box<dyn Transformer> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::fs;

    fn write_reference_files(dir: &Path) {
        fs::write(
            dir.join(PROPERTIES_FILE),
            "mean_mass,mean_radius,critical_temp\n1,2,3\n",
        )
        .unwrap();
        fs::write(
            dir.join(FORMULA_FILE),
            "H,O,critical_temp,material\n1,2,3,H2O\n",
        )
        .unwrap();
    }

    fn merged() -> Frame {
        Frame::new(
            ["mean_mass", "mean_radius", "H", "O"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            array![[1.0, 2.0, 3.0, 4.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_only_properties() {
        let dir = tempfile::tempdir().unwrap();
        write_reference_files(dir.path());
        let step = OnlyProperties::with_families(Arc::new(CsvFeatureFamilies::new(dir.path())));
        let out = step.transform(&merged()).unwrap();
        assert_eq!(out.columns(), &["mean_mass", "mean_radius"]);
    }

    #[test]
    fn test_only_formula() {
        let dir = tempfile::tempdir().unwrap();
        write_reference_files(dir.path());
        let step = OnlyFormula::with_families(Arc::new(CsvFeatureFamilies::new(dir.path())));
        let out = step.transform(&merged()).unwrap();
        assert_eq!(out.columns(), &["H", "O"]);
    }

    #[test]
    fn test_steps_read_configured_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_reference_files(dir.path());
        let config = SearchConfig::builder().data_dir(dir.path()).build().unwrap();

        assert_eq!(CsvFeatureFamilies::from_config(&config).data_dir(), dir.path());
        let properties = OnlyProperties::from_config(&config).transform(&merged()).unwrap();
        assert_eq!(properties.columns(), &["mean_mass", "mean_radius"]);
        let formula = OnlyFormula::from_config(&config).transform(&merged()).unwrap();
        assert_eq!(formula.columns(), &["H", "O"]);
    }

    #[test]
    fn test_default_families_use_default_data_dir() {
        assert_eq!(
            CsvFeatureFamilies::default().data_dir(),
            Path::new(DEFAULT_DATA_DIR)
        );
    }

    #[test]
    fn test_missing_reference_file() {
        let dir = tempfile::tempdir().unwrap();
        let step = OnlyFormula::with_families(Arc::new(CsvFeatureFamilies::new(dir.path())));
        assert!(matches!(
            step.transform(&merged()),
            Err(Error::MissingResource(_))
        ));
    }

    #[test]
    fn test_missing_id_column() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(FORMULA_FILE), "H,O,critical_temp\n1,2,3\n").unwrap();
        let families = CsvFeatureFamilies::new(dir.path());
        assert!(matches!(
            families.formula_features(),
            Err(Error::MissingResource(_))
        ));
    }
}
