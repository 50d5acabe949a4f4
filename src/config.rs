//! Search configuration
//!
//! ```rust
//! use pipegrid::SearchConfig;
//!
//! let config = SearchConfig::builder()
//!     .output_dir("results")
//!     .cv_folds(5)
//!     .build()?;
//! assert!(config.result_path("tree").ends_with("tree_output.csv"));
//! # Ok::<(), pipegrid::Error>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default directory for result stores.
pub const DEFAULT_OUTPUT_DIR: &str = "output/";
/// Default directory for reference dataset files.
pub const DEFAULT_DATA_DIR: &str = "data/";
/// Default number of cross-validation folds.
pub const DEFAULT_CV_FOLDS: usize = 3;

/// Settings for one grid-search run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    output_dir: PathBuf,
    cv_folds: usize,
    save_results: bool,
    n_jobs: Option<usize>,
    data_dir: PathBuf,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            cv_folds: DEFAULT_CV_FOLDS,
            save_results: true,
            n_jobs: None,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

impl SearchConfig {
    /// Create a config builder
    #[must_use]
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }

    /// Load a JSON config file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, [`Error::Config`] if it is
    /// not valid JSON for this shape, or [`Error::InvalidInput`] for invalid values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            Error::Config(format!("{}: {e}", path.as_ref().display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check value constraints.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `cv_folds < 2` or `n_jobs == Some(0)`.
    pub fn validate(&self) -> Result<()> {
        if self.cv_folds < 2 {
            return Err(Error::InvalidInput(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        if self.n_jobs == Some(0) {
            return Err(Error::InvalidInput("n_jobs must be positive".to_string()));
        }
        Ok(())
    }

    /// Directory holding result stores.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Number of cross-validation folds.
    #[must_use]
    pub const fn cv_folds(&self) -> usize {
        self.cv_folds
    }

    /// Whether results are persisted and previously tested combinations skipped.
    #[must_use]
    pub const fn save_results(&self) -> bool {
        self.save_results
    }

    /// Worker limit for cross-validation; `None` uses every core.
    #[must_use]
    pub const fn n_jobs(&self) -> Option<usize> {
        self.n_jobs
    }

    /// Directory holding reference dataset files, read by the `from_config`
    /// constructors in [`crate::steps`].
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Store path for an estimator: `<output_dir>/<estimator_tag>_output.csv`.
    #[must_use]
    pub fn result_path(&self, estimator_tag: &str) -> PathBuf {
        self.output_dir.join(format!("{estimator_tag}_output.csv"))
    }
}

/// Builder for [`SearchConfig`]
#[derive(Debug, Default)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    /// Set the result store directory
    #[must_use]
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Set the number of cross-validation folds
    #[must_use]
    pub const fn cv_folds(mut self, folds: usize) -> Self {
        self.config.cv_folds = folds;
        self
    }

    /// Enable or disable persistence and duplicate skipping
    #[must_use]
    pub const fn save_results(mut self, save: bool) -> Self {
        self.config.save_results = save;
        self
    }

    /// Limit cross-validation workers
    #[must_use]
    pub const fn n_jobs(mut self, jobs: Option<usize>) -> Self {
        self.config.n_jobs = jobs;
        self
    }

    /// Set the reference dataset directory
    #[must_use]
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = dir.into();
        self
    }

    /// Build the config
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a value is out of range
    pub fn build(self) -> Result<SearchConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.cv_folds(), 3);
        assert!(config.save_results());
        assert_eq!(config.n_jobs(), None);
        assert_eq!(config.result_path("lr"), PathBuf::from("output/lr_output.csv"));
    }

    #[test]
    fn test_builder_rejects_single_fold() {
        assert!(matches!(
            SearchConfig::builder().cv_folds(1).build(),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_from_json_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("search.json");
        fs::write(&path, r#"{"cv_folds": 5, "save_results": false}"#).unwrap();
        let config = SearchConfig::from_json_file(&path).unwrap();
        assert_eq!(config.cv_folds(), 5);
        assert!(!config.save_results());
        assert_eq!(config.data_dir(), Path::new("data/"));
    }

    #[test]
    fn test_from_json_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("search.json");
        fs::write(&path, "{cv_folds: }").unwrap();
        assert!(matches!(SearchConfig::from_json_file(&path), Err(Error::Config(_))));
    }
}
