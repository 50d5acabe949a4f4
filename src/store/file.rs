//! CSV file backend

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{ResultRecord, ResultStore, ResultTable};
use crate::{Error, Result};

/// Result store backed by a single CSV file.
///
/// Each append reads the whole file, adds the row and rewrites it through a sibling
/// temporary file followed by a rename. There is no locking: two processes appending
/// to the same path can lose rows.
#[derive(Debug, Clone)]
pub struct CsvResultStore {
    path: PathBuf,
}

impl CsvResultStore {
    /// Store at `path`. Nothing is touched until the first load or append.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the backing file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let name = self
            .path
            .file_name()
            .ok_or_else(|| {
                Error::StorageError(format!("{} has no file name", self.path.display()))
            })?
            .to_string_lossy();
        Ok(self.path.with_file_name(format!(".{name}.tmp")))
    }

    fn write(&self, table: &ResultTable) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let temp = self.temp_path()?;
        table.write_csv(BufWriter::new(File::create(&temp)?))?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

impl ResultStore for CsvResultStore {
    fn load(&self) -> Result<ResultTable> {
        if !self.exists() {
            return Ok(ResultTable::new());
        }
        let file = File::open(&self.path)?;
        ResultTable::read_csv(BufReader::new(file))
    }

    fn append(&self, record: &ResultRecord) -> Result<()> {
        let mut table = self.load()?;
        table.push_record(record);
        self.write(&table)?;
        debug!(
            path = %self.path.display(),
            rows = table.len(),
            columns = table.columns().len(),
            "Appended result row"
        );
        Ok(())
    }
}
