//! Persisted results of tested combinations
//!
//! A result store is a flat table with one row per evaluated [`Combination`]:
//! `tag`, `MSE`, `R2`, then one column per parameter key ever written. Columns a row
//! does not use are null.
//!
//! # Example
//!
//! ```rust
//! use pipegrid::store::{MemoryResultStore, ResultStore};
//!
//! let store = MemoryResultStore::new();
//! assert!(store.load()?.is_empty());
//! # Ok::<(), pipegrid::Error>(())
//! ```

mod file;
mod memory;
mod table;

pub use file::CsvResultStore;
pub use memory::MemoryResultStore;
pub use table::{
    is_score_column, Cell, ComparableRow, ResultRecord, ResultTable, MSE_COLUMN, R2_COLUMN,
    TAG_COLUMN,
};

use std::path::Path;

use tracing::warn;

use crate::combination::Combination;
use crate::Result;

/// Storage backend for evaluated combinations.
pub trait ResultStore: Send + Sync {
    /// Read every stored row.
    ///
    /// An absent store is an empty table.
    ///
    /// # Errors
    ///
    /// Returns an error if existing contents cannot be read or parsed.
    fn load(&self) -> Result<ResultTable>;

    /// Add one row, extending the schema with any new parameter columns.
    ///
    /// # Errors
    ///
    /// Returns an error if existing contents cannot be parsed (they are never
    /// overwritten) or the write fails.
    fn append(&self, record: &ResultRecord) -> Result<()>;

    /// Whether an equivalent configuration has already been stored.
    ///
    /// Unreadable contents count as "no prior results".
    fn already_tested(&self, combination: &Combination) -> bool {
        match self.load() {
            Ok(table) => table.contains_comparable(&combination.as_comparable()),
            Err(err) => {
                warn!(error = %err, tag = combination.tag(), "Result store unreadable, treating as empty");
                false
            }
        }
    }
}

/// Whether the CSV store at `path` already holds an equivalent configuration.
///
/// A missing or malformed file yields `false`.
#[must_use]
pub fn combination_already_tested(path: impl AsRef<Path>, combination: &Combination) -> bool {
    CsvResultStore::new(path.as_ref()).already_tested(combination)
}
