//! In-memory backend. Contents are lost when the store is dropped.

use std::sync::RwLock;

use super::{ResultRecord, ResultStore, ResultTable};
use crate::{Error, Result};

/// Result store kept in memory, for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryResultStore {
    table: RwLock<ResultTable>,
}

impl MemoryResultStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with an existing table.
    #[must_use]
    pub fn with_table(table: ResultTable) -> Self {
        Self {
            table: RwLock::new(table),
        }
    }

    /// Number of stored rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.read().map_or(0, |t| t.len())
    }

    /// Whether no rows are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> Error {
    Error::StorageError("result table lock poisoned".to_string())
}

impl ResultStore for MemoryResultStore {
    fn load(&self) -> Result<ResultTable> {
        self.table.read().map(|t| t.clone()).map_err(|_| poisoned())
    }

    fn append(&self, record: &ResultRecord) -> Result<()> {
        self.table
            .write()
            .map_err(|_| poisoned())?
            .push_record(record);
        Ok(())
    }
}
