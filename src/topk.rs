//! Top-K row selection on result batches
//!
//! Ranking a result table by R² only needs the best few rows, so selection keeps a
//! bounded heap of size K instead of sorting everything: O(N log K) time, O(K) space.
//! When K covers the whole batch the rows are fully sorted instead.
//!
//! Higher values rank first and ties keep the earlier row first. Null and NaN values
//! never outrank a number; they fill the tail in their original order when K exceeds
//! the ranked rows.

use crate::Error;
use arrow::array::{Array, ArrayRef, Float64Array, UInt32Array};
use arrow::compute::take;
use arrow::record_batch::RecordBatch;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Trait for Top-K selection on record batches
pub trait TopKSelection {
    /// Select the `k` rows with the highest values of a `Float64` column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `k` is zero, the column index is out of
    /// bounds, or the column is not `Float64`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pipegrid::topk::TopKSelection;
    /// use arrow::array::{Float64Array, RecordBatch};
    /// use arrow::datatypes::{DataType, Field, Schema};
    /// use std::sync::Arc;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let schema = Arc::new(Schema::new(vec![Field::new("R2", DataType::Float64, false)]));
    /// let batch = RecordBatch::try_new(
    ///     schema,
    ///     vec![Arc::new(Float64Array::from(vec![0.5, 0.9, 0.7]))],
    /// )?;
    ///
    /// let best = batch.top_k(0, 1)?;
    /// assert_eq!(best.num_rows(), 1);
    /// # Ok(())
    /// # }
    /// ```
    fn top_k(&self, column_index: usize, k: usize) -> crate::Result<RecordBatch>;

    /// Select the top `k` rows by a column looked up by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the column does not exist, plus the errors
    /// of [`TopKSelection::top_k`].
    fn top_k_by_name(&self, column: &str, k: usize) -> crate::Result<RecordBatch>;
}

impl TopKSelection for RecordBatch {
    fn top_k(&self, column_index: usize, k: usize) -> crate::Result<RecordBatch> {
        if k == 0 {
            return Err(Error::InvalidInput("k must be greater than 0".to_string()));
        }

        if column_index >= self.num_columns() {
            return Err(Error::InvalidInput(format!(
                "Column index {} out of bounds (batch has {} columns)",
                column_index,
                self.num_columns()
            )));
        }

        let keys = column_keys(self.column(column_index))?;
        let indices = if k >= self.num_rows() {
            sort_all_rows(&keys)
        } else {
            select_top_k_indices(&keys, k)
        };

        build_batch_from_indices(self, &indices)
    }

    fn top_k_by_name(&self, column: &str, k: usize) -> crate::Result<RecordBatch> {
        let index = self
            .schema()
            .index_of(column)
            .map_err(|_| Error::InvalidInput(format!("Column '{column}' not found")))?;
        self.top_k(index, k)
    }
}

/// Sort keys of a score column; `None` marks null and NaN rows.
fn column_keys(column: &ArrayRef) -> crate::Result<Vec<Option<f64>>> {
    let array = column
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| {
            Error::InvalidInput(format!(
                "Top-K not supported for data type: {:?}",
                column.data_type()
            ))
        })?;
    Ok(array
        .iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

/// Heap entry ordered so that the heap top is the weakest kept row.
#[derive(Debug)]
struct HeapItem {
    value: f64,
    index: usize,
}

impl HeapItem {
    /// How strongly this item ranks; greater is better.
    fn rank(&self, other: &Self) -> Ordering {
        // earlier rows win ties
        self.value
            .total_cmp(&other.value)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialEq for HeapItem {
    fn eq(&self, other: &Self) -> bool {
        self.rank(other) == Ordering::Equal
    }
}

impl Eq for HeapItem {}

impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // weakest on top
        other.rank(self)
    }
}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Select top K indices with a bounded heap.
fn select_top_k_indices(keys: &[Option<f64>], k: usize) -> Vec<usize> {
    let mut heap: BinaryHeap<HeapItem> = BinaryHeap::with_capacity(k);
    for (index, key) in keys.iter().enumerate() {
        let Some(value) = *key else { continue };
        let item = HeapItem { value, index };
        if heap.len() < k {
            heap.push(item);
        } else if let Some(top) = heap.peek() {
            if item.rank(top) == Ordering::Greater {
                heap.pop();
                heap.push(item);
            }
        }
    }

    let mut result = heap.into_vec();
    result.sort_by(|a, b| b.rank(a));
    let mut indices: Vec<usize> = result.into_iter().map(|item| item.index).collect();
    fill_with_unranked(keys, &mut indices, k);
    indices
}

/// Full sort when k covers every row.
fn sort_all_rows(keys: &[Option<f64>]) -> Vec<usize> {
    let mut ranked: Vec<usize> = (0..keys.len()).filter(|&i| keys[i].is_some()).collect();
    // stable, so equal values keep row order
    ranked.sort_by(|&a, &b| {
        let (x, y) = (keys[a].unwrap_or(f64::NAN), keys[b].unwrap_or(f64::NAN));
        y.total_cmp(&x)
    });
    fill_with_unranked(keys, &mut ranked, keys.len());
    ranked
}

fn fill_with_unranked(keys: &[Option<f64>], indices: &mut Vec<usize>, k: usize) {
    let missing = k.saturating_sub(indices.len());
    indices.extend(
        keys.iter()
            .enumerate()
            .filter(|(_, key)| key.is_none())
            .map(|(i, _)| i)
            .take(missing),
    );
}

/// Build a new record batch from selected row indices.
///
/// Works for every column type, nulls included.
///
/// # Errors
///
/// Returns an error if an index does not fit in `u32` or the take fails.
pub fn build_batch_from_indices(batch: &RecordBatch, indices: &[usize]) -> crate::Result<RecordBatch> {
    let positions = indices
        .iter()
        .map(|&i| {
            u32::try_from(i).map_err(|_| Error::InvalidInput(format!("Row index {i} exceeds u32")))
        })
        .collect::<crate::Result<Vec<u32>>>()?;
    let positions = UInt32Array::from(positions);

    let columns = batch
        .columns()
        .iter()
        .map(|column| take(column.as_ref(), &positions, None))
        .collect::<std::result::Result<Vec<ArrayRef>, _>>()?;

    RecordBatch::try_new(batch.schema(), columns)
        .map_err(|e| Error::StorageError(format!("Failed to create result batch: {e}")))
}
