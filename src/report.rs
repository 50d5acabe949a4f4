//! Reporting over stored results
//!
//! Result tables are converted to Arrow [`RecordBatch`]es (`tag` and parameter
//! columns as nullable `Utf8`, `MSE`/`R2` as `Float64`) and ranked with
//! [`TopKSelection`].

use std::fmt::Write as _;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::store::{is_score_column, ResultTable, MSE_COLUMN, R2_COLUMN, TAG_COLUMN};
use crate::topk::{build_batch_from_indices, TopKSelection};
use crate::{Error, Result};

/// Distinct values of one column among the best rows, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnValues {
    /// Column name
    pub column: String,
    /// Distinct values; `None` is a null cell
    pub values: Vec<Option<String>>,
}

/// Convert a result table to an Arrow batch.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if a score cell is not a number.
pub fn table_to_batch(table: &ResultTable) -> Result<RecordBatch> {
    let mut fields = Vec::with_capacity(table.columns().len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.columns().len());

    for (col, name) in table.columns().iter().enumerate() {
        let cells = table.rows().iter().map(|row| row[col].as_deref());
        if is_score_column(name) {
            let values = cells
                .enumerate()
                .map(|(row, cell)| {
                    cell.map(|v| {
                        v.parse::<f64>().map_err(|_| {
                            Error::InvalidInput(format!(
                                "row {row}: column '{name}' holds non-numeric value '{v}'"
                            ))
                        })
                    })
                    .transpose()
                })
                .collect::<Result<Vec<Option<f64>>>>()?;
            fields.push(Field::new(name.as_str(), DataType::Float64, true));
            arrays.push(Arc::new(Float64Array::from(values)));
        } else {
            fields.push(Field::new(name.as_str(), DataType::Utf8, true));
            arrays.push(Arc::new(StringArray::from(cells.collect::<Vec<_>>())));
        }
    }

    if fields.is_empty() {
        return Ok(RecordBatch::new_empty(Arc::new(Schema::empty())));
    }
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

/// Move `tag`, `R2` and `MSE` to the front, keeping the order of the other columns.
///
/// # Errors
///
/// Returns an Arrow error if the projection fails.
pub fn reorder_score_columns(batch: &RecordBatch) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut order: Vec<usize> = [TAG_COLUMN, R2_COLUMN, MSE_COLUMN]
        .iter()
        .filter_map(|name| schema.index_of(name).ok())
        .collect();
    let rest: Vec<usize> = (0..schema.fields().len())
        .filter(|i| !order.contains(i))
        .collect();
    order.extend(rest);
    Ok(batch.project(&order)?)
}

/// Best `n` rows by R², descending, with columns ordered `tag, R2, MSE, ...`.
///
/// An empty table yields an empty batch.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if `n` is zero, the table has no `R2` column,
/// or a score cell is not a number.
pub fn top_results(table: &ResultTable, n: usize) -> Result<RecordBatch> {
    if n == 0 {
        return Err(Error::InvalidInput("n must be greater than 0".to_string()));
    }
    let batch = table_to_batch(table)?;
    if batch.num_rows() == 0 {
        return Ok(batch);
    }
    let top = batch.top_k_by_name(R2_COLUMN, n)?;
    reorder_score_columns(&top)
}

/// Narrow the search space to the values used by the best `percentage` of runs.
///
/// Takes the `rows * percentage / 100` best rows by R² and returns, for every
/// non-score column, its distinct values in first-seen order (null included).
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if `percentage` exceeds 100 or there is no
/// `R2` column in a non-empty table.
pub fn best_hyperparameters(table: &ResultTable, percentage: usize) -> Result<Vec<ColumnValues>> {
    if percentage > 100 {
        return Err(Error::InvalidInput(format!(
            "percentage must be within 0..=100, got {percentage}"
        )));
    }
    let batch = table_to_batch(table)?;
    if batch.num_columns() == 0 {
        return Ok(Vec::new());
    }
    let take = batch.num_rows() * percentage / 100;
    let best = if take == 0 {
        build_batch_from_indices(&batch, &[])?
    } else {
        batch.top_k_by_name(R2_COLUMN, take)?
    };

    let schema = best.schema();
    let mut out = Vec::new();
    for (idx, field) in schema.fields().iter().enumerate() {
        if is_score_column(field.name()) {
            continue;
        }
        let array = best
            .column(idx)
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| Error::Other(format!("column '{}' is not Utf8", field.name())))?;
        let mut values: Vec<Option<String>> = Vec::new();
        for value in array.iter() {
            let value = value.map(str::to_string);
            if !values.contains(&value) {
                values.push(value);
            }
        }
        out.push(ColumnValues {
            column: field.name().clone(),
            values,
        });
    }
    Ok(out)
}

/// Render a batch as a captioned fixed-width text table. Floats print with four
/// decimals and nulls as empty cells.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for columns that are neither `Float64` nor `Utf8`.
pub fn render_report(batch: &RecordBatch, caption: &str) -> Result<String> {
    let schema = batch.schema();
    let headers: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();

    let mut columns: Vec<Vec<String>> = Vec::with_capacity(headers.len());
    for column in batch.columns() {
        let cells = if let Some(floats) = column.as_any().downcast_ref::<Float64Array>() {
            floats
                .iter()
                .map(|v| v.map_or_else(String::new, |x| format!("{x:.4}")))
                .collect()
        } else if let Some(strings) = column.as_any().downcast_ref::<StringArray>() {
            strings
                .iter()
                .map(|v| v.unwrap_or_default().to_string())
                .collect()
        } else {
            return Err(Error::InvalidInput(format!(
                "cannot render column of type {:?}",
                column.data_type()
            )));
        };
        columns.push(cells);
    }

    let widths: Vec<usize> = headers
        .iter()
        .zip(&columns)
        .map(|(h, cells)| cells.iter().map(String::len).chain([h.len()]).max().unwrap_or(0))
        .collect();

    let mut out = String::new();
    let _ = writeln!(out, "{caption}");
    let _ = writeln!(out, "{}", format_line(headers.iter().map(String::as_str), &widths));
    let _ = writeln!(
        out,
        "{}",
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-")
    );
    for row in 0..batch.num_rows() {
        let _ = writeln!(
            out,
            "{}",
            format_line(columns.iter().map(|c| c[row].as_str()), &widths)
        );
    }
    Ok(out)
}

fn format_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(c, &w)| format!("{c:<w$}"))
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_string()
}
