//! In-memory result table with schema union and duplicate lookup

use std::io::{Read, Write};

use crate::combination::Scores;
use crate::params::ParamSet;
use crate::Result;

/// Column holding the pipe tag.
pub const TAG_COLUMN: &str = "tag";
/// Column holding the test MSE.
pub const MSE_COLUMN: &str = "MSE";
/// Column holding the test R².
pub const R2_COLUMN: &str = "R2";

/// Whether a column holds a score rather than part of a configuration.
#[must_use]
pub fn is_score_column(name: &str) -> bool {
    name == MSE_COLUMN || name == R2_COLUMN
}

/// One table cell; `None` is an absent (null) value.
pub type Cell = Option<String>;

/// One evaluated combination, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    tag: String,
    scores: Scores,
    parameters: ParamSet,
}

impl ResultRecord {
    /// Create a record.
    #[must_use]
    pub const fn new(tag: String, scores: Scores, parameters: ParamSet) -> Self {
        Self {
            tag,
            scores,
            parameters,
        }
    }

    /// Pipe tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Test scores.
    #[must_use]
    pub const fn scores(&self) -> Scores {
        self.scores
    }

    /// `(column, value)` pairs: tag, MSE, R2, then parameters in order.
    #[must_use]
    pub fn cells(&self) -> Vec<(String, String)> {
        let mut cells = vec![
            (TAG_COLUMN.to_string(), self.tag.clone()),
            (MSE_COLUMN.to_string(), self.scores.mse.to_string()),
            (R2_COLUMN.to_string(), self.scores.r2.to_string()),
        ];
        cells.extend(
            self.parameters
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        );
        cells
    }
}

/// The comparable projection of a combination: tag plus parameters, with explicit
/// "no value" parameters rendered as the `'None'` sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparableRow {
    cells: Vec<(String, String)>,
}

impl ComparableRow {
    /// Project a tag and its parameters.
    #[must_use]
    pub fn new(tag: &str, parameters: &ParamSet) -> Self {
        let mut cells = vec![(TAG_COLUMN.to_string(), tag.to_string())];
        cells.extend(parameters.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        Self { cells }
    }

    /// Column names of the projection.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(c, _)| c.as_str())
    }

    /// Value of a column, `None` when the projection does not have it.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }
}

/// A rectangular table of optional string cells.
///
/// Cells are kept exactly as read, which keeps comparisons free of numeric
/// re-formatting (`1` vs `1.0`) and NaN-inequality issues.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl ResultTable {
    /// Empty table with no columns.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Column names in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows, each with one cell per column.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell value, `None` for null cells or unknown columns.
    #[must_use]
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row)?.get(col)?.as_deref()
    }

    fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(None);
        }
        self.columns.len() - 1
    }

    /// Append a record, adding any column it introduces.
    ///
    /// Earlier rows get null cells in new columns; the record gets null cells in
    /// columns it does not have.
    pub fn push_record(&mut self, record: &ResultRecord) {
        let cells = record.cells();
        let positions: Vec<usize> = cells.iter().map(|(c, _)| self.ensure_column(c)).collect();
        let mut row: Vec<Cell> = vec![None; self.columns.len()];
        for (pos, (_, value)) in positions.into_iter().zip(cells) {
            row[pos] = Some(value);
        }
        self.rows.push(row);
    }

    /// Whether some row matches the projection on every non-score column.
    ///
    /// A table that lacks any of the projection's columns never matches. Columns the
    /// projection does not carry only match null cells.
    #[must_use]
    pub fn contains_comparable(&self, candidate: &ComparableRow) -> bool {
        if candidate.columns().any(|c| self.column_index(c).is_none()) {
            return false;
        }
        let compared: Vec<(usize, Option<&str>)> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| !is_score_column(c))
            .map(|(i, c)| (i, candidate.get(c)))
            .collect();

        self.rows.iter().any(|row| {
            compared
                .iter()
                .all(|(i, expected)| row[*i].as_deref() == *expected)
        })
    }

    /// Parse CSV with a header row. Empty fields become null cells.
    ///
    /// # Errors
    ///
    /// Returns a CSV error on malformed input (e.g. ragged rows).
    pub fn read_csv<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let columns: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(
                record
                    .iter()
                    .map(|v| if v.is_empty() { None } else { Some(v.to_string()) })
                    .collect(),
            );
        }
        Ok(Self { columns, rows })
    }

    /// Write CSV with a header row. Null cells are written empty.
    ///
    /// # Errors
    ///
    /// Returns a CSV or IO error if writing fails.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.columns)?;
        for row in &self.rows {
            csv_writer.write_record(row.iter().map(|c| c.as_deref().unwrap_or("")))?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}
