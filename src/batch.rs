//! In-memory raw tabular batch.
//!
//! A [`TabularBatch`] is the untyped input to the transformation pipeline: an
//! ordered nominal column set plus one cell per row and column, where a cell
//! is either text or null. Batches are read fully into memory before any
//! transformation begins (the engine does not stream) and are discarded
//! after the output dataset is produced.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use encoding_rs::Encoding;

use crate::io_utils;

#[derive(Debug, Clone, Default)]
pub struct TabularBatch {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl TabularBatch {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a batch from pre-aligned rows. Every row must have one cell per
    /// column; a missing value is an explicit `None`.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Result<Self> {
        let mut batch = Self::new(columns);
        for row in rows {
            batch.push_row(row)?;
        }
        Ok(batch)
    }

    pub fn push_row(&mut self, row: Vec<Option<String>>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(anyhow!(
                "Row has {} cell(s) but the batch defines {} column(s)",
                row.len(),
                self.columns.len()
            ));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Reads a delimited file in full. Empty fields become null cells.
    pub fn from_csv_path(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Self> {
        let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
        let columns = io_utils::reader_headers(&mut reader, encoding)?;
        let mut batch = Self::new(columns);
        for (idx, record) in reader.byte_records().enumerate() {
            let record =
                record.with_context(|| format!("Reading row {} in {path:?}", idx + 2))?;
            let decoded = io_utils::decode_record(&record, encoding)?;
            let row = decoded
                .into_iter()
                .map(|field| if field.is_empty() { None } else { Some(field) })
                .collect();
            batch.push_row(row)?;
        }
        Ok(batch)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Extracts one cell per row for the named column, or `None` when the
    /// batch has no such column.
    pub fn column_cells(&self, name: &str) -> Option<Vec<Option<&str>>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row[idx].as_deref())
                .collect(),
        )
    }

    /// First `limit` rows rendered for display; null cells render empty.
    pub fn render_rows(&self, limit: usize) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .take(limit)
            .map(|row| {
                row.iter()
                    .map(|cell| cell.clone().unwrap_or_default())
                    .collect()
            })
            .collect()
    }
}
