//! Load sinks: where a finished dataset goes.
//!
//! A sink accepts one dataset for one named destination in one blocking
//! write, under replace semantics: whatever the destination held before is
//! superseded. The transformation engine never retries and never spans
//! multiple sink calls; a failure is surfaced verbatim as [`LoadError`].

use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;
use thiserror::Error;

use crate::{io_utils, pipeline::Dataset};

#[derive(Debug, Error)]
#[error("loading dataset into '{target}' failed: {cause}")]
pub struct LoadError {
    pub target: String,
    pub cause: anyhow::Error,
}

pub trait LoadSink {
    fn write(&mut self, dataset: &Dataset, target_name: &str) -> Result<(), LoadError>;
}

/// Writes the dataset as a delimited file, or to stdout when no path (or `-`)
/// is given. Creating the file truncates any previous content, which is the
/// replace contract.
#[derive(Debug, Clone)]
pub struct CsvSink {
    output: Option<PathBuf>,
    delimiter: u8,
}

impl CsvSink {
    pub fn new(output: Option<PathBuf>, delimiter: u8) -> Self {
        Self { output, delimiter }
    }

    fn write_inner(&mut self, dataset: &Dataset) -> Result<()> {
        let mut writer = io_utils::open_csv_writer(self.output.as_deref(), self.delimiter)?;
        writer
            .write_record(dataset.headers())
            .context("Writing header row")?;
        for (row_idx, row) in dataset.render_rows().into_iter().enumerate() {
            writer
                .write_record(&row)
                .with_context(|| format!("Writing output row {}", row_idx + 1))?;
        }
        writer.flush().context("Flushing output")?;
        Ok(())
    }
}

impl LoadSink for CsvSink {
    fn write(&mut self, dataset: &Dataset, target_name: &str) -> Result<(), LoadError> {
        self.write_inner(dataset).map_err(|cause| LoadError {
            target: target_name.to_string(),
            cause,
        })?;
        info!(
            "Dataset loaded into '{}' ({} row(s), {} column(s))",
            target_name,
            dataset.row_count(),
            dataset.columns().len()
        );
        Ok(())
    }
}
