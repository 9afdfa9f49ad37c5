use anyhow::{Context, Result};
use log::info;

use crate::{batch::TabularBatch, cli::PreviewArgs, io_utils, table};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let batch = TabularBatch::from_csv_path(&args.input, delimiter, encoding)
        .with_context(|| format!("Reading {:?}", args.input))?;
    let rows = batch.render_rows(args.rows);
    table::print_table(batch.columns(), &rows);
    info!("Displayed {} row(s) from {:?}", rows.len(), args.input);
    Ok(())
}
