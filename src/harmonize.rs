//! The `harmonize` command: mapping in, batch in, loaded dataset out.

use anyhow::{Context, Result, anyhow};
use log::info;

use crate::{
    batch::TabularBatch,
    cli::HarmonizeArgs,
    io_utils,
    mapping::SchemaMapping,
    pipeline,
    sink::{CsvSink, LoadSink},
    table,
};

pub fn execute(args: &HarmonizeArgs) -> Result<()> {
    if args.preview && args.output.is_some() {
        return Err(anyhow!("--preview cannot be combined with --output"));
    }
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    info!(
        "Harmonizing '{}' with mapping {:?} (delimiter '{}')",
        args.input.display(),
        args.mapping,
        io_utils::printable_delimiter(delimiter)
    );

    let mapping = SchemaMapping::load(&args.mapping)?;
    let batch = TabularBatch::from_csv_path(&args.input, delimiter, encoding)
        .with_context(|| format!("Reading input batch from {:?}", args.input))?;
    info!(
        "Loaded {} row(s) across {} column(s) from {:?}",
        batch.row_count(),
        batch.columns().len(),
        args.input
    );

    let outcome = pipeline::transform(&batch, &mapping)
        .with_context(|| format!("Transforming {:?}", args.input))?;

    if args.preview {
        let limit = args.limit.unwrap_or(10);
        let headers = outcome.dataset.headers();
        let rows: Vec<Vec<String>> = outcome
            .dataset
            .render_rows()
            .into_iter()
            .take(limit)
            .collect();
        table::print_table(&headers, &rows);
        info!(
            "Displayed {} of {} row(s), {} diagnostic(s)",
            rows.len(),
            outcome.dataset.row_count(),
            outcome.diagnostics.len()
        );
        return Ok(());
    }

    let output_delimiter =
        io_utils::resolve_output_delimiter(args.output.as_deref(), args.output_delimiter, delimiter);
    let mut sink = CsvSink::new(args.output.clone(), output_delimiter);
    sink.write(&outcome.dataset, &args.table)?;
    info!(
        "Harmonization finished with {} diagnostic(s)",
        outcome.diagnostics.len()
    );
    Ok(())
}
