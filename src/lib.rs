pub mod batch;
pub mod cli;
pub mod coerce;
pub mod constraints;
pub mod data;
pub mod harmonize;
pub mod io_utils;
pub mod mapping;
pub mod pipeline;
pub mod preview;
pub mod sink;
pub mod suggest;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use itertools::Itertools;
use log::{LevelFilter, info, warn};

use crate::{
    batch::TabularBatch,
    cli::{CheckArgs, Cli, Commands, SuggestArgs},
    mapping::SchemaMapping,
    suggest::{MappingOracle, TypeProbe},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_harmonize", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Suggest(args) => handle_suggest(&args),
        Commands::Check(args) => handle_check(&args),
        Commands::Harmonize(args) => harmonize::execute(&args),
        Commands::Preview(args) => preview::execute(&args),
    }
}

fn handle_suggest(args: &SuggestArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    info!(
        "Probing '{}' with delimiter '{}'",
        args.input.display(),
        io_utils::printable_delimiter(delimiter)
    );
    let batch = TabularBatch::from_csv_path(&args.input, delimiter, encoding)
        .with_context(|| format!("Reading sample rows from {:?}", args.input))?;
    let probe = TypeProbe {
        sample_rows: args.sample_rows,
    };
    let mapping = probe
        .suggest(&batch)
        .with_context(|| format!("Suggesting a mapping for {:?}", args.input))?;
    mapping
        .save(&args.mapping)
        .with_context(|| format!("Writing mapping to {:?}", args.mapping))?;
    info!(
        "Suggested mapping for {} column(s) written to {:?}",
        mapping.len(),
        args.mapping
    );
    Ok(())
}

fn handle_check(args: &CheckArgs) -> Result<()> {
    let mapping = SchemaMapping::load(&args.mapping)?;
    mapping
        .validate()
        .with_context(|| format!("Validating mapping {:?}", args.mapping))?;
    info!(
        "Mapping {:?} is valid ({} column(s))",
        args.mapping,
        mapping.len()
    );
    if let Some(input) = &args.input {
        let delimiter = io_utils::resolve_input_delimiter(input, args.delimiter);
        let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
        let batch = TabularBatch::from_csv_path(input, delimiter, encoding)
            .with_context(|| format!("Reading {input:?}"))?;
        let missing: Vec<&str> = mapping
            .sources()
            .filter(|source| !batch.has_column(source))
            .collect();
        if missing.is_empty() {
            info!("{input:?} provides every mapped source column");
        } else {
            warn!(
                "{input:?} is missing mapped source column(s): {}",
                missing.iter().join(", ")
            );
        }
    }
    Ok(())
}
