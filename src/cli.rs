use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::suggest::DEFAULT_SAMPLE_ROWS;

#[derive(Debug, Parser)]
#[command(author, version, about = "Harmonize CSV datasets against a schema mapping", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Probe a CSV file and suggest a schema mapping (.json)
    Suggest(SuggestArgs),
    /// Validate a schema mapping document, optionally against a CSV file
    Check(CheckArgs),
    /// Transform a CSV file through a schema mapping and load the result
    Harmonize(HarmonizeArgs),
    /// Preview the first few rows of a CSV file in a formatted table
    Preview(PreviewArgs),
}

#[derive(Debug, Args)]
pub struct SuggestArgs {
    /// Input CSV file to inspect
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Destination mapping file path (.json)
    #[arg(short, long)]
    pub mapping: PathBuf,
    /// Number of rows to sample per column (0 means full scan)
    #[arg(long, default_value_t = DEFAULT_SAMPLE_ROWS)]
    pub sample_rows: usize,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Schema mapping file to validate
    #[arg(short, long)]
    pub mapping: PathBuf,
    /// CSV file to check the mapping's source columns against
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct HarmonizeArgs {
    /// Input CSV file to transform
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Schema mapping file driving the transformation
    #[arg(short, long)]
    pub mapping: PathBuf,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Logical destination name reported for the load
    #[arg(long = "table", default_value = "harmonized_data")]
    pub table: String,
    /// Render the first rows as a table instead of writing output
    #[arg(long)]
    pub preview: bool,
    /// Maximum number of rows shown with --preview
    #[arg(long)]
    pub limit: Option<usize>,
    /// CSV delimiter character for the input
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// CSV delimiter character for the output (defaults from the output path)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Input CSV file to display
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
