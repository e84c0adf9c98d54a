//! Command-line interface for keydiff

use crate::config::Strategy;
use crate::output::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "keydiff")]
#[command(about = "Find records in a new snapshot whose identity key is absent from an old one")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Emit the new-only records of NEW relative to OLD
    Diff {
        /// Old snapshot (file or directory)
        #[arg(long)]
        old: PathBuf,

        /// New snapshot (file or directory)
        #[arg(long)]
        new: PathBuf,

        /// Write the new-only records here (format from the extension)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write a JSON run summary here
        #[arg(long)]
        summary: Option<PathBuf>,

        /// JSON file with key and strategy settings
        #[arg(long)]
        config: Option<PathBuf>,

        /// Lookup strategy: "single" or "partitioned"
        #[arg(long, value_parser = Strategy::parse)]
        strategy: Option<Strategy>,

        /// Fingerprint bits used to pick a partition
        #[arg(long)]
        partition_bits: Option<u8>,

        /// Batch size for processing rows (must be > 0)
        #[arg(long, value_parser = validate_batch_size)]
        batch_size: Option<usize>,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty", value_parser = OutputFormat::parse)]
        format: OutputFormat,
    },

    /// Print identity keys and fingerprints of a snapshot
    Keys {
        /// Input file or directory path
        input: PathBuf,

        /// Maximum number of keys to print
        #[arg(long, default_value = "10")]
        limit: usize,

        /// JSON file with key settings
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty", value_parser = OutputFormat::parse)]
        format: OutputFormat,
    },

    /// Write a synthetic address snapshot
    Generate {
        /// Output file path
        output: PathBuf,

        /// Number of rows to generate
        #[arg(long)]
        rows: usize,

        /// Seed for reproducible output
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Value of the as_of_date column (defaults to today)
        #[arg(long)]
        as_of_date: Option<String>,
    },
}

/// Validate that batch size is greater than 0
fn validate_batch_size(s: &str) -> Result<usize, String> {
    let batch_size: usize = s
        .parse()
        .map_err(|_| format!("Invalid batch size: '{}'. Must be a positive integer.", s))?;

    if batch_size == 0 {
        return Err("Batch size must be greater than 0".to_string());
    }

    Ok(batch_size)
}
