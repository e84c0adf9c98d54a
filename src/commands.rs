//! Command implementations for the keydiff CLI

use crate::cli::Commands;
use crate::config::{DiffConfig, Strategy};
use crate::data::DataProcessor;
use crate::error::{KeydiffError, Result};
use crate::generate::SnapshotGenerator;
use crate::hash::Fingerprint;
use crate::key::KeyComposer;
use crate::output::{DiffSummary, JsonFormatter, KeyRow, OutputFormat, PrettyPrinter};
use crate::progress::ProgressReporter;
use crate::puller::{DataPuller, Stage};
use std::path::Path;

/// Execute a command
pub fn execute_command(command: Commands) -> Result<()> {
    match command {
        Commands::Diff {
            old,
            new,
            output,
            summary,
            config,
            strategy,
            partition_bits,
            batch_size,
            format,
        } => {
            let overrides = DiffOverrides {
                strategy,
                partition_bits,
                batch_size,
            };
            diff_command(
                &old,
                &new,
                output.as_deref(),
                summary.as_deref(),
                config.as_deref(),
                overrides,
                format,
            )
        }
        Commands::Keys {
            input,
            limit,
            config,
            format,
        } => keys_command(&input, limit, config.as_deref(), format),
        Commands::Generate {
            output,
            rows,
            seed,
            as_of_date,
        } => generate_command(&output, rows, seed, as_of_date),
    }
}

/// Command-line settings that take precedence over the config file
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffOverrides {
    pub strategy: Option<Strategy>,
    pub partition_bits: Option<u8>,
    pub batch_size: Option<usize>,
}

impl DiffOverrides {
    pub fn apply(self, mut config: DiffConfig) -> Result<DiffConfig> {
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(bits) = self.partition_bits {
            config.partition_bits = bits;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Load both snapshots, keep the new-only rows and report them
fn diff_command(
    old_path: &Path,
    new_path: &Path,
    output_path: Option<&Path>,
    summary_path: Option<&Path>,
    config_path: Option<&Path>,
    overrides: DiffOverrides,
    format: OutputFormat,
) -> Result<()> {
    let config = overrides.apply(DiffConfig::load(config_path)?)?;
    let key_fields = config.key.fields.clone();

    let progress = match format {
        OutputFormat::Pretty => ProgressReporter::new_for_diff(),
        OutputFormat::Json => ProgressReporter::new_minimal(),
    };
    let processor = DataProcessor::new()?;

    progress.start_stage("Loading old snapshot");
    let old = processor.load_dataset(old_path)?;
    progress.start_stage("Loading new snapshot");
    let new = processor.load_dataset(new_path)?;

    let puller = DataPuller::with_config(&old, &new, config)?;
    let on_stage = |stage: Stage| progress.start_stage(&stage.to_string());
    let result = puller.get_new_records_with_progress(Some(&on_stage))?;

    if let Some(path) = output_path {
        progress.start_stage("Writing new records");
        processor.write_dataset(&result.dataset, path)?;
    }
    progress.finish(&format!("Found {} new records", result.len()));

    let summary = DiffSummary::new(&result, old_path, new_path, output_path, &key_fields);
    if let Some(path) = summary_path {
        JsonFormatter::write(&summary, path)?;
        log::info!("Summary written to {}", path.display());
    }

    match format {
        OutputFormat::Pretty => PrettyPrinter::print_diff_summary(&summary),
        OutputFormat::Json => println!("{}", JsonFormatter::format(&summary)?),
    }

    Ok(())
}

/// Print the identity keys of the first `limit` records of a snapshot
fn keys_command(
    input: &Path,
    limit: usize,
    config_path: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let config = DiffConfig::load(config_path)?;
    let dataset = DataProcessor::new()?.load_dataset(input)?;
    let composer = KeyComposer::for_dataset(&config.key, &dataset)?;

    let rows = (0..composer.row_count().min(limit))
        .map(|row| -> Result<KeyRow> {
            let key = composer.compose(row)?;
            Ok(KeyRow {
                row,
                fingerprint: Fingerprint::of(&key).to_hex(),
                key,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    match format {
        OutputFormat::Pretty => PrettyPrinter::print_keys(&rows, dataset.row_count()),
        OutputFormat::Json => println!("{}", JsonFormatter::format(&rows)?),
    }

    Ok(())
}

/// Write a reproducible synthetic snapshot
fn generate_command(
    output: &Path,
    rows: usize,
    seed: u64,
    as_of_date: Option<String>,
) -> Result<()> {
    if !DataProcessor::is_supported_format(output) {
        return Err(KeydiffError::invalid_input(format!(
            "Unsupported output format: {}",
            output.display()
        )));
    }

    let as_of_date =
        as_of_date.unwrap_or_else(|| chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string());

    let progress = ProgressReporter::new_for_diff();
    progress.start_stage(&format!("Generating {} rows", rows));
    let dataset = SnapshotGenerator::new(seed, as_of_date).generate(rows);

    progress.start_stage("Writing snapshot");
    DataProcessor::new()?.write_dataset(&dataset, output)?;
    progress.finish(&format!("Generated {} rows", rows));

    println!("✅ Snapshot generated");
    println!("├─ Rows: {}", dataset.row_count());
    println!("├─ Seed: {}", seed);
    println!("└─ Output: {}", output.display());

    Ok(())
}
