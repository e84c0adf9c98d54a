//! Output formatting utilities

use crate::diff::{DiffResult, DiffStats};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Number of keys shown as a sample in summaries
pub const SAMPLE_KEYS: usize = 5;

/// Machine-readable summary of one diff run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffSummary {
    pub format_version: String,
    pub generated_at: DateTime<Utc>,
    pub old_source: String,
    pub new_source: String,
    pub output: Option<String>,
    pub key_fields: Vec<String>,
    pub stats: DiffStats,
    pub sample_keys: Vec<String>,
}

impl DiffSummary {
    pub fn new(
        result: &DiffResult,
        old_source: &Path,
        new_source: &Path,
        output: Option<&Path>,
        key_fields: &[String],
    ) -> Self {
        Self {
            format_version: crate::FORMAT_VERSION.to_string(),
            generated_at: Utc::now(),
            old_source: old_source.display().to_string(),
            new_source: new_source.display().to_string(),
            output: output.map(|p| p.display().to_string()),
            key_fields: key_fields.to_vec(),
            stats: result.stats.clone(),
            sample_keys: result
                .keys()
                .into_iter()
                .take(SAMPLE_KEYS)
                .map(str::to_string)
                .collect(),
        }
    }
}

/// One row of `keys` command output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyRow {
    pub row: usize,
    pub key: String,
    pub fingerprint: String,
}

/// Parse output format string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {}. Use 'pretty' or 'json'", s)),
        }
    }
}

/// Pretty printer for keydiff output
pub struct PrettyPrinter;

impl PrettyPrinter {
    pub fn print_diff_summary(summary: &DiffSummary) {
        let stats = &summary.stats;

        println!("🔍 New records: {} → {}", summary.old_source, summary.new_source);
        println!("├─ Identity: {}", summary.key_fields.join(" + "));
        println!("├─ Strategy: {}", stats.strategy);
        println!("├─ Old rows: {}", stats.old_rows);
        println!("│  └─ Distinct keys: {}", stats.index.unique_fingerprints);
        println!("├─ New rows: {}", stats.new_rows);

        if stats.new_only_rows > 0 {
            println!("├─ 🆕 New-only rows: {}", stats.new_only_rows);
            for (i, key) in summary.sample_keys.iter().enumerate() {
                let marker = if i == summary.sample_keys.len() - 1 { "└─" } else { "├─" };
                println!("│  {} {}", marker, key);
            }
        } else {
            println!("├─ ✅ New-only rows: none");
        }

        if let Some(output) = &summary.output {
            println!("├─ Written to: {}", output);
        }
        println!("└─ Elapsed: {}", format_duration_ms(stats.elapsed_ms));
    }

    pub fn print_keys(rows: &[KeyRow], total: usize) {
        if rows.is_empty() {
            println!("No records found.");
            return;
        }

        println!("🔑 Identity keys ({} of {}):", rows.len(), total);
        for (i, row) in rows.iter().enumerate() {
            let prefix = if i == rows.len() - 1 { "└─" } else { "├─" };
            println!("{} [{}] {}  {}", prefix, row.row, row.fingerprint, row.key);
        }
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format any serializable data as JSON
    pub fn format<T: serde::Serialize + ?Sized>(data: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }

    /// Write any serializable data as a JSON file
    pub fn write<T: serde::Serialize + ?Sized>(data: &T, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, Self::format(data)?)?;
        Ok(())
    }
}

/// Format milliseconds in human-readable form
fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{} ms", ms)
    } else if ms < 60_000 {
        format!("{:.2} s", ms as f64 / 1000.0)
    } else {
        format!("{}m {}s", ms / 60_000, (ms % 60_000) / 1000)
    }
}
