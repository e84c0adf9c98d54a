//! Dataset loading and writing using DuckDB
//!
//! CSV and TSV inputs are read with every column as text. Parquet and JSON
//! inputs keep their declared column types (so a numeric `zip` column is
//! reported as a schema problem later), but their values are rendered to text
//! by DuckDB. Row order of the source is preserved.

use crate::dataset::{Column, ColumnInfo, Dataset, Value};
use crate::error::{KeydiffError, Result};
use duckdb::types::{ToSqlOutput, ValueRef};
use duckdb::{Connection, ToSql};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const STAGING_TABLE: &str = "keydiff_out";

/// Supported file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Tsv,
    Parquet,
    Json,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "csv" => Some(Self::Csv),
            "tsv" => Some(Self::Tsv),
            "parquet" => Some(Self::Parquet),
            "json" | "jsonl" => Some(Self::Json),
            _ => None,
        }
    }

    /// Table function call reading `files`
    fn read_expression(&self, files: &[PathBuf]) -> String {
        let list = files
            .iter()
            .map(|f| quote_literal(&f.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(", ");

        // A quoted empty cell stays an empty string; only a bare empty cell is null.
        // Part files are matched by header name, not by column position.
        match self {
            Self::Csv => format!(
                "read_csv([{}], header=true, all_varchar=true, allow_quoted_nulls=false, union_by_name=true)",
                list
            ),
            Self::Tsv => format!(
                "read_csv([{}], header=true, delim='\\t', all_varchar=true, allow_quoted_nulls=false, union_by_name=true)",
                list
            ),
            Self::Parquet => format!("read_parquet([{}])", list),
            Self::Json => format!("read_json_auto([{}])", list),
        }
    }

    fn copy_options(&self) -> &'static str {
        match self {
            Self::Csv => "FORMAT CSV, HEADER",
            Self::Tsv => "FORMAT CSV, HEADER, DELIMITER '\\t'",
            Self::Parquet => "FORMAT PARQUET",
            Self::Json => "FORMAT JSON",
        }
    }
}

/// Loads and writes datasets through an in-memory DuckDB connection
pub struct DataProcessor {
    connection: Connection,
}

impl DataProcessor {
    pub fn new() -> Result<Self> {
        let connection = Connection::open_in_memory()?;

        connection.execute("SET memory_limit='4GB'", [])?;
        connection.execute("SET enable_progress_bar=false", [])?;
        // Row order of the source must survive loading.
        connection.execute("SET preserve_insertion_order=true", [])?;

        Ok(Self { connection })
    }

    /// Load a file, or every supported file below a directory, as one dataset
    pub fn load_dataset(&self, path: &Path) -> Result<Dataset> {
        let (format, files) = Self::source_files(path)?;
        log::debug!("Loading {} {:?} file(s) from {}", files.len(), format, path.display());

        let create_view_sql = format!(
            "CREATE OR REPLACE VIEW data_view AS SELECT * FROM {}",
            format.read_expression(&files)
        );
        self.connection
            .execute(&create_view_sql, [])
            .map_err(|e| self.convert_duckdb_error(e, path))?;

        let schema = self.get_column_info()?;
        let columns = self.extract_columns(&schema, path)?;
        let dataset = Dataset::new(columns)?;

        Self::validate_text_columns(&dataset)?;
        log::info!(
            "Loaded {} rows x {} columns from {}",
            dataset.row_count(),
            dataset.column_count(),
            path.display()
        );
        Ok(dataset)
    }

    /// Write a dataset; the format follows the file extension
    pub fn write_dataset(&self, dataset: &Dataset, path: &Path) -> Result<()> {
        let format = FileFormat::from_path(path).ok_or_else(|| {
            KeydiffError::invalid_input(format!("Unsupported output format: {}", path.display()))
        })?;

        if dataset.column_count() == 0 {
            return Err(KeydiffError::invalid_input(
                "Cannot write a dataset without columns",
            ));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let column_defs = dataset
            .columns()
            .iter()
            .map(|column| {
                let sql_type = if column.values.iter().any(|v| matches!(v, Value::Bytes(_))) {
                    "BLOB"
                } else {
                    "VARCHAR"
                };
                format!("{} {}", quote_identifier(column.name()), sql_type)
            })
            .collect::<Vec<_>>()
            .join(", ");

        self.connection.execute_batch(&format!(
            "CREATE OR REPLACE TEMP TABLE {} ({});",
            STAGING_TABLE, column_defs
        ))?;

        {
            let mut appender = self.connection.appender(STAGING_TABLE)?;
            for record in dataset.records() {
                appender.append_row(duckdb::appender_params_from_iter(record.values()))?;
            }
        }

        let copy_sql = format!(
            "COPY {} TO {} ({})",
            STAGING_TABLE,
            quote_literal(&path.to_string_lossy()),
            format.copy_options()
        );
        let copied = self.connection.execute(&copy_sql, []);
        self.connection
            .execute_batch(&format!("DROP TABLE IF EXISTS {};", STAGING_TABLE))?;
        copied.map_err(|e| self.convert_duckdb_error(e, path))?;

        log::info!("Wrote {} rows to {}", dataset.row_count(), path.display());
        Ok(())
    }

    /// Check if file format is supported
    pub fn is_supported_format(file_path: &Path) -> bool {
        FileFormat::from_path(file_path).is_some()
    }

    /// Resolve the files behind `path` and their shared format
    fn source_files(path: &Path) -> Result<(FileFormat, Vec<PathBuf>)> {
        if !path.exists() {
            return Err(KeydiffError::invalid_input(format!(
                "File not found: {}",
                path.display()
            )));
        }

        if path.is_file() {
            let format = FileFormat::from_path(path).ok_or_else(|| {
                KeydiffError::invalid_input(format!("Unsupported file format: {}", path.display()))
            })?;
            return Ok((format, vec![path.to_path_buf()]));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() && Self::is_supported_format(entry.path()) {
                files.push(entry.into_path());
            }
        }

        let format = match files.first().and_then(|f| FileFormat::from_path(f)) {
            Some(format) => format,
            None => {
                return Err(KeydiffError::invalid_input(format!(
                    "No supported data files found in {}",
                    path.display()
                )))
            }
        };

        if let Some(other) = files.iter().find(|f| FileFormat::from_path(f) != Some(format)) {
            return Err(KeydiffError::invalid_input(format!(
                "Directory {} mixes formats ({} is not {:?})",
                path.display(),
                other.display(),
                format
            )));
        }

        Ok((format, files))
    }

    /// Get column information from the current view
    fn get_column_info(&self) -> Result<Vec<ColumnInfo>> {
        let mut stmt = self.connection.prepare("DESCRIBE data_view").map_err(|e| {
            KeydiffError::data_processing(format!("Failed to prepare describe query: {}", e))
        })?;

        let rows = stmt
            .query_map([], |row| {
                Ok(ColumnInfo::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                ))
            })
            .map_err(|e| {
                KeydiffError::data_processing(format!("Failed to query column info: {}", e))
            })?;

        let mut columns = Vec::new();
        for row in rows {
            columns.push(row.map_err(|e| {
                KeydiffError::data_processing(format!("Failed to process column info row: {}", e))
            })?);
        }

        Ok(columns)
    }

    /// Read every row of the view, column by column
    fn extract_columns(&self, schema: &[ColumnInfo], path: &Path) -> Result<Vec<Column>> {
        if schema.is_empty() {
            return Ok(Vec::new());
        }

        let select_list = schema
            .iter()
            .map(|col| {
                let ident = quote_identifier(&col.name);
                if col.is_text() || col.data_type.eq_ignore_ascii_case("BLOB") {
                    ident
                } else {
                    format!("CAST({} AS VARCHAR)", ident)
                }
            })
            .collect::<Vec<_>>()
            .join(", ");

        let mut stmt = self
            .connection
            .prepare(&format!("SELECT {} FROM data_view", select_list))
            .map_err(|e| {
                KeydiffError::data_processing(format!("Failed to prepare data extraction query: {}", e))
            })?;

        let width = schema.len();
        let rows = stmt
            .query_map([], |row| {
                let mut values = Vec::with_capacity(width);
                for i in 0..width {
                    values.push(convert_value(row.get_ref(i)?));
                }
                Ok(values)
            })
            .map_err(|e| self.convert_duckdb_error(e, path))?;

        let mut columns: Vec<Column> = schema
            .iter()
            .map(|info| Column::new(info.clone(), Vec::new()))
            .collect();

        for row in rows {
            let values = row.map_err(|e| self.convert_duckdb_error(e, path))?;
            for (column, value) in columns.iter_mut().zip(values) {
                column.values.push(value);
            }
        }

        Ok(columns)
    }

    /// Text columns must hold decoded UTF-8 only
    fn validate_text_columns(dataset: &Dataset) -> Result<()> {
        for column in dataset.columns().iter().filter(|c| c.info.is_text()) {
            if let Some(row) = column.values.iter().position(|v| matches!(v, Value::Bytes(_))) {
                return Err(KeydiffError::encoding(format!(
                    "Column '{}' row {} is not valid UTF-8",
                    column.name(),
                    row
                )));
            }
        }
        Ok(())
    }

    /// Convert DuckDB errors to appropriate KeydiffError types
    fn convert_duckdb_error(&self, error: duckdb::Error, file_path: &Path) -> KeydiffError {
        let error_msg = error.to_string();
        let lowered = error_msg.to_lowercase();

        if lowered.contains("utf-8") || lowered.contains("unicode") || lowered.contains("encoding") {
            KeydiffError::encoding(format!(
                "File encoding error '{}': {}",
                file_path.display(),
                error_msg
            ))
        } else if error_msg.contains("CSV Error")
            || error_msg.contains("Could not convert")
            || error_msg.contains("Invalid CSV")
            || error_msg.contains("Unterminated quoted field")
        {
            KeydiffError::invalid_input(format!(
                "Malformed CSV file '{}': {}",
                file_path.display(),
                error_msg
            ))
        } else if error_msg.contains("No files found") || error_msg.contains("does not exist") {
            KeydiffError::invalid_input(format!("File not found: {}", file_path.display()))
        } else if error_msg.contains("Permission denied") {
            KeydiffError::invalid_input(format!(
                "Permission denied accessing file: {}",
                file_path.display()
            ))
        } else {
            KeydiffError::DuckDb(error)
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> duckdb::Result<ToSqlOutput<'_>> {
        match self {
            Value::Text(text) => text.to_sql(),
            Value::Bytes(bytes) => bytes.to_sql(),
            Value::Null => Ok(ToSqlOutput::Owned(duckdb::types::Value::Null)),
        }
    }
}

fn convert_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => Value::Text(text.to_string()),
            Err(_) => Value::Bytes(bytes.to_vec()),
        },
        ValueRef::Blob(bytes) => Value::Bytes(bytes.to_vec()),
        other => Value::Text(format!("{:?}", other)),
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
