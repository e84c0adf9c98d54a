//! Identity key composition
//!
//! The identity key of a record is its identity fields joined in a fixed order
//! with a fixed separator. Values are used exactly as stored: no trimming, no
//! case folding.

use crate::config::KeySpec;
use crate::dataset::{Column, Dataset, Record, Value};
use crate::error::{KeydiffError, Result};
use rayon::prelude::*;

/// Canonical identity string of one record
pub type IdentityKey = String;

/// Compose the identity key of a single record, looking fields up by name
pub fn compose_record(spec: &KeySpec, record: &Record<'_>) -> Result<IdentityKey> {
    let mut parts = Vec::with_capacity(spec.fields.len());
    for field in &spec.fields {
        let value = record.get(field).ok_or_else(|| {
            KeydiffError::schema(format!("Missing identity field '{}'", field))
        })?;
        parts.push(field_text(field, record.index(), value)?);
    }
    Ok(parts.join(&spec.separator))
}

/// Composes keys for every row of one dataset.
///
/// Identity columns are resolved and type-checked once, so schema problems
/// are reported before any row is touched.
#[derive(Debug)]
pub struct KeyComposer<'a> {
    spec: &'a KeySpec,
    columns: Vec<&'a Column>,
    row_count: usize,
}

impl<'a> KeyComposer<'a> {
    pub fn for_dataset(spec: &'a KeySpec, dataset: &'a Dataset) -> Result<Self> {
        let mut columns = Vec::with_capacity(spec.fields.len());

        for field in &spec.fields {
            let column = dataset.column(field).ok_or_else(|| {
                KeydiffError::schema(format!(
                    "Missing identity column '{}' (available: {})",
                    field,
                    dataset.column_names().join(", ")
                ))
            })?;

            if !column.info.is_text() {
                return Err(KeydiffError::schema(format!(
                    "Identity column '{}' must be text, found {}",
                    field, column.info.data_type
                )));
            }

            columns.push(column);
        }

        Ok(Self {
            spec,
            columns,
            row_count: dataset.row_count(),
        })
    }

    pub fn spec(&self) -> &KeySpec {
        self.spec
    }

    /// Compose the key of the row at `row`
    pub fn compose(&self, row: usize) -> Result<IdentityKey> {
        let separator = &self.spec.separator;
        let mut key = String::new();

        for (i, column) in self.columns.iter().enumerate() {
            let value = column.values.get(row).ok_or_else(|| {
                KeydiffError::invalid_input(format!(
                    "Row {} is out of range ({} rows)",
                    row, self.row_count
                ))
            })?;
            let text = field_text(column.name(), row, value)?;

            if i > 0 {
                key.push_str(separator);
            }
            key.push_str(text);
        }

        Ok(key)
    }

    /// Compose every key, in row order
    pub fn compose_all(&self, batch_size: usize) -> Result<Vec<IdentityKey>> {
        (0..self.row_count)
            .into_par_iter()
            .with_min_len(batch_size.max(1))
            .map(|row| self.compose(row))
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }
}

fn field_text<'v>(field: &str, row: usize, value: &'v Value) -> Result<&'v str> {
    match value {
        Value::Text(text) => Ok(text),
        Value::Null => Err(KeydiffError::schema(format!(
            "Record {} has no value for identity field '{}'",
            row, field
        ))),
        Value::Bytes(_) => Err(KeydiffError::encoding(format!(
            "Record {} field '{}' holds undecoded bytes; identity fields must be UTF-8 text",
            row, field
        ))),
    }
}
