//! In-memory tabular datasets
//!
//! A [`Dataset`] is stored column-wise: every [`Column`] carries its name, its
//! declared type and one [`Value`] per row. Rows are addressed by position and
//! viewed through [`Record`].

use crate::error::{KeydiffError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Declared type for text columns
pub const TEXT_TYPE: &str = "VARCHAR";

/// Column names of an address snapshot, in file order
pub const ADDRESS_COLUMNS: [&str; 4] = ["address", "city", "zip", "as_of_date"];

/// Column information for schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }

    /// Text column with the default text type
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, TEXT_TYPE)
    }

    /// Whether the declared type holds decoded text
    pub fn is_text(&self) -> bool {
        matches!(
            self.data_type.to_ascii_uppercase().as_str(),
            "VARCHAR" | "TEXT" | "STRING" | "CHAR" | "BPCHAR"
        )
    }
}

/// A single cell
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Text(String),
    Null,
    /// Raw bytes that were never decoded into text
    Bytes(Vec<u8>),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

/// One named, typed column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub info: ColumnInfo,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(info: ColumnInfo, values: Vec<Value>) -> Self {
        Self { info, values }
    }

    /// Text column built from plain strings
    pub fn text<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            info: ColumnInfo::text(name),
            values: values.into_iter().map(|v| Value::Text(v.into())).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// An ordered, immutable-by-convention table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    /// Build a dataset from columns of equal length with unique names
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map_or(0, Column::len);

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name()) {
                return Err(KeydiffError::invalid_input(format!(
                    "Duplicate column name '{}'",
                    column.name()
                )));
            }
            if column.len() != row_count {
                return Err(KeydiffError::invalid_input(format!(
                    "Column '{}' has {} values, expected {}",
                    column.name(),
                    column.len(),
                    row_count
                )));
            }
        }

        Ok(Self { columns, row_count })
    }

    /// Address snapshot built from typed records
    pub fn from_records(records: &[AddressRecord]) -> Self {
        let [address, city, zip, as_of_date] = ADDRESS_COLUMNS;
        let columns = vec![
            Column::text(address, records.iter().map(|r| r.address.as_str())),
            Column::text(city, records.iter().map(|r| r.city.as_str())),
            Column::text(zip, records.iter().map(|r| r.zip.as_str())),
            Column::text(as_of_date, records.iter().map(|r| r.as_of_date.as_str())),
        ];
        Self {
            columns,
            row_count: records.len(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn schema(&self) -> Vec<ColumnInfo> {
        self.columns.iter().map(|c| c.info.clone()).collect()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn record(&self, row: usize) -> Option<Record<'_>> {
        (row < self.row_count).then_some(Record { dataset: self, row })
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> + '_ {
        (0..self.row_count).map(move |row| Record { dataset: self, row })
    }

    /// Copy the rows at `positions`, in the given order.
    ///
    /// Panics if a position is out of range.
    pub fn take(&self, positions: &[usize]) -> Dataset {
        let columns = self
            .columns
            .iter()
            .map(|column| Column {
                info: column.info.clone(),
                values: positions.iter().map(|&p| column.values[p].clone()).collect(),
            })
            .collect();

        Dataset {
            columns,
            row_count: positions.len(),
        }
    }

    /// Drop the column named `name`, if present
    pub fn without_column(mut self, name: &str) -> Dataset {
        self.columns.retain(|c| c.name() != name);
        self
    }

    /// Append a column after the existing ones
    pub fn with_column(mut self, column: Column) -> Result<Dataset> {
        if self.column_index(column.name()).is_some() {
            return Err(KeydiffError::invalid_input(format!(
                "Column '{}' already exists",
                column.name()
            )));
        }
        if !self.columns.is_empty() && column.len() != self.row_count {
            return Err(KeydiffError::invalid_input(format!(
                "Column '{}' has {} values, expected {}",
                column.name(),
                column.len(),
                self.row_count
            )));
        }

        self.row_count = column.len();
        self.columns.push(column);
        Ok(self)
    }
}

/// Borrowed view of one row
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    dataset: &'a Dataset,
    row: usize,
}

impl<'a> Record<'a> {
    /// Position of this row in its dataset
    pub fn index(&self) -> usize {
        self.row
    }

    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.dataset.column(name).map(|c| &c.values[self.row])
    }

    pub fn text(&self, name: &str) -> Option<&'a str> {
        self.get(name).and_then(Value::as_text)
    }

    pub fn values(&self) -> impl Iterator<Item = &'a Value> + 'a {
        let (dataset, row) = (self.dataset, self.row);
        dataset.columns.iter().map(move |c| &c.values[row])
    }
}

/// One row of an address snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    pub address: String,
    pub city: String,
    pub zip: String,
    pub as_of_date: String,
}

impl AddressRecord {
    pub fn new(
        address: impl Into<String>,
        city: impl Into<String>,
        zip: impl Into<String>,
        as_of_date: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            city: city.into(),
            zip: zip.into(),
            as_of_date: as_of_date.into(),
        }
    }
}
