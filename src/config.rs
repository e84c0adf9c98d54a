//! Diff configuration
//!
//! Configuration is plain JSON. Every field is optional; missing fields fall
//! back to the defaults below, and CLI flags override whatever the file says.

use crate::error::{KeydiffError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Largest supported partition bit count (65,536 partitions)
pub const MAX_PARTITION_BITS: u8 = 16;

/// Default partition bit count for the partitioned strategy
pub const DEFAULT_PARTITION_BITS: u8 = 4;

/// Which fields form the identity key and how they are joined
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeySpec {
    /// Identity fields, in concatenation order
    pub fields: Vec<String>,
    pub separator: String,
    /// Name of the column that carries the composed key in the result
    pub key_column: String,
}

impl Default for KeySpec {
    fn default() -> Self {
        Self {
            fields: vec!["address".to_string(), "city".to_string(), "zip".to_string()],
            separator: ", ".to_string(),
            key_column: "full_address".to_string(),
        }
    }
}

impl KeySpec {
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(KeydiffError::config("Key spec needs at least one field"));
        }

        for (i, field) in self.fields.iter().enumerate() {
            if field.is_empty() {
                return Err(KeydiffError::config("Key field names must not be empty"));
            }
            if self.fields[..i].contains(field) {
                return Err(KeydiffError::config(format!(
                    "Key field '{}' is listed twice",
                    field
                )));
            }
        }

        if self.key_column.is_empty() {
            return Err(KeydiffError::config("Key column name must not be empty"));
        }
        if self.fields.contains(&self.key_column) {
            return Err(KeydiffError::config(format!(
                "Key column '{}' collides with an identity field",
                self.key_column
            )));
        }

        Ok(())
    }
}

/// How the old snapshot's index is built and searched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// One index over every old fingerprint
    #[default]
    Single,
    /// One index per fingerprint partition, built and searched in parallel
    Partitioned,
}

impl Strategy {
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "partitioned" => Ok(Self::Partitioned),
            _ => Err(format!(
                "Invalid strategy: {}. Use 'single' or 'partitioned'",
                s
            )),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Single => write!(f, "single"),
            Strategy::Partitioned => write!(f, "partitioned"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    pub key: KeySpec,
    pub strategy: Strategy,
    pub partition_bits: u8,
    /// Rows per parallel hashing batch
    pub batch_size: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            key: KeySpec::default(),
            strategy: Strategy::default(),
            partition_bits: DEFAULT_PARTITION_BITS,
            batch_size: crate::DEFAULT_BATCH_SIZE,
        }
    }
}

impl DiffConfig {
    /// Load and validate a JSON configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            KeydiffError::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: DiffConfig = serde_json::from_str(&content).map_err(|e| {
            KeydiffError::config(format!(
                "Invalid config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        config.validate()?;
        log::debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Load from `path` if given, otherwise use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.key.validate()?;

        if self.batch_size == 0 {
            return Err(KeydiffError::config("Batch size must be greater than 0"));
        }
        if self.partition_bits > MAX_PARTITION_BITS {
            return Err(KeydiffError::config(format!(
                "Partition bits must be at most {}, got {}",
                MAX_PARTITION_BITS, self.partition_bits
            )));
        }

        Ok(())
    }
}
