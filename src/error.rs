//! Error types for keydiff operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, KeydiffError>;

#[derive(Error, Debug)]
pub enum KeydiffError {
    #[error("Schema error: {message}")]
    Schema { message: String },

    #[error("Encoding error: {message}")]
    Encoding { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Data processing error: {message}")]
    DataProcessing { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl KeydiffError {
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema {
            message: msg.into(),
        }
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn data_processing(msg: impl Into<String>) -> Self {
        Self::DataProcessing {
            message: msg.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }
}
