//! # keydiff
//!
//! Finds the records of a new snapshot whose identity key does not occur
//! anywhere in an old snapshot. Keys are composed from a fixed set of text
//! columns, reduced to 128-bit BLAKE3 fingerprints and looked up in a hash
//! index built from the old side.

pub mod cli;
pub mod commands;
pub mod config;
pub mod data;
pub mod dataset;
pub mod diff;
pub mod error;
pub mod generate;
pub mod hash;
pub mod index;
pub mod key;
pub mod output;
pub mod progress;
pub mod puller;

pub use config::{DiffConfig, KeySpec, Strategy};
pub use dataset::{AddressRecord, Dataset};
pub use diff::DiffResult;
pub use error::{KeydiffError, Result};
pub use puller::DataPuller;

/// Current format version for keydiff summaries
pub const FORMAT_VERSION: &str = "1.0.0";

/// Default batch size for processing rows
pub const DEFAULT_BATCH_SIZE: usize = 10000;
