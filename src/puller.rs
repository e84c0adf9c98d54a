//! The diff session facade
//!
//! [`DataPuller`] borrows an old and a new snapshot and runs the whole
//! pipeline (compose keys, fingerprint, index the old side, filter the new
//! side) on demand. It never mutates either snapshot, and every call builds
//! its own index, so repeated calls return the same records.

use crate::config::{DiffConfig, Strategy};
use crate::dataset::Dataset;
use crate::diff::{DiffEngine, DiffResult};
use crate::error::Result;
use crate::hash::Fingerprinter;
use crate::index::{FingerprintIndex, PartitionedIndex};
use crate::key::{IdentityKey, KeyComposer};
use std::fmt;
use std::time::Instant;

/// Pipeline stage, reported to progress observers as it starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    HashingOld,
    BuildingIndex,
    FilteringNew,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::HashingOld => write!(f, "Fingerprinting old snapshot"),
            Stage::BuildingIndex => write!(f, "Building fingerprint index"),
            Stage::FilteringNew => write!(f, "Filtering new snapshot"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DataPuller<'a> {
    old: &'a Dataset,
    new: &'a Dataset,
    config: DiffConfig,
}

impl<'a> DataPuller<'a> {
    /// Session with the default address key and single-index strategy
    pub fn new(old: &'a Dataset, new: &'a Dataset) -> Self {
        Self {
            old,
            new,
            config: DiffConfig::default(),
        }
    }

    pub fn with_config(old: &'a Dataset, new: &'a Dataset, config: DiffConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { old, new, config })
    }

    pub fn old(&self) -> &Dataset {
        self.old
    }

    pub fn new_snapshot(&self) -> &Dataset {
        self.new
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Identity key of every record in `dataset`, in row order
    pub fn compose_key(&self, dataset: &Dataset) -> Result<Vec<IdentityKey>> {
        KeyComposer::for_dataset(&self.config.key, dataset)?.compose_all(self.config.batch_size)
    }

    /// Records of the new snapshot whose identity key never occurs in the old one
    pub fn get_new_records(&self) -> Result<DiffResult> {
        self.get_new_records_with_progress(None)
    }

    pub fn get_new_records_with_progress(
        &self,
        progress: Option<&dyn Fn(Stage)>,
    ) -> Result<DiffResult> {
        let start = Instant::now();
        let notify = |stage: Stage| {
            log::debug!("{}", stage);
            if let Some(callback) = progress {
                callback(stage);
            }
        };

        log::info!(
            "Diffing {} new rows against {} old rows ({} strategy)",
            self.new.row_count(),
            self.old.row_count(),
            self.config.strategy
        );

        // Resolve both schemas before hashing anything.
        let old_composer = KeyComposer::for_dataset(&self.config.key, self.old)?;
        KeyComposer::for_dataset(&self.config.key, self.new)?;

        notify(Stage::HashingOld);
        let old_fingerprints = Fingerprinter::new(self.config.batch_size).fingerprint_rows(&old_composer)?;

        let engine = DiffEngine::new(&self.config.key, self.config.batch_size);
        let mut result = match self.config.strategy {
            Strategy::Single => {
                notify(Stage::BuildingIndex);
                let index = FingerprintIndex::build(&old_fingerprints);
                drop(old_fingerprints);

                notify(Stage::FilteringNew);
                engine.diff(self.new, &index)?
            }
            Strategy::Partitioned => {
                notify(Stage::BuildingIndex);
                let index = PartitionedIndex::build(&old_fingerprints, self.config.partition_bits)?;
                drop(old_fingerprints);

                notify(Stage::FilteringNew);
                engine.diff_partitioned(self.new, &index)?
            }
        };

        result.stats.elapsed_ms = start.elapsed().as_millis() as u64;

        if result.stats.index.duplicate_count > 0 {
            log::debug!(
                "Old snapshot repeats {} identity keys ({:.2}%)",
                result.stats.index.duplicate_count,
                result.stats.index.duplicate_rate * 100.0
            );
        }
        log::info!(
            "Found {} new records in {} ms",
            result.stats.new_only_rows,
            result.stats.elapsed_ms
        );

        Ok(result)
    }
}
