//! Filtering a new snapshot against an old snapshot's fingerprint index

use crate::config::{KeySpec, Strategy};
use crate::dataset::{Column, Dataset};
use crate::error::{KeydiffError, Result};
use crate::hash::{Fingerprint, Fingerprinter};
use crate::index::{FingerprintIndex, IndexStats, PartitionedIndex};
use crate::key::{IdentityKey, KeyComposer};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Counters describing one diff run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffStats {
    pub strategy: Strategy,
    pub old_rows: u64,
    pub new_rows: u64,
    pub new_only_rows: u64,
    pub index: IndexStats,
    pub elapsed_ms: u64,
}

/// Records of the new snapshot whose identity is absent from the old one
#[derive(Debug, Clone)]
pub struct DiffResult {
    /// Surviving rows in source order, with the identity key appended
    pub dataset: Dataset,
    /// Position of every surviving row in the new snapshot
    pub source_rows: Vec<usize>,
    pub key_column: String,
    pub stats: DiffStats,
}

impl DiffResult {
    pub fn len(&self) -> usize {
        self.dataset.row_count()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Identity keys of the surviving rows
    pub fn keys(&self) -> Vec<&str> {
        self.dataset
            .column(&self.key_column)
            .map(|c| c.values.iter().filter_map(|v| v.as_text()).collect())
            .unwrap_or_default()
    }

    /// Same surviving rows, ignoring timing
    pub fn same_rows(&self, other: &DiffResult) -> bool {
        self.source_rows == other.source_rows && self.dataset == other.dataset
    }
}

/// Stable filter of new records against an index
pub struct DiffEngine<'a> {
    spec: &'a KeySpec,
    fingerprinter: Fingerprinter,
    batch_size: usize,
}

impl<'a> DiffEngine<'a> {
    pub fn new(spec: &'a KeySpec, batch_size: usize) -> Self {
        Self {
            spec,
            fingerprinter: Fingerprinter::new(batch_size),
            batch_size: batch_size.max(1),
        }
    }

    /// Keep every record of `new` whose fingerprint is not in `index`
    pub fn diff(&self, new: &Dataset, index: &FingerprintIndex) -> Result<DiffResult> {
        let start = Instant::now();
        let composer = self.composer(new)?;

        let survivors: Vec<(usize, IdentityKey)> = (0..new.row_count())
            .into_par_iter()
            .with_min_len(self.batch_size)
            .filter_map(|row| match composer.compose(row) {
                Ok(key) if index.contains(&Fingerprint::of(&key)) => None,
                Ok(key) => Some(Ok((row, key))),
                Err(e) => Some(Err(e)),
            })
            .collect::<Result<Vec<_>>>()?;

        let (positions, keys): (Vec<usize>, Vec<IdentityKey>) = survivors.into_iter().unzip();
        self.materialize(new, positions, keys, Strategy::Single, index.stats(), start)
    }

    /// Partition-wise variant of [`DiffEngine::diff`].
    ///
    /// New records are grouped with the same partition function as the index,
    /// each group is checked only against its own partition, and survivors are
    /// put back into source order.
    pub fn diff_partitioned(&self, new: &Dataset, index: &PartitionedIndex) -> Result<DiffResult> {
        let start = Instant::now();
        let composer = self.composer(new)?;
        let fingerprints = self.fingerprinter.fingerprint_rows(&composer)?;

        let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); index.partition_count()];
        for (row, fp) in fingerprints.iter().enumerate() {
            buckets[fp.partition(index.bits())].push(row);
        }

        let kept: Vec<Vec<usize>> = buckets
            .into_par_iter()
            .enumerate()
            .map(|(id, rows)| -> Result<Vec<usize>> {
                let partition = index.partition(id).ok_or_else(|| {
                    KeydiffError::data_processing(format!("Partition {} missing from index", id))
                })?;
                Ok(rows
                    .into_iter()
                    .filter(|&row| !partition.contains(&fingerprints[row]))
                    .collect())
            })
            .collect::<Result<Vec<_>>>()?;

        let mut positions: Vec<usize> = kept.into_iter().flatten().collect();
        positions.sort_unstable();

        let keys = positions
            .par_iter()
            .with_min_len(self.batch_size)
            .map(|&row| composer.compose(row))
            .collect::<Result<Vec<_>>>()?;

        self.materialize(new, positions, keys, Strategy::Partitioned, index.stats(), start)
    }

    fn composer<'d>(&'d self, new: &'d Dataset) -> Result<KeyComposer<'d>> {
        KeyComposer::for_dataset(self.spec, new)
    }

    fn materialize(
        &self,
        new: &Dataset,
        positions: Vec<usize>,
        keys: Vec<IdentityKey>,
        strategy: Strategy,
        index_stats: &IndexStats,
        start: Instant,
    ) -> Result<DiffResult> {
        let key_column = &self.spec.key_column;
        if new.column_index(key_column).is_some() {
            log::debug!("Replacing existing '{}' column with recomposed keys", key_column);
        }

        // A stale key column (e.g. from an earlier run) is recomputed, not kept.
        let dataset = new
            .take(&positions)
            .without_column(key_column)
            .with_column(Column::text(key_column.clone(), keys))?;

        let stats = DiffStats {
            strategy,
            old_rows: index_stats.total_fingerprints,
            new_rows: new.row_count() as u64,
            new_only_rows: positions.len() as u64,
            index: index_stats.clone(),
            elapsed_ms: start.elapsed().as_millis() as u64,
        };

        log::debug!(
            "{} diff kept {} of {} new rows",
            strategy,
            stats.new_only_rows,
            stats.new_rows
        );

        Ok(DiffResult {
            dataset,
            source_rows: positions,
            key_column: self.spec.key_column.clone(),
            stats,
        })
    }
}
