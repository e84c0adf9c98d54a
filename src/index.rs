//! Membership indexes over fingerprints

use crate::config::MAX_PARTITION_BITS;
use crate::error::{KeydiffError, Result};
use crate::hash::Fingerprint;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::{BuildHasherDefault, Hasher};

/// Hasher that passes a fingerprint's upper half straight through.
///
/// Fingerprints are already uniformly distributed, so rehashing them would
/// only cost time. Only [`Fingerprint`]'s `Hash` impl feeds this hasher.
#[derive(Default)]
pub struct FingerprintHasher(u64);

impl Hasher for FingerprintHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        // Derived `Hash` sends a constant length prefix, then all 16 bytes in one write.
        let take = bytes.len().min(8);
        let start = bytes.len() - take;
        let mut word = [0u8; 8];
        word[..take].copy_from_slice(&bytes[start..]);
        self.0 ^= u64::from_le_bytes(word);
    }
}

type FingerprintSet = HashSet<Fingerprint, BuildHasherDefault<FingerprintHasher>>;

/// Quality metrics gathered while building an index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_fingerprints: u64,
    pub unique_fingerprints: u64,
    pub duplicate_count: u64,
    pub duplicate_rate: f64,
}

impl IndexStats {
    fn from_counts(total: u64, unique: u64) -> Self {
        let duplicate_count = total.saturating_sub(unique);
        let duplicate_rate = if total > 0 {
            duplicate_count as f64 / total as f64
        } else {
            0.0
        };

        Self {
            total_fingerprints: total,
            unique_fingerprints: unique,
            duplicate_count,
            duplicate_rate,
        }
    }

    fn merge(parts: &[IndexStats]) -> Self {
        let total = parts.iter().map(|s| s.total_fingerprints).sum();
        let unique = parts.iter().map(|s| s.unique_fingerprints).sum();
        Self::from_counts(total, unique)
    }
}

/// Set of the old snapshot's fingerprints
#[derive(Debug, Clone, Default)]
pub struct FingerprintIndex {
    set: FingerprintSet,
    stats: IndexStats,
}

impl FingerprintIndex {
    pub fn build(fingerprints: &[Fingerprint]) -> Self {
        Self::from_iter_counted(fingerprints.iter().copied())
    }

    fn from_iter_counted(fingerprints: impl Iterator<Item = Fingerprint>) -> Self {
        let (lower, _) = fingerprints.size_hint();
        let mut set = FingerprintSet::with_capacity_and_hasher(lower, Default::default());
        let mut total = 0u64;

        for fp in fingerprints {
            set.insert(fp);
            total += 1;
        }

        let stats = IndexStats::from_counts(total, set.len() as u64);
        Self { set, stats }
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.set.contains(fingerprint)
    }

    /// Number of distinct fingerprints
    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }
}

/// One [`FingerprintIndex`] per fingerprint partition
#[derive(Debug, Clone)]
pub struct PartitionedIndex {
    bits: u8,
    partitions: Vec<FingerprintIndex>,
    stats: IndexStats,
}

impl PartitionedIndex {
    /// Split fingerprints into `2^bits` partitions and index each in parallel
    pub fn build(fingerprints: &[Fingerprint], bits: u8) -> Result<Self> {
        if bits > MAX_PARTITION_BITS {
            return Err(KeydiffError::config(format!(
                "Partition bits must be at most {}, got {}",
                MAX_PARTITION_BITS, bits
            )));
        }

        let buckets = partition_fingerprints(fingerprints, bits);
        let partitions: Vec<FingerprintIndex> = buckets
            .into_par_iter()
            .map(|bucket| FingerprintIndex::from_iter_counted(bucket.into_iter()))
            .collect();

        let part_stats: Vec<IndexStats> = partitions.iter().map(|p| p.stats.clone()).collect();
        let stats = IndexStats::merge(&part_stats);

        log::debug!(
            "Built {} partitions over {} fingerprints",
            partitions.len(),
            stats.total_fingerprints
        );

        Ok(Self {
            bits,
            partitions,
            stats,
        })
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    pub fn partition(&self, id: usize) -> Option<&FingerprintIndex> {
        self.partitions.get(id)
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.partitions[fingerprint.partition(self.bits)].contains(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.partitions.iter().map(FingerprintIndex::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.iter().all(FingerprintIndex::is_empty)
    }

    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }
}

/// Group fingerprints by partition, keeping their relative order
fn partition_fingerprints(fingerprints: &[Fingerprint], bits: u8) -> Vec<Vec<Fingerprint>> {
    let bits = bits.min(MAX_PARTITION_BITS);
    let mut buckets: Vec<Vec<Fingerprint>> = vec![Vec::new(); 1usize << bits];
    for fp in fingerprints {
        buckets[fp.partition(bits)].push(*fp);
    }
    buckets
}
