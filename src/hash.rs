//! Fingerprinting of identity keys
//!
//! A fingerprint is the first 128 bits of the BLAKE3 digest of a key's UTF-8
//! bytes. BLAKE3 is unkeyed, so fingerprints are stable across runs, machines
//! and processes.

use crate::config::MAX_PARTITION_BITS;
use crate::error::Result;
use crate::key::{IdentityKey, KeyComposer};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of a fingerprint in bytes
pub const FINGERPRINT_LEN: usize = 16;

/// Fixed-width digest of an identity key
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint(pub [u8; FINGERPRINT_LEN]);

impl Fingerprint {
    /// Fingerprint of a single key
    pub fn of(key: &str) -> Self {
        let digest = blake3::hash(key.as_bytes());
        let mut bytes = [0u8; FINGERPRINT_LEN];
        bytes.copy_from_slice(&digest.as_bytes()[..FINGERPRINT_LEN]);
        Fingerprint(bytes)
    }

    /// Lower half, used for partitioning
    pub fn low_u64(&self) -> u64 {
        let mut half = [0u8; 8];
        half.copy_from_slice(&self.0[..8]);
        u64::from_le_bytes(half)
    }

    /// Partition of this fingerprint among `2^bits` partitions.
    ///
    /// `bits` is capped at [`MAX_PARTITION_BITS`].
    pub fn partition(&self, bits: u8) -> usize {
        let bits = bits.min(MAX_PARTITION_BITS);
        let mask = (1u64 << bits) - 1;
        (self.low_u64() & mask) as usize
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Computes fingerprints in parallel batches
#[derive(Debug, Clone)]
pub struct Fingerprinter {
    batch_size: usize,
}

impl Fingerprinter {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn fingerprint(&self, key: &str) -> Fingerprint {
        Fingerprint::of(key)
    }

    /// Fingerprint already composed keys, preserving order
    pub fn fingerprint_all(&self, keys: &[IdentityKey]) -> Vec<Fingerprint> {
        keys.par_chunks(self.batch_size)
            .flat_map_iter(|chunk| chunk.iter().map(|key| Fingerprint::of(key)))
            .collect()
    }

    /// Compose and fingerprint every row without keeping the keys
    pub fn fingerprint_rows(&self, composer: &KeyComposer<'_>) -> Result<Vec<Fingerprint>> {
        (0..composer.row_count())
            .into_par_iter()
            .with_min_len(self.batch_size)
            .map(|row| composer.compose(row).map(|key| Fingerprint::of(&key)))
            .collect()
    }
}
