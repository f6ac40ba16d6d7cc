//! Bloom filters over a [Bitmap], probed through a shared [KeyedHasher].
//!
//! A filter does not own its hash keys: it holds an `Arc` to the hasher, so
//! a backend that keeps many filters (one per trie entry and suffix length,
//! or one per block) derives all of them from the same key material.

use std::fmt;
use std::sync::Arc;

use crate::hasher::{checksum_to_vector, KeyedHasher, SipKeyedHasher};
use crate::types::Bitmap;

//------------ BloomFilter ----------------------------------------------------

/// A bloom filter of `m` bits with `k` probes per item.
///
/// There are no false negatives: an added item always tests positive. Items
/// that were never added test positive with a probability that grows with
/// the load of the filter. Items cannot be removed.
#[derive(Clone)]
pub struct BloomFilter<H: KeyedHasher = SipKeyedHasher> {
    bits: Bitmap,
    hasher: Arc<H>,
    // number of add calls, used for the false positive estimate.
    added: usize,
}

impl<H: KeyedHasher> BloomFilter<H> {
    /// Create an empty filter of `num_bits` bits. The number of probes is
    /// the one of `hasher`.
    pub fn new(num_bits: usize, hasher: Arc<H>) -> Self {
        assert!(num_bits > 0, "a bloom filter needs at least one bit");
        Self {
            bits: Bitmap::new(num_bits),
            hasher,
            added: 0,
        }
    }

    pub fn add(&mut self, item: &[u8]) {
        let probes = self.hasher.hash_to_vector(item, self.bits.len());
        self.bits.union_assign(&probes);
        self.added += 1;
    }

    pub fn test(&self, item: &[u8]) -> bool {
        self.hasher
            .hash_to_vector(item, self.bits.len())
            .is_subset(&self.bits)
    }

    /// Add an item that is itself a hash digest (e.g. the wire format of a
    /// hashed name). The probes are taken from the item's own bytes with
    /// [checksum_to_vector] instead of hashing it again, so the item must
    /// be at least as long as the number of probes.
    pub fn add_hashed(&mut self, item: &[u8]) {
        let probes = checksum_to_vector(item, self.probes(), self.bits.len());
        self.bits.union_assign(&probes);
        self.added += 1;
    }

    pub fn test_hashed(&self, item: &[u8]) -> bool {
        checksum_to_vector(item, self.probes(), self.bits.len())
            .is_subset(&self.bits)
    }

    /// Get the filter size in bits.
    pub fn num_bits(&self) -> usize {
        self.bits.len()
    }

    /// Get the number of probes per item.
    pub fn probes(&self) -> usize {
        self.hasher.probes()
    }

    /// Count the number of set bits.
    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// The fraction of set bits.
    pub fn fill_ratio(&self) -> f64 {
        self.count_ones() as f64 / self.num_bits() as f64
    }

    /// The expected false positive rate for the number of items added so
    /// far: `(1 - e^(-kn/m))^k`.
    pub fn estimated_false_positive_rate(&self) -> f64 {
        let k = self.probes() as f64;
        let n = self.added as f64;
        let m = self.num_bits() as f64;
        (1.0 - (-k * n / m).exp()).powf(k)
    }

    pub fn hasher(&self) -> &Arc<H> {
        &self.hasher
    }
}

impl<H: KeyedHasher> fmt::Debug for BloomFilter<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BloomFilter")
            .field("bits", &self.num_bits())
            .field("probes", &self.probes())
            .field("added", &self.added)
            .field("fill_ratio", &format!("{:.2}%", self.fill_ratio() * 100.0))
            .finish()
    }
}
