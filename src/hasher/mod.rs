//! Keyed hash functions used for bloom filter probes and bit-matrix columns.
//!
//! Two implementations of [KeyedHasher] are provided: [SipKeyedHasher],
//! which holds `k` independent SipHash keys and derives `k` bit positions
//! per input, and [Sha256Hasher], which derives exactly one. Next to those
//! there are the plain byte-folding functions [checksum], [djb2] and
//! [checksum_to_vector], used for names whose segments are already hash
//! digests.
//!
//! Whatever derivation is used to add an item to a filter must also be used
//! to test for it: a change of `k`, of the range or of the key material
//! invalidates everything stored before.

mod sha256;
mod siphash;

pub use sha256::Sha256Hasher;
pub use siphash::{SipKey, SipKeyedHasher, SIPHASH_KEY_LENGTH};

use crate::types::Bitmap;

//------------ KeyedHasher ---------------------------------------------------

pub trait KeyedHasher: std::fmt::Debug {
    /// The digest of `input`.
    fn hash(&self, input: &[u8]) -> Vec<u8>;

    /// A bitmap of capacity `range` with the bit positions derived from the
    /// digest(s) of `input` set.
    fn hash_to_vector(&self, input: &[u8], range: usize) -> Bitmap;

    /// The number of bit positions `hash_to_vector` derives per input. The
    /// actual number of set bits may be lower if positions collide.
    fn probes(&self) -> usize;
}

//------------ Plain hash functions -------------------------------------------

/// The sum of all bytes in `input`, wrapping at 32 bits.
pub fn checksum(input: &[u8]) -> u32 {
    input
        .iter()
        .fold(0_u32, |sum, b| sum.wrapping_add(u32::from(*b)))
}

/// The djb2 string hash, `h = h * 33 + c` starting at 5381, wrapping at 64
/// bits.
pub fn djb2(input: &[u8]) -> u64 {
    input.iter().fold(5381_u64, |hash, b| {
        (hash << 5).wrapping_add(hash).wrapping_add(u64::from(*b))
    })
}

/// Fold `input` into `k` blocks of equal length and set the bit at `block
/// checksum % range` for each block. Trailing bytes that do not fill a
/// block are ignored.
///
/// Panics if `input` is shorter than `k` bytes, as the blocks would be
/// empty and all map to bit 0.
///
/// This is the column derivation for hashed names: their bytes are already
/// uniformly distributed, so summing them is enough.
pub fn checksum_to_vector(input: &[u8], k: usize, range: usize) -> Bitmap {
    assert!(k > 0 && range > 0, "need at least one block and one bit");
    assert!(
        input.len() >= k,
        "input of {} bytes is too short for {} blocks",
        input.len(),
        k
    );
    let mut vector = Bitmap::new(range);
    let block_size = input.len() / k;

    for i in 0..k {
        let block = input
            .get(i * block_size..(i + 1) * block_size)
            .unwrap_or_default();
        let sum = block
            .iter()
            .fold(0_u64, |sum, b| sum.wrapping_add(u64::from(*b)));
        vector.set((sum % range as u64) as usize);
    }

    vector
}
