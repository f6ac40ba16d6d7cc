use std::hash::Hasher;

use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use siphasher::sip::SipHasher24;

use super::KeyedHasher;
use crate::types::Bitmap;

/// Length of a SipHash key in bytes.
pub const SIPHASH_KEY_LENGTH: usize = 16;

pub type SipKey = [u8; SIPHASH_KEY_LENGTH];

//------------ SipKeyedHasher -------------------------------------------------

/// SipHash-2-4 under `k` independent keys.
///
/// [KeyedHasher::hash_to_vector] hashes the input once under every key and
/// sets one bit per key, so this hasher gives a bloom filter its `k`
/// probes.
#[derive(Clone)]
pub struct SipKeyedHasher {
    // every key split in its two little-endian halves
    keys: Vec<(u64, u64)>,
}

impl SipKeyedHasher {
    /// Create a hasher with `k` keys drawn from the thread-local RNG.
    pub fn new(k: usize) -> Self {
        let mut rng = rand::rng();
        Self::from_rng(k, &mut rng)
    }

    /// Create a hasher with `k` keys drawn from an RNG seeded with `seed`.
    /// Two hashers created with the same `k` and `seed` are identical, which
    /// is what you want for reproducible tables.
    pub fn with_seed(k: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::from_rng(k, &mut rng)
    }

    fn from_rng<R: Rng>(k: usize, rng: &mut R) -> Self {
        let keys = (0..k).map(|_| rng.random::<SipKey>()).collect::<Vec<_>>();
        Self::from_keys(&keys)
    }

    /// Create a hasher with exactly these keys.
    pub fn from_keys(keys: &[SipKey]) -> Self {
        assert!(!keys.is_empty(), "a keyed hasher needs at least one key");
        let keys = keys
            .iter()
            .map(|key| {
                let (lo, hi) = key.split_at(SIPHASH_KEY_LENGTH / 2);
                (le_u64(lo), le_u64(hi))
            })
            .collect();
        Self { keys }
    }

    /// The 64-bit digests of `input`, one per key.
    pub fn hash_u64s<'a>(
        &'a self,
        input: &'a [u8],
    ) -> impl Iterator<Item = u64> + 'a {
        self.keys.iter().map(move |(k0, k1)| {
            let mut hasher = SipHasher24::new_with_keys(*k0, *k1);
            hasher.write(input);
            hasher.finish()
        })
    }
}

fn le_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0_u8; 8];
    for (dst, src) in buf.iter_mut().zip(bytes) {
        *dst = *src;
    }
    u64::from_le_bytes(buf)
}

impl KeyedHasher for SipKeyedHasher {
    /// The concatenation of the little-endian 64-bit digests under every
    /// key.
    fn hash(&self, input: &[u8]) -> Vec<u8> {
        self.hash_u64s(input).flat_map(u64::to_le_bytes).collect()
    }

    fn hash_to_vector(&self, input: &[u8], range: usize) -> Bitmap {
        assert!(range > 0, "cannot hash into an empty range");
        let mut vector = Bitmap::new(range);
        for h in self.hash_u64s(input) {
            vector.set((h % range as u64) as usize);
        }
        trace!("siphash columns {}", vector);
        vector
    }

    fn probes(&self) -> usize {
        self.keys.len()
    }
}

impl std::fmt::Debug for SipKeyedHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the keys.
        f.debug_struct("SipKeyedHasher")
            .field("k", &self.keys.len())
            .finish()
    }
}
