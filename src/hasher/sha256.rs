use sha2::{Digest, Sha256};

use super::KeyedHasher;
use crate::types::Bitmap;

//------------ Sha256Hasher ---------------------------------------------------

/// Unkeyed SHA-256 as a [KeyedHasher]. It derives a single bit position per
/// input from the first eight bytes of the digest, read big-endian.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha256Hasher;

impl Sha256Hasher {
    pub fn new() -> Self {
        Self
    }
}

impl KeyedHasher for Sha256Hasher {
    fn hash(&self, input: &[u8]) -> Vec<u8> {
        Sha256::digest(input).to_vec()
    }

    fn hash_to_vector(&self, input: &[u8], range: usize) -> Bitmap {
        assert!(range > 0, "cannot hash into an empty range");
        let digest = Sha256::digest(input);
        let mut head = [0_u8; 8];
        head.copy_from_slice(digest.get(..8).unwrap_or(&[0; 8]));

        let mut vector = Bitmap::new(range);
        vector.set((u64::from_be_bytes(head) % range as u64) as usize);
        vector
    }

    fn probes(&self) -> usize {
        1
    }
}
