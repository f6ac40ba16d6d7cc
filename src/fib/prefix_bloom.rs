use std::sync::Arc;

use log::trace;

use crate::bloom::BloomFilter;
use crate::hasher::{checksum, djb2, SipKeyedHasher};
use crate::types::Name;

//------------ PrefixBloomFilter ----------------------------------------------

/// A set of names split over `b` bloom filter blocks by their first
/// segment.
///
/// All prefixes of a name share its first segment, so they all land in the
/// same block. A longest prefix query therefore only ever touches one
/// block, which keeps the whole query within a small piece of memory.
#[derive(Clone, Debug)]
pub struct PrefixBloomFilter {
    blocks: Vec<BloomFilter>,
}

impl PrefixBloomFilter {
    /// Create `blocks` empty blocks of `filter_bits` bits each, all probed
    /// through `hasher`.
    pub fn new(
        blocks: usize,
        filter_bits: usize,
        hasher: Arc<SipKeyedHasher>,
    ) -> Self {
        assert!(blocks > 0, "a prefix bloom filter needs at least one block");
        Self {
            blocks: (0..blocks)
                .map(|_| BloomFilter::new(filter_bits, Arc::clone(&hasher)))
                .collect(),
        }
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// The block `name` and all of its prefixes belong to: the hash of the
    /// wire format of the first segment, modulo the number of blocks.
    /// Hashed names use [checksum], all others [djb2].
    pub fn block_index(&self, name: &Name) -> usize {
        let first = name.wire_format(1);
        let hash = if name.is_hashed() {
            u64::from(checksum(first))
        } else {
            djb2(first)
        };
        (hash % self.blocks.len() as u64) as usize
    }

    /// Add the complete `name` to its block. Its prefixes are not added.
    pub fn add(&mut self, name: &Name) {
        let index = self.block_index(name);
        let wire = name.wire_format(name.segment_count());
        if let Some(block) = self.blocks.get_mut(index) {
            if name.is_hashed() {
                block.add_hashed(wire);
            } else {
                block.add(wire);
            }
        }
    }

    /// The length in segments of the longest prefix of `name` that tests
    /// positive, or `None` if none does.
    pub fn lpm(&self, name: &Name) -> Option<usize> {
        let index = self.block_index(name);
        let block = self.blocks.get(index)?;
        let found = (1..=name.segment_count()).rev().find(|&p| {
            let wire = name.wire_format(p);
            if name.is_hashed() {
                block.test_hashed(wire)
            } else {
                block.test(wire)
            }
        });
        trace!("{} in block {}: {:?}", name, index, found);
        found
    }

    /// The number of set bits over all blocks.
    pub fn count_ones(&self) -> usize {
        self.blocks.iter().map(BloomFilter::count_ones).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(BloomFilter::is_empty)
    }
}
