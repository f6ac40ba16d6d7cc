use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, trace};

use super::config::BackendKind;
use super::Fib;
use crate::bloom::BloomFilter;
use crate::hasher::SipKeyedHasher;
use crate::patricia::PatriciaTrie;
use crate::stats::{Counters, FibStats};
use crate::types::{Bitmap, Name};

//------------ TbfEntryKind ---------------------------------------------------

/// What a trie entry of a [TbfFib] was created for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TbfEntryKind {
    /// The entry holds the ports of a name of at most `T` segments.
    Bitmap,
    /// The entry holds suffix filters for names longer than `T` segments.
    /// It may hold ports as well, if its own prefix was inserted later.
    BloomArray,
}

//------------ TbfEntry -------------------------------------------------------

#[derive(Clone, Debug)]
struct TbfEntry {
    kind: TbfEntryKind,
    egress: Option<Bitmap>,
    // suffix_filters[i] holds the suffixes of i + 1 segments
    suffix_filters: Vec<BloomFilter>,
}

impl TbfEntry {
    fn new(kind: TbfEntryKind) -> Self {
        Self {
            kind,
            egress: None,
            suffix_filters: vec![],
        }
    }

    fn union_egress(&mut self, egress: &Bitmap) {
        match self.egress.as_mut() {
            Some(existing) => existing.union_assign(egress),
            None => self.egress = Some(egress.clone()),
        }
    }
}

//------------ TbfFib ---------------------------------------------------------

/// A FIB that keeps the first `T` segments of every name in a radix trie.
///
/// Names of at most `T` segments store their ports in the trie entry.
/// For a longer name with `B` segments beyond `T`, the `B` remaining
/// segments are added to the `B`-th suffix bloom filter of the entry of its
/// `T`-segment prefix, and its ports go into a hash map keyed by the full
/// name.
///
/// A lookup for a long name tests the suffix filters from the longest down,
/// so the hash map is only consulted for lengths that are likely present.
/// Names of at most `T` segments are matched exactly.
#[derive(Debug)]
pub struct TbfFib {
    trie_depth: usize,
    filter_bits: usize,
    hasher: Arc<SipKeyedHasher>,
    trie: PatriciaTrie<TbfEntry>,
    exact: HashMap<Vec<u8>, Bitmap>,
    counters: Counters,
}

impl TbfFib {
    pub fn new(
        trie_depth: usize,
        filter_bits: usize,
        hasher: SipKeyedHasher,
    ) -> Self {
        assert!(trie_depth > 0, "the trie depth must be positive");
        Self {
            trie_depth,
            filter_bits,
            hasher: Arc::new(hasher),
            trie: PatriciaTrie::new(),
            exact: HashMap::new(),
            counters: Counters::default(),
        }
    }

    pub fn trie_depth(&self) -> usize {
        self.trie_depth
    }

    /// The kind of the trie entry for the `T`-segment prefix of `name` (or
    /// the full name, if it is shorter), if there is one.
    pub fn entry_kind(&self, name: &Name) -> Option<TbfEntryKind> {
        self.entry(name).map(|entry| entry.kind)
    }

    /// The number of suffix filters of the entry for the `T`-segment prefix
    /// of `name`.
    pub fn filter_count(&self, name: &Name) -> usize {
        self.entry(name)
            .map(|entry| entry.suffix_filters.len())
            .unwrap_or(0)
    }

    fn trie_key<'a>(&self, name: &'a Name) -> &'a [u8] {
        name.wire_format(name.segment_count().min(self.trie_depth))
    }

    fn entry(&self, name: &Name) -> Option<&TbfEntry> {
        self.trie.get(self.trie_key(name))
    }

    // The first prefix of at most `depth` segments, longest first, whose
    // trie entry holds ports.
    fn trie_match(&self, name: &Name, depth: usize) -> Option<&Bitmap> {
        (1..=depth.min(name.segment_count())).rev().find_map(|p| {
            self.trie
                .get(name.wire_format(p))
                .and_then(|entry| entry.egress.as_ref())
        })
    }

    fn suffix_match(&self, name: &Name, entry: &TbfEntry) -> Option<&Bitmap> {
        let t = self.trie_depth;
        let longest = name.segment_count().min(entry.suffix_filters.len() + t);

        for p in (t + 1..=longest).rev() {
            let Some(filter) = entry.suffix_filters.get(p - t - 1) else {
                continue;
            };
            let suffix = name.sub_wire_format(t, p);
            let positive = if name.is_hashed() {
                filter.test_hashed(suffix)
            } else {
                filter.test(suffix)
            };
            if !positive {
                continue;
            }
            match self.exact.get(name.wire_format(p)) {
                Some(egress) => return Some(egress),
                None => trace!("false positive at length {} for {}", p, name),
            }
        }
        None
    }

    fn longest_match(&self, name: &Name) -> Option<&Bitmap> {
        let t = self.trie_depth;
        if name.segment_count() > t {
            if let Some(entry) = self.entry(name) {
                if let Some(egress) = self.suffix_match(name, entry) {
                    return Some(egress);
                }
            }
        }
        self.trie_match(name, t)
    }
}

impl Fib for TbfFib {
    fn insert(&mut self, name: &Name, egress: &Bitmap) -> bool {
        self.counters.inc_inserts_count();
        let t = self.trie_depth;
        let n = name.segment_count();
        let key = name.wire_format(n.min(t));

        if n <= t {
            match self.trie.get_mut(key) {
                Some(entry) => entry.union_egress(egress),
                None => {
                    let mut entry = TbfEntry::new(TbfEntryKind::Bitmap);
                    entry.union_egress(egress);
                    self.trie.insert(key, entry);
                }
            }
            return true;
        }

        if self.trie.get(key).is_none() {
            self.trie.insert(key, TbfEntry::new(TbfEntryKind::BloomArray));
        }
        let Some(entry) = self.trie.get_mut(key) else {
            return false;
        };
        entry.kind = TbfEntryKind::BloomArray;

        let b = n - t;
        if entry.suffix_filters.len() < b {
            debug!(
                "grow suffix filters from {} to {} for {}",
                entry.suffix_filters.len(),
                b,
                name
            );
            let (bits, hasher) = (self.filter_bits, &self.hasher);
            entry
                .suffix_filters
                .resize_with(b, || BloomFilter::new(bits, Arc::clone(hasher)));
        }
        if let Some(filter) = entry.suffix_filters.get_mut(b - 1) {
            let suffix = name.sub_wire_format(t, n);
            if name.is_hashed() {
                filter.add_hashed(suffix);
            } else {
                filter.add(suffix);
            }
        }

        match self.exact.get_mut(name.wire_format(n)) {
            Some(existing) => existing.union_assign(egress),
            None => {
                self.exact.insert(name.wire_format(n).to_vec(), egress.clone());
            }
        }
        true
    }

    fn lpm(&self, name: &Name) -> Option<Cow<'_, Bitmap>> {
        let found = self.longest_match(name);
        self.counters.record_lookup(found.is_some());
        found.map(Cow::Borrowed)
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Tbf
    }

    fn stats(&self) -> FibStats {
        self.counters
            .snapshot(self.kind(), self.trie.len() + self.exact.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Name {
        match s.parse() {
            Ok(name) => name,
            Err(err) => panic!("bad test name {}: {}", s, err),
        }
    }

    fn fib(trie_depth: usize) -> TbfFib {
        TbfFib::new(trie_depth, 256, SipKeyedHasher::with_seed(3, 42))
    }

    fn lpm(fib: &TbfFib, s: &str) -> Option<Bitmap> {
        fib.lpm(&name(s)).map(Cow::into_owned)
    }

    #[test]
    fn test_tbf_boundary() {
        let mut fib = fib(2);
        // two segments: a bitmap entry in the trie
        fib.insert(&name("/a/b"), &Bitmap::from_indices(8, [1]));
        assert_eq!(fib.entry_kind(&name("/a/b")), Some(TbfEntryKind::Bitmap));
        assert_eq!(fib.filter_count(&name("/a/b")), 0);

        // four segments: filter index 1 of /a/b
        fib.insert(&name("/a/b/c/d"), &Bitmap::from_indices(8, [2]));
        assert_eq!(fib.entry_kind(&name("/a/b")), Some(TbfEntryKind::BloomArray));
        assert_eq!(fib.filter_count(&name("/a/b/c/d")), 2);
        let entry = fib.entry(&name("/a/b/c/d"));
        assert!(entry.is_some_and(|e| {
            e.suffix_filters.first().is_some_and(BloomFilter::is_empty)
                && e.suffix_filters.get(1).is_some_and(|f| !f.is_empty())
        }));
        assert!(fib.exact.contains_key(name("/a/b/c/d").wire_format(4)));

        assert_eq!(lpm(&fib, "/a/b/c/d"), Some(Bitmap::from_indices(8, [2])));
        assert_eq!(lpm(&fib, "/a/b/c/d/e"), Some(Bitmap::from_indices(8, [2])));
        // an unrelated long name below /a/b gets the T-prefix ports
        assert_eq!(lpm(&fib, "/a/b/x/y"), Some(Bitmap::from_indices(8, [1])));
        assert_eq!(lpm(&fib, "/a/b"), Some(Bitmap::from_indices(8, [1])));
    }

    #[test]
    fn test_tbf_short_names() {
        let mut fib = fib(3);
        fib.insert(&name("/a"), &Bitmap::from_indices(8, [0]));
        fib.insert(&name("/a/b"), &Bitmap::from_indices(8, [1]));

        assert_eq!(fib.entry_kind(&name("/a/b")), Some(TbfEntryKind::Bitmap));
        assert_eq!(lpm(&fib, "/a/b"), Some(Bitmap::from_indices(8, [1])));
        assert_eq!(lpm(&fib, "/a/c"), Some(Bitmap::from_indices(8, [0])));
        assert_eq!(lpm(&fib, "/a/b/c"), Some(Bitmap::from_indices(8, [1])));
        assert_eq!(lpm(&fib, "/a/b/c/d/e"), Some(Bitmap::from_indices(8, [1])));
        assert_eq!(lpm(&fib, "/b"), None);
    }

    #[test]
    fn test_tbf_long_name_without_prefix() {
        let mut fib = fib(1);
        fib.insert(&name("/a/b/c"), &Bitmap::from_indices(8, [5]));

        // the entry at /a exists for its filters only
        assert_eq!(fib.entry_kind(&name("/a")), Some(TbfEntryKind::BloomArray));
        assert_eq!(lpm(&fib, "/a"), None);
        assert_eq!(lpm(&fib, "/a/b"), None);
        assert_eq!(lpm(&fib, "/a/b/c"), Some(Bitmap::from_indices(8, [5])));
        assert_eq!(lpm(&fib, "/a/b/c/d"), Some(Bitmap::from_indices(8, [5])));

        // inserting the prefix itself adds ports to the existing entry
        fib.insert(&name("/a"), &Bitmap::from_indices(8, [0]));
        assert_eq!(fib.entry_kind(&name("/a")), Some(TbfEntryKind::BloomArray));
        assert_eq!(lpm(&fib, "/a/b"), Some(Bitmap::from_indices(8, [0])));
    }

    #[test]
    fn test_tbf_idempotent_insert() {
        let mut fib = fib(1);
        let n = name("/a/b/c");
        fib.insert(&n, &Bitmap::from_indices(8, [1, 2]));
        fib.insert(&n, &Bitmap::from_indices(8, [1, 2]));
        assert_eq!(lpm(&fib, "/a/b/c"), Some(Bitmap::from_indices(8, [1, 2])));
        fib.insert(&n, &Bitmap::from_indices(8, [3]));
        assert_eq!(
            lpm(&fib, "/a/b/c"),
            Some(Bitmap::from_indices(8, [1, 2, 3]))
        );
        // the /a entry plus one exact name
        assert_eq!(fib.stats().entries, 2);
    }

    #[test]
    fn test_tbf_hashed_names() {
        let mut fib = fib(1);
        let long = name("/a/b/c").hashed();
        fib.insert(&long, &Bitmap::from_indices(8, [4]));

        let below = name("/a/b/c/d").hashed();
        assert_eq!(
            fib.lpm(&below).map(Cow::into_owned),
            Some(Bitmap::from_indices(8, [4]))
        );
        assert_eq!(fib.lpm(&name("/a/b/c")), None);
    }
}
