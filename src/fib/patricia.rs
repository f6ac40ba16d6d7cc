use std::borrow::Cow;

use log::trace;

use super::config::BackendKind;
use super::Fib;
use crate::patricia::PatriciaTrie;
use crate::stats::{Counters, FibStats};
use crate::types::{Bitmap, Name};

//------------ PatriciaFib ----------------------------------------------------

/// The naive exact FIB: every inserted name is a key in a radix trie, and a
/// lookup tries every prefix of the query name, longest first.
#[derive(Debug, Default)]
pub struct PatriciaFib {
    trie: PatriciaTrie<Bitmap>,
    counters: Counters,
}

impl PatriciaFib {
    pub fn new() -> Self {
        Self::default()
    }

    fn longest_match(&self, name: &Name) -> Option<&Bitmap> {
        (1..=name.segment_count())
            .rev()
            .find_map(|p| self.trie.get(name.wire_format(p)))
    }
}

impl Fib for PatriciaFib {
    fn insert(&mut self, name: &Name, egress: &Bitmap) -> bool {
        self.counters.inc_inserts_count();
        let key = name.wire_format(name.segment_count());
        match self.trie.get_mut(key) {
            Some(existing) => existing.union_assign(egress),
            None => {
                trace!("new entry for {}", name);
                self.trie.insert(key, egress.clone());
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
        BackendKind::Patricia
    }

    fn stats(&self) -> FibStats {
        self.counters.snapshot(self.kind(), self.trie.len())
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

    #[test]
    fn test_patricia_fib_lpm() {
        let mut fib = PatriciaFib::new();
        fib.insert(&name("/a"), &Bitmap::from_indices(8, [1]));
        fib.insert(&name("/a/b/c"), &Bitmap::from_indices(8, [2]));

        let lpm = |s| fib.lpm(&name(s)).map(Cow::into_owned);
        assert_eq!(lpm("/a/b/c/d"), Some(Bitmap::from_indices(8, [2])));
        assert_eq!(lpm("/a/b/c"), Some(Bitmap::from_indices(8, [2])));
        assert_eq!(lpm("/a/b"), Some(Bitmap::from_indices(8, [1])));
        assert_eq!(lpm("/b"), None);

        let stats = fib.stats();
        assert_eq!(stats.inserts, 2);
        assert_eq!(stats.lookups, 4);
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 2);
    }

    #[test]
    fn test_patricia_fib_union_on_reinsert() {
        let mut fib = PatriciaFib::new();
        fib.insert(&name("/a/b"), &Bitmap::from_indices(8, [1]));
        fib.insert(&name("/a/b"), &Bitmap::from_indices(8, [3]));
        fib.insert(&name("/a/b"), &Bitmap::from_indices(8, [3]));
        assert_eq!(
            fib.lpm(&name("/a/b")).map(Cow::into_owned),
            Some(Bitmap::from_indices(8, [1, 3]))
        );
        assert_eq!(fib.stats().entries, 1);
    }
}
