use std::borrow::Cow;
use std::sync::Arc;

use log::trace;

use super::config::BackendKind;
use super::prefix_bloom::PrefixBloomFilter;
use super::Fib;
use crate::hasher::SipKeyedHasher;
use crate::stats::{Counters, FibStats};
use crate::types::{Bitmap, Name};

//------------ CaesarFib ------------------------------------------------------

/// A FIB with one [PrefixBloomFilter] per egress port.
///
/// A name is added to the filter of each of its ports. A lookup asks every
/// port for the longest prefix of the query it (probably) holds and
/// returns the ports that agree on the overall longest one.
#[derive(Debug)]
pub struct CaesarFib {
    filters: Vec<PrefixBloomFilter>,
    counters: Counters,
}

impl CaesarFib {
    pub fn new(
        ports: usize,
        blocks: usize,
        filter_bits: usize,
        hasher: SipKeyedHasher,
    ) -> Self {
        assert!(ports > 0, "a FIB needs at least one port");
        let hasher = Arc::new(hasher);
        Self {
            filters: (0..ports)
                .map(|_| {
                    PrefixBloomFilter::new(
                        blocks,
                        filter_bits,
                        Arc::clone(&hasher),
                    )
                })
                .collect(),
            counters: Counters::default(),
        }
    }

    pub fn ports(&self) -> usize {
        self.filters.len()
    }

    fn longest_match(&self, name: &Name) -> Option<Bitmap> {
        let lengths = self
            .filters
            .iter()
            .map(|filter| filter.lpm(name))
            .collect::<Vec<_>>();
        let longest = lengths.iter().flatten().copied().max()?;
        trace!("{} matches at length {}", name, longest);

        let mut ports = Bitmap::new(self.ports());
        for (port, len) in lengths.into_iter().enumerate() {
            if len == Some(longest) {
                ports.set(port);
            }
        }
        Some(ports)
    }
}

impl Fib for CaesarFib {
    fn insert(&mut self, name: &Name, egress: &Bitmap) -> bool {
        self.counters.inc_inserts_count();
        if egress.is_empty() {
            return false;
        }

        let ports = self.ports();
        for port in egress.iter() {
            assert!(
                port < ports,
                "egress port {} out of range for {} ports",
                port,
                ports
            );
            if let Some(filter) = self.filters.get_mut(port) {
                filter.add(name);
            }
        }
        true
    }

    fn lpm(&self, name: &Name) -> Option<Cow<'_, Bitmap>> {
        let found = self.longest_match(name);
        self.counters.record_lookup(found.is_some());
        found.map(Cow::Owned)
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Caesar
    }

    fn stats(&self) -> FibStats {
        let entries =
            self.filters.iter().map(PrefixBloomFilter::count_ones).sum();
        self.counters.snapshot(self.kind(), entries)
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

    fn fib() -> CaesarFib {
        CaesarFib::new(4, 8, 1024, SipKeyedHasher::with_seed(3, 9))
    }

    fn lpm(fib: &CaesarFib, s: &str) -> Option<Bitmap> {
        fib.lpm(&name(s)).map(Cow::into_owned)
    }

    #[test]
    fn test_caesar_longest_port_wins() {
        let mut fib = fib();
        fib.insert(&name("/a"), &Bitmap::from_indices(4, [0]));
        fib.insert(&name("/a/b/c"), &Bitmap::from_indices(4, [1, 2]));

        assert_eq!(lpm(&fib, "/a/b/c/d"), Some(Bitmap::from_indices(4, [1, 2])));
        assert_eq!(lpm(&fib, "/a/b"), Some(Bitmap::from_indices(4, [0])));
        assert_eq!(lpm(&fib, "/a"), Some(Bitmap::from_indices(4, [0])));
    }

    #[test]
    fn test_caesar_miss() {
        let mut fib = fib();
        assert_eq!(lpm(&fib, "/a"), None);
        assert!(!fib.insert(&name("/a"), &Bitmap::new(4)));
        assert_eq!(lpm(&fib, "/a"), None);

        let stats = fib.stats();
        assert_eq!(stats.lookups, 2);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.entries, 0);
    }
}
