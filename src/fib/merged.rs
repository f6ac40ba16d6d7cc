use std::borrow::Cow;

use log::trace;

use super::config::BackendKind;
use super::Fib;
use crate::hasher::{checksum_to_vector, KeyedHasher, SipKeyedHasher};
use crate::stats::{Counters, FibStats};
use crate::types::{Bitmap, Name};

//------------ MergedBloomFib -------------------------------------------------

/// A FIB made of one bloom filter per egress port, all sharing the same
/// hash keys, so that they form a bit matrix of `N` rows and `m` columns.
///
/// Inserting a name sets its `k` columns in the rows of its ports. A lookup
/// computes the columns of each prefix of the query, longest first, and
/// returns the rows that have all of them set. The first prefix length with
/// any such row wins.
///
/// Names are never stored, so a lookup may return ports for a name that
/// was never inserted, and the chance of that grows with every insert.
#[derive(Debug)]
pub struct MergedBloomFib {
    filter_bits: usize,
    hasher: SipKeyedHasher,
    // rows[port] is the bloom filter of that port
    rows: Vec<Bitmap>,
    counters: Counters,
}

impl MergedBloomFib {
    pub fn new(
        ports: usize,
        filter_bits: usize,
        hasher: SipKeyedHasher,
    ) -> Self {
        assert!(ports > 0, "a merged bloom filter needs at least one port");
        assert!(filter_bits > 0, "a merged bloom filter needs a bit");
        Self {
            filter_bits,
            hasher,
            rows: vec![Bitmap::new(filter_bits); ports],
            counters: Counters::default(),
        }
    }

    /// The number of egress ports `N`.
    pub fn ports(&self) -> usize {
        self.rows.len()
    }

    /// The fraction of set bits in the row of `port`, or `None` if there is
    /// no such port.
    pub fn fill_ratio(&self, port: usize) -> Option<f64> {
        self.rows
            .get(port)
            .map(|row| row.count_ones() as f64 / self.filter_bits as f64)
    }

    // The columns of the first `p` segments of `name`.
    fn columns(&self, name: &Name, p: usize) -> Bitmap {
        let wire = name.wire_format(p);
        if name.is_hashed() {
            checksum_to_vector(wire, self.hasher.probes(), self.filter_bits)
        } else {
            self.hasher.hash_to_vector(wire, self.filter_bits)
        }
    }

    fn matching_rows(&self, columns: &Bitmap) -> Bitmap {
        let mut ports = Bitmap::new(self.ports());
        for (port, row) in self.rows.iter().enumerate() {
            if columns.is_subset(row) {
                ports.set(port);
            }
        }
        ports
    }

    fn longest_match(&self, name: &Name) -> Option<Bitmap> {
        (1..=name.segment_count()).rev().find_map(|p| {
            let ports = self.matching_rows(&self.columns(name, p));
            if ports.is_empty() {
                return None;
            }
            trace!("{} matches at length {}: {}", name, p, ports);
            Some(ports)
        })
    }
}

impl Fib for MergedBloomFib {
    fn insert(&mut self, name: &Name, egress: &Bitmap) -> bool {
        self.counters.inc_inserts_count();
        if egress.is_empty() {
            return false;
        }

        let columns = self.columns(name, name.segment_count());
        let ports = self.ports();
        for port in egress.iter() {
            assert!(
                port < ports,
                "egress port {} out of range for {} ports",
                port,
                ports
            );
            if let Some(row) = self.rows.get_mut(port) {
                row.union_assign(&columns);
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
        BackendKind::MergedBloom
    }

    fn stats(&self) -> FibStats {
        let entries = self.rows.iter().map(Bitmap::count_ones).sum();
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

    fn lpm(fib: &MergedBloomFib, s: &str) -> Option<Bitmap> {
        fib.lpm(&name(s)).map(Cow::into_owned)
    }

    #[test]
    fn test_merged_true_positive() {
        let mut fib =
            MergedBloomFib::new(8, 1024, SipKeyedHasher::with_seed(3, 1));
        assert!(fib.insert(&name("/a/b"), &Bitmap::from_indices(8, [2, 5])));

        let found = lpm(&fib, "/a/b");
        assert!(found.is_some_and(|ports| ports.get(2) && ports.get(5)));
        let found = lpm(&fib, "/a/b/c/d");
        assert!(found.is_some_and(|ports| ports.get(2) && ports.get(5)));
    }

    #[test]
    fn test_merged_empty_egress() {
        let mut fib = MergedBloomFib::new(4, 64, SipKeyedHasher::with_seed(2, 1));
        assert!(!fib.insert(&name("/a"), &Bitmap::new(4)));
        assert_eq!(fib.stats().entries, 0);
        assert_eq!(lpm(&fib, "/a"), None);
    }

    #[test]
    fn test_merged_induced_false_positive() {
        let mut fib =
            MergedBloomFib::new(4, 16, SipKeyedHasher::with_seed(2, 7));
        for i in 0..200 {
            fib.insert(
                &name(&format!("/load/{}", i)),
                &Bitmap::from_indices(4, [0]),
            );
        }
        assert_eq!(fib.fill_ratio(0), Some(1.0));
        assert_eq!(fib.fill_ratio(1), Some(0.0));

        // never inserted, yet row 0 has every column set
        assert_eq!(
            lpm(&fib, "/never/inserted"),
            Some(Bitmap::from_indices(4, [0]))
        );
    }

    #[test]
    fn test_merged_monotonic() {
        let mut fib =
            MergedBloomFib::new(16, 256, SipKeyedHasher::with_seed(3, 3));
        let names = (0..50).map(|i| format!("/m/{}/x", i)).collect::<Vec<_>>();

        for (i, n) in names.iter().enumerate() {
            let egress = Bitmap::from_indices(16, [i % 16]);
            fib.insert(&name(n), &egress);

            // every name inserted so far still reports its port
            for (j, earlier) in names.iter().enumerate().take(i + 1) {
                let found = lpm(&fib, earlier);
                assert!(
                    found.is_some_and(|ports| ports.get(j % 16)),
                    "{} lost port {}",
                    earlier,
                    j % 16
                );
            }
        }
    }

    #[test]
    fn test_merged_hashed_names() {
        let mut fib =
            MergedBloomFib::new(4, 512, SipKeyedHasher::with_seed(3, 5));
        let hashed = name("/a/b").hashed();
        fib.insert(&hashed, &Bitmap::from_indices(4, [3]));
        let found = fib.lpm(&name("/a/b/c").hashed()).map(Cow::into_owned);
        assert!(found.is_some_and(|ports| ports.get(3)));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_merged_port_out_of_range() {
        let mut fib = MergedBloomFib::new(4, 64, SipKeyedHasher::with_seed(2, 1));
        fib.insert(&name("/a"), &Bitmap::from_indices(8, [6]));
    }
}
