use std::borrow::Cow;
use std::collections::HashMap;

use log::{debug, trace};

use super::config::BackendKind;
use super::Fib;
use crate::stats::{Counters, FibStats};
use crate::types::{Bitmap, Name};

//------------ CiscoEntry -----------------------------------------------------

#[derive(Clone, Debug)]
struct CiscoEntry {
    // A virtual entry only marks that longer names exist below this prefix.
    is_virtual: bool,
    // The longest name inserted at or below this prefix, as far as it was
    // recorded.
    max_depth: usize,
    egress: Option<Bitmap>,
}

impl CiscoEntry {
    fn new_virtual(max_depth: usize) -> Self {
        Self {
            is_virtual: true,
            max_depth,
            egress: None,
        }
    }

    fn new_concrete(depth: usize, egress: &Bitmap) -> Self {
        Self {
            is_virtual: false,
            max_depth: depth,
            egress: Some(egress.clone()),
        }
    }

    fn concrete(&self) -> Option<&Bitmap> {
        if self.is_virtual {
            None
        } else {
            self.egress.as_ref()
        }
    }
}

//------------ CiscoFib -------------------------------------------------------

/// A FIB with one hash map per name length, after the scheme Cisco
/// presented for NDN forwarding.
///
/// A lookup first tries the prefix lengths `M` down to 1. To avoid probing
/// every possible length beyond `M`, every name longer than `M` leaves a
/// virtual entry at its `M`-segment prefix that records the longest depth
/// below it. A lookup that hits such an entry restarts from that depth
/// instead.
#[derive(Debug)]
pub struct CiscoFib {
    depth: usize,
    // maps[i] holds the prefixes of i + 1 segments
    maps: Vec<HashMap<Vec<u8>, CiscoEntry>>,
    counters: Counters,
}

impl CiscoFib {
    /// Create an empty FIB with first pass depth `M = depth`.
    pub fn new(depth: usize) -> Self {
        assert!(depth > 0, "the first pass depth must be positive");
        Self {
            depth,
            maps: vec![HashMap::new()],
            counters: Counters::default(),
        }
    }

    /// The number of per-length maps, i.e. the longest name inserted so far
    /// (or 1).
    pub fn levels(&self) -> usize {
        self.maps.len()
    }

    fn lookup(&self, name: &Name, depth: usize) -> Option<&CiscoEntry> {
        self.maps
            .get(depth.checked_sub(1)?)?
            .get(name.wire_format(depth))
    }

    // The map for prefixes of `depth` segments, adding maps up to that
    // depth if needed.
    #[allow(clippy::indexing_slicing)]
    fn level_mut(&mut self, depth: usize) -> &mut HashMap<Vec<u8>, CiscoEntry> {
        assert!(depth > 0);
        if self.maps.len() < depth {
            debug!("expand maps from {} to {} levels", self.maps.len(), depth);
            self.maps.resize_with(depth, HashMap::new);
        }
        // resized above
        &mut self.maps[depth - 1]
    }

    fn longest_match(&self, name: &Name) -> Option<&Bitmap> {
        let num_segments = name.segment_count();
        let m = self.depth;

        let mut restart = None;
        for i in (1..=m.min(num_segments)).rev() {
            let Some(entry) = self.lookup(name, i) else {
                continue;
            };
            if entry.max_depth > m && num_segments > m {
                trace!("{} has names up to depth {}", name, entry.max_depth);
                restart = Some(num_segments.min(entry.max_depth));
                break;
            }
            if let Some(egress) = entry.concrete() {
                return Some(egress);
            }
        }

        // Second pass from the recorded depth. This covers depth M and all
        // shorter prefixes once more, so a virtual entry at M falls through
        // to its nearest concrete ancestor.
        (1..=restart?)
            .rev()
            .find_map(|i| self.lookup(name, i).and_then(CiscoEntry::concrete))
    }
}

impl Fib for CiscoFib {
    fn insert(&mut self, name: &Name, egress: &Bitmap) -> bool {
        self.counters.inc_inserts_count();
        let num_segments = name.segment_count();
        let m = self.depth;

        // Names beyond M leave a (virtual, unless there is a real one) entry
        // at M with the maximum depth below it.
        if num_segments > m {
            let level = self.level_mut(m);
            let key = name.wire_format(m);
            match level.get_mut(key) {
                Some(entry) => {
                    entry.max_depth = entry.max_depth.max(num_segments)
                }
                None => {
                    debug!("virtual entry at depth {} for {}", m, name);
                    level.insert(
                        key.to_vec(),
                        CiscoEntry::new_virtual(num_segments),
                    );
                }
            }
        }

        let level = self.level_mut(num_segments);
        let key = name.wire_format(num_segments);
        match level.get_mut(key) {
            Some(entry) => {
                entry.is_virtual = false;
                entry.max_depth = entry.max_depth.max(num_segments);
                match entry.egress.as_mut() {
                    Some(existing) => existing.union_assign(egress),
                    None => entry.egress = Some(egress.clone()),
                }
            }
            None => {
                level.insert(
                    key.to_vec(),
                    CiscoEntry::new_concrete(num_segments, egress),
                );
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
        BackendKind::Cisco
    }

    fn stats(&self) -> FibStats {
        let entries = self.maps.iter().map(HashMap::len).sum();
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

    fn lpm(fib: &CiscoFib, s: &str) -> Option<Bitmap> {
        fib.lpm(&name(s)).map(Cow::into_owned)
    }

    #[test]
    fn test_cisco_short_names() {
        let mut fib = CiscoFib::new(3);
        fib.insert(&name("/a"), &Bitmap::from_indices(4, [0]));
        fib.insert(&name("/a/b"), &Bitmap::from_indices(4, [1]));

        assert_eq!(lpm(&fib, "/a/b/c"), Some(Bitmap::from_indices(4, [1])));
        assert_eq!(lpm(&fib, "/a/c"), Some(Bitmap::from_indices(4, [0])));
        assert_eq!(lpm(&fib, "/b"), None);
        assert_eq!(fib.levels(), 2);
    }

    #[test]
    fn test_cisco_virtual_entry() {
        let mut fib = CiscoFib::new(2);
        let long = name("/a/b/c/d/e");
        fib.insert(&long, &Bitmap::from_indices(4, [3]));

        // a virtual ancestor at depth M
        let entry = fib.lookup(&long, 2);
        assert!(entry.is_some_and(|e| e.is_virtual && e.max_depth == 5));
        assert_eq!(fib.levels(), 5);

        // never inserted: the virtual entry does not match
        assert_eq!(lpm(&fib, "/a"), None);
        assert_eq!(lpm(&fib, "/a/b"), None);
        assert_eq!(lpm(&fib, "/a/b/c"), None);
        // the long name itself, and names below it
        assert_eq!(lpm(&fib, "/a/b/c/d/e"), Some(Bitmap::from_indices(4, [3])));
        assert_eq!(
            lpm(&fib, "/a/b/c/d/e/f/g"),
            Some(Bitmap::from_indices(4, [3]))
        );
        assert_eq!(lpm(&fib, "/a/b/c/d/x"), None);
    }

    #[test]
    fn test_cisco_virtual_falls_back_to_ancestor() {
        let mut fib = CiscoFib::new(2);
        fib.insert(&name("/a"), &Bitmap::from_indices(4, [0]));
        fib.insert(&name("/a/b/c/d"), &Bitmap::from_indices(4, [1]));

        assert_eq!(lpm(&fib, "/a/b/c/x"), Some(Bitmap::from_indices(4, [0])));
        assert_eq!(lpm(&fib, "/a/b"), Some(Bitmap::from_indices(4, [0])));
        assert_eq!(lpm(&fib, "/a/b/c/d/e"), Some(Bitmap::from_indices(4, [1])));
    }

    #[test]
    fn test_cisco_virtual_made_concrete() {
        let mut fib = CiscoFib::new(2);
        fib.insert(&name("/a/b/c"), &Bitmap::from_indices(4, [1]));
        fib.insert(&name("/a/b"), &Bitmap::from_indices(4, [2]));

        let entry = fib.lookup(&name("/a/b"), 2);
        assert!(entry.is_some_and(|e| !e.is_virtual && e.max_depth == 3));

        assert_eq!(lpm(&fib, "/a/b/x"), Some(Bitmap::from_indices(4, [2])));
        assert_eq!(lpm(&fib, "/a/b/c/x"), Some(Bitmap::from_indices(4, [1])));
        assert_eq!(lpm(&fib, "/a/b"), Some(Bitmap::from_indices(4, [2])));
    }

    #[test]
    fn test_cisco_max_depth_grows() {
        let mut fib = CiscoFib::new(1);
        fib.insert(&name("/a/b"), &Bitmap::from_indices(4, [1]));
        fib.insert(&name("/a/b/c/d"), &Bitmap::from_indices(4, [2]));
        fib.insert(&name("/a/x/y"), &Bitmap::from_indices(4, [3]));

        let entry = fib.lookup(&name("/a"), 1);
        assert!(entry.is_some_and(|e| e.max_depth == 4));

        assert_eq!(lpm(&fib, "/a/b/c"), Some(Bitmap::from_indices(4, [1])));
        assert_eq!(lpm(&fib, "/a/b/c/d/e"), Some(Bitmap::from_indices(4, [2])));
        assert_eq!(lpm(&fib, "/a/x/y"), Some(Bitmap::from_indices(4, [3])));
        assert_eq!(lpm(&fib, "/a/x"), None);
    }

    #[test]
    fn test_cisco_idempotent_insert() {
        let mut fib = CiscoFib::new(2);
        let n = name("/a/b/c");
        fib.insert(&n, &Bitmap::from_indices(4, [1, 2]));
        let first = lpm(&fib, "/a/b/c");
        fib.insert(&n, &Bitmap::from_indices(4, [1, 2]));
        assert_eq!(lpm(&fib, "/a/b/c"), first);
        assert_eq!(fib.stats().entries, 2);
    }
}
