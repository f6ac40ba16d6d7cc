//------------ Types for Statistics -----------------------------------------

use std::fmt::{Debug, Display};
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_derive::Serialize;

use crate::fib::config::BackendKind;

//------------ Counters -----------------------------------------------------
//
// This is the struct that's part of the data structure of each backend.
// Lookups take `&self`, so the counters are atomics.

#[derive(Debug, Default)]
pub(crate) struct Counters {
    // number of insert calls.
    inserts: AtomicUsize,
    // number of lpm calls.
    lookups: AtomicUsize,
    // number of lpm calls that returned an egress set.
    hits: AtomicUsize,
}

impl Counters {
    pub fn inserts_count(&self) -> usize {
        self.inserts.load(Ordering::Relaxed)
    }

    pub fn inc_inserts_count(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn lookups_count(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }

    pub fn hits_count(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    /// Count a lookup, and a hit if `found`. Returns `found` so it can wrap
    /// the tail of an lpm call.
    pub fn record_lookup(&self, found: bool) -> bool {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        if found {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    pub fn snapshot(&self, backend: BackendKind, entries: usize) -> FibStats {
        let lookups = self.lookups_count();
        let hits = self.hits_count();
        FibStats {
            backend,
            inserts: self.inserts_count(),
            lookups,
            hits,
            misses: lookups.saturating_sub(hits),
            entries,
        }
    }
}

//------------ FibStats ------------------------------------------------------

/// A point-in-time copy of the counters of a FIB.
///
/// `entries` is backend specific: stored prefixes for the exact backends,
/// set bits over all filters for the bloom filter backends.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FibStats {
    pub backend: BackendKind,
    pub inserts: usize,
    pub lookups: usize,
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
}

impl Display for FibStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "backend:\t{}", self.backend)?;
        writeln!(f, "inserts:\t{}", self.inserts)?;
        writeln!(f, "lookups:\t{}", self.lookups)?;
        writeln!(f, "hits:\t\t{}", self.hits)?;
        writeln!(f, "misses:\t\t{}", self.misses)?;
        write!(f, "entries:\t{}", self.entries)
    }
}
