//! Forwarding Information Bases: longest prefix matching of names onto sets
//! of egress ports.
//!
//! All backends implement the [Fib] trait. A FIB is filled with
//! [Fib::insert] calls while the table is built, after which [Fib::lpm] is
//! the hot path, called for every name to be forwarded. The backends differ
//! in how exact the answer is and what it costs:
//!
//! - [PatriciaFib] stores every inserted name in a radix trie. Exact.
//! - [CiscoFib] keeps one hash map per name length, and extends lookups
//!   beyond a fixed depth through "virtual" entries. Exact.
//! - [TbfFib] keeps names up to `T` segments in a radix trie, and the
//!   remainder of longer names in per-length bloom filters hanging off the
//!   trie entries.
//! - [MergedBloomFib] folds all names into one bit matrix with a row per
//!   egress port. Compact, but false positives grow with the load.
//! - [CaesarFib] keeps one [PrefixBloomFilter] per egress port.
//!
//! None of the backends lock internally. Wrap a backend in a [LockedFib] to
//! share it between threads.

mod caesar;
mod cisco;
mod locked;
mod merged;
mod patricia;
mod prefix_bloom;
mod tbf;

pub mod config;

pub use caesar::CaesarFib;
pub use cisco::CiscoFib;
pub use locked::LockedFib;
pub use merged::MergedBloomFib;
pub use patricia::PatriciaFib;
pub use prefix_bloom::PrefixBloomFilter;
pub use tbf::{TbfEntryKind, TbfFib};

use std::borrow::Cow;

use crate::stats::FibStats;
use crate::types::{Bitmap, Name};
use config::BackendKind;

//------------ Fib ------------------------------------------------------------

/// The common interface of all FIB backends.
pub trait Fib {
    /// Add `egress` to the ports of `name`. Inserting the same name and
    /// ports again does not change the table. Returns false if nothing was
    /// stored, which only happens for an empty `egress` on backends that
    /// store ports per name implicitly.
    ///
    /// Panics if `egress` names a port outside of the backend's port
    /// range.
    fn insert(&mut self, name: &Name, egress: &Bitmap) -> bool;

    /// The egress ports of the longest prefix of `name` in the table, or
    /// `None` if no prefix matches.
    ///
    /// The result borrows from the table if the backend stores the port set
    /// as-is, and is built for this call otherwise.
    fn lpm(&self, name: &Name) -> Option<Cow<'_, Bitmap>>;

    fn kind(&self) -> BackendKind;

    fn stats(&self) -> FibStats;
}

//------------ FibBackend -----------------------------------------------------

/// One of the backends, chosen at runtime, e.g. from a
/// [config::FibConfig].
#[derive(Debug)]
pub enum FibBackend {
    Patricia(PatriciaFib),
    Cisco(CiscoFib),
    Tbf(TbfFib),
    MergedBloom(MergedBloomFib),
    Caesar(CaesarFib),
}

macro_rules! dispatch {
    ( $self: ident, $fib: ident => $call: expr ) => {
        match $self {
            FibBackend::Patricia($fib) => $call,
            FibBackend::Cisco($fib) => $call,
            FibBackend::Tbf($fib) => $call,
            FibBackend::MergedBloom($fib) => $call,
            FibBackend::Caesar($fib) => $call,
        }
    };
}

impl Fib for FibBackend {
    fn insert(&mut self, name: &Name, egress: &Bitmap) -> bool {
        dispatch!(self, fib => fib.insert(name, egress))
    }

    fn lpm(&self, name: &Name) -> Option<Cow<'_, Bitmap>> {
        dispatch!(self, fib => fib.lpm(name))
    }

    fn kind(&self) -> BackendKind {
        dispatch!(self, fib => fib.kind())
    }

    fn stats(&self) -> FibStats {
        dispatch!(self, fib => fib.stats())
    }
}
