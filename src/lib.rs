#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]

//! A library that provides Forwarding Information Bases (FIBs) for
//! hierarchical names, as used by name based (information-centric)
//! forwarders.
//!
//! A FIB maps name prefixes to a set of egress ports, and answers longest
//! prefix match queries: given a name, return the ports of the longest of
//! its prefixes that is in the table. Names are sequences of opaque binary
//! segments, see [Name]. Port sets are fixed-capacity bitmaps, see
//! [Bitmap].
//!
//! The crate implements several FIB backends that trade exactness for
//! memory and lookup cost, all behind the [fib::Fib] trait: an exact radix
//! trie, a multi-level hash map after a Cisco design, a trie with bloom
//! filters for long suffixes, a single merged bloom filter matrix, and one
//! prefix bloom filter per port. The building blocks, a byte-keyed
//! [patricia] trie, [bloom] filters and the keyed [hasher]s they probe
//! with, are public as well.
//!
//! Backends are created from the configuration types in [fib::config].

mod types;

#[macro_use]
mod macros;

// Public Interfaces on the root of the crate

/// Bloom filters
pub mod bloom;

/// FIB backends, their common trait and their configuration
pub mod fib;

/// Keyed hash functions for bloom filter probes
pub mod hasher;

/// A radix trie over byte string keys
pub mod patricia;

/// Names and their wire format
pub use types::Name;

/// The fixed-capacity bit vector used for port sets and filters
pub use types::Bitmap;

/// Error types returned by this crate
pub use types::errors;

/// Statistics types returned by the FIB backends
pub use types::stats;
