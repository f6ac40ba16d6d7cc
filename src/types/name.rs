//------------ Name ----------------------------------------------------------

//! Hierarchical names and their canonical wire format.
//!
//! A name is a non-empty sequence of opaque binary segments. Every backend
//! keys its tables on the wire format of a prefix of a name, so the
//! encoding must be canonical: the same prefix always yields the same
//! bytes. Each segment is encoded as a TLV with a two byte big-endian type
//! ([SEGMENT_TYPE]), a two byte big-endian length and the segment value.
//!
//! The complete encoding is computed once when the name is created, the
//! prefixes handed out by [Name::wire_format] and [Name::sub_wire_format]
//! are slices into it.

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};

use super::errors::FibError;

/// TLV type of a generic name segment.
pub const SEGMENT_TYPE: u16 = 0x0001;

/// Length of a segment in a hashed name.
pub const HASHED_SEGMENT_LEN: usize = 32;

const TLV_HEADER_LEN: usize = 4;

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Name {
    wire: Vec<u8>,
    // end offset into `wire` of every segment TLV
    ends: Vec<usize>,
    hashed: bool,
}

impl Name {
    /// Create a name from its segments. Fails if there are no segments, or
    /// if a segment is empty or does not fit in a TLV.
    pub fn from_segments<S: AsRef<[u8]>>(
        segments: &[S],
    ) -> Result<Self, FibError> {
        Self::encode(segments, false)
    }

    fn encode<S: AsRef<[u8]>>(
        segments: &[S],
        hashed: bool,
    ) -> Result<Self, FibError> {
        if segments.is_empty() {
            return Err(FibError::InvalidName("a name needs a segment".into()));
        }

        let total = segments
            .iter()
            .map(|s| s.as_ref().len() + TLV_HEADER_LEN)
            .sum();
        let mut wire = Vec::with_capacity(total);
        let mut ends = Vec::with_capacity(segments.len());

        for (i, segment) in segments.iter().enumerate() {
            let segment = segment.as_ref();
            if segment.is_empty() {
                return Err(FibError::InvalidName(format!(
                    "segment {} is empty",
                    i
                )));
            }
            let len = u16::try_from(segment.len()).map_err(|_| {
                FibError::InvalidName(format!(
                    "segment {} is {} bytes long",
                    i,
                    segment.len()
                ))
            })?;
            wire.extend_from_slice(&SEGMENT_TYPE.to_be_bytes());
            wire.extend_from_slice(&len.to_be_bytes());
            wire.extend_from_slice(segment);
            ends.push(wire.len());
        }

        Ok(Self { wire, ends, hashed })
    }

    /// Returns the hashed form of this name: every segment is replaced by
    /// its SHA-256 digest. Hashing an already hashed name returns a copy.
    pub fn hashed(&self) -> Self {
        if self.hashed {
            return self.clone();
        }
        let digests = self
            .segments()
            .map(|s| Sha256::digest(s).to_vec())
            .collect::<Vec<_>>();
        debug_assert!(digests.iter().all(|d| d.len() == HASHED_SEGMENT_LEN));
        // Digests are never empty and always fit a TLV.
        #[allow(clippy::expect_used)]
        let name =
            Self::encode(&digests, true).expect("digests are valid segments");
        name
    }

    pub fn segment_count(&self) -> usize {
        self.ends.len()
    }

    /// True if all segments are fixed-size hash digests.
    pub fn is_hashed(&self) -> bool {
        self.hashed
    }

    /// The wire format of the first `k` segments, `1 <= k <=
    /// segment_count`.
    pub fn wire_format(&self, k: usize) -> &[u8] {
        self.sub_wire_format(0, k)
    }

    /// The wire format of the segments `(lo, hi]`, i.e. skipping the first
    /// `lo` segments and ending after segment `hi`.
    pub fn sub_wire_format(&self, lo: usize, hi: usize) -> &[u8] {
        assert!(
            lo < hi && hi <= self.segment_count(),
            "segment range ({}, {}] out of bounds for a name with {} \
            segments",
            lo,
            hi,
            self.segment_count()
        );
        let start = self.start_of(lo);
        let end = self.start_of(hi);
        self.wire.get(start..end).unwrap_or_default()
    }

    /// The value of the first segment, without its TLV header.
    pub fn first_segment(&self) -> &[u8] {
        self.segments().next().unwrap_or_default()
    }

    /// Iterate over the segment values, without their TLV headers.
    pub fn segments(&self) -> impl Iterator<Item = &[u8]> + '_ {
        (0..self.segment_count()).map(move |i| {
            let start = self.start_of(i) + TLV_HEADER_LEN;
            let end = self.start_of(i + 1);
            self.wire.get(start..end).unwrap_or_default()
        })
    }

    // offset of the TLV of segment `i` (0-based), which is the end of the
    // previous segment.
    fn start_of(&self, i: usize) -> usize {
        match i.checked_sub(1) {
            None => 0,
            Some(prev) => self.ends.get(prev).copied().unwrap_or(0),
        }
    }
}

impl FromStr for Name {
    type Err = FibError;

    /// Parse a name URI such as `ccnx:/a/b/c` or `/a/b/c`. Leading and
    /// trailing slashes are ignored, empty segments in between are not.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path = s.trim();
        let path = path.strip_prefix("ccnx:").unwrap_or(path);
        let path = path.trim_matches('/');
        if path.is_empty() {
            return Err(FibError::InvalidName(format!(
                "{:?} has no segments",
                s
            )));
        }
        let segments = path.split('/').collect::<Vec<_>>();
        Self::from_segments(&segments)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ccnx:")?;
        for segment in self.segments() {
            write!(f, "/")?;
            if self.hashed {
                for b in segment {
                    write!(f, "{:02x}", b)?;
                }
            } else {
                write!(f, "{}", String::from_utf8_lossy(segment))?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self)
    }
}
