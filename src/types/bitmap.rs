use std::fmt;

use roaring::RoaringBitmap;

//------------ Bitmap --------------------------------------------------------

/// A bit vector with a fixed capacity of `len` bits.
///
/// The same type is used for the set of egress ports of a FIB entry and for
/// the bit arrays backing the bloom filters. The capacity is fixed at
/// creation; setting or reading a bit at an index `>= len` is a programming
/// error and panics.
///
/// The bits themselves are kept in a compressed [RoaringBitmap], so sparse
/// port sets and lightly loaded filters stay small.
#[derive(Clone, PartialEq)]
pub struct Bitmap {
    len: usize,
    bits: RoaringBitmap,
}

// RoaringBitmap compares its set members, which is a total equality.
impl Eq for Bitmap {}

impl Bitmap {
    /// Create a zero-filled bitmap that can hold `len` bits.
    pub fn new(len: usize) -> Self {
        assert!(
            len <= u32::MAX as usize,
            "bitmap capacity {} exceeds the maximum of {}",
            len,
            u32::MAX
        );
        Self {
            len,
            bits: RoaringBitmap::new(),
        }
    }

    /// Create a bitmap of capacity `len` with all bits in `indices` set.
    pub fn from_indices<I: IntoIterator<Item = usize>>(
        len: usize,
        indices: I,
    ) -> Self {
        let mut bitmap = Self::new(len);
        for i in indices {
            bitmap.set(i);
        }
        bitmap
    }

    /// The capacity of this bitmap in bits.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn set(&mut self, index: usize) {
        self.bits.insert(self.checked(index));
    }

    pub fn get(&self, index: usize) -> bool {
        self.bits.contains(self.checked(index))
    }

    /// OR `other` into this bitmap. Both bitmaps must have the same
    /// capacity.
    pub fn union_assign(&mut self, other: &Bitmap) {
        assert_eq!(
            self.len, other.len,
            "cannot merge bitmaps of different capacity"
        );
        self.bits |= &other.bits;
    }

    /// Returns true if every bit set in `self` is also set in `other`.
    pub fn is_subset(&self, other: &Bitmap) -> bool {
        self.bits.is_subset(&other.bits)
    }

    /// The number of set bits.
    pub fn count_ones(&self) -> usize {
        self.bits.len() as usize
    }

    /// Returns true if no bit is set. Note that this says nothing about the
    /// capacity, use [Bitmap::len] for that.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Iterate over the indices of the set bits in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter().map(|i| i as usize)
    }

    fn checked(&self, index: usize) -> u32 {
        assert!(
            index < self.len,
            "bitmap index {} out of range for capacity {}",
            index,
            self.len
        );
        index as u32
    }
}

impl fmt::Display for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (n, i) in self.iter().enumerate() {
            if n > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", i)?;
        }
        write!(f, "}}/{}", self.len)
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bitmap({})", self)
    }
}
