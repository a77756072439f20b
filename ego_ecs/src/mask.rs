//! Utilities for capability masks of entities and systems.

use std::fmt;

use fixedbitset::FixedBitSet;

/// Fixed-size bit vector over the index space of the [`Registry`](crate::Registry).
///
/// Bit `i` set means that component type with index `i` is present
/// (for an entity) or required (for a system).
/// Length of the mask never changes after creation.
///
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct CapabilityMask {
    bits: FixedBitSet,
}

impl CapabilityMask {
    /// Creates an empty mask which can hold `len` bits.
    pub fn with_len(len: usize) -> Self {
        Self {
            bits: FixedBitSet::with_capacity(len),
        }
    }

    /// Count of bits this mask can hold.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Returns `true` if this mask cannot hold any bit.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Returns `true` if no bit is set.
    pub fn is_clear(&self) -> bool {
        self.bits.is_clear()
    }

    /// Marks bit with given index.
    ///
    /// # Panics
    ///
    /// Panics if index is out of bounds of the mask.
    ///
    pub fn set(&mut self, index: usize) {
        assert!(
            index < self.len(),
            "bit index {} is out of mask bounds ({})",
            index,
            self.len(),
        );
        self.bits.insert(index);
    }

    /// Unmarks bit with given index.
    ///
    /// # Panics
    ///
    /// Panics if index is out of bounds of the mask.
    ///
    pub fn clear(&mut self, index: usize) {
        assert!(
            index < self.len(),
            "bit index {} is out of mask bounds ({})",
            index,
            self.len(),
        );
        self.bits.set(index, false);
    }

    /// Unmarks all bits of the mask.
    pub fn clear_all(&mut self) {
        self.bits.clear();
    }

    /// Returns `true` if bit with given index is set.
    /// Indices out of bounds are never set.
    pub fn contains(&self, index: usize) -> bool {
        self.bits.contains(index)
    }

    /// Count of set bits.
    pub fn count_ones(&self) -> usize {
        self.bits.count_ones(..)
    }

    /// Iterator over indices of all set bits in ascending order.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.ones()
    }

    /// Returns `true` if every bit set in `required` is also set in this mask.
    pub fn is_superset_of(&self, required: &Self) -> bool {
        self.bits.is_superset(&required.bits)
    }
}

/// Returns `true` if every bit set in `required` is also set in `candidate`.
///
/// Vacuously true when `required` has no bits set.
///
pub fn is_superset(candidate: &CapabilityMask, required: &CapabilityMask) -> bool {
    candidate.is_superset_of(required)
}

impl fmt::Debug for CapabilityMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.ones()).finish()
    }
}
