//! Slot index widths for the fixed-capacity arena.
//!
//! Every arena and list in this crate is generic over the integer type used to
//! address its slots. The maximum value of that type is reserved as the
//! [`SlotIndex::NONE`] sentinel ("no slot"), so an arena indexed by `u8` holds
//! at most 254 entries, one indexed by `u16` at most 65 534, and so on.
//!
//! ```
//! use lrue::ds::SlotIndex;
//!
//! assert_eq!(<u8 as SlotIndex>::NONE, u8::MAX);
//! assert_eq!(<u8 as SlotIndex>::max_capacity(), 254);
//! assert_eq!(<u8 as SlotIndex>::clamp_capacity(255), 254);
//! assert_eq!(<u8 as SlotIndex>::clamp_capacity(10), 10);
//! ```

use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Unsigned integer type usable as an arena slot index.
pub trait SlotIndex: Copy + Eq + Hash + Debug + Display + Send + Sync + 'static {
    /// Sentinel meaning "no slot". Never aliases a real slot.
    const NONE: Self;

    /// Converts a slot position into an index.
    ///
    /// Callers only pass positions below [`max_capacity`](Self::max_capacity).
    fn from_usize(idx: usize) -> Self;

    /// Returns the slot position addressed by this index.
    fn as_usize(self) -> usize;

    #[inline]
    fn is_none(self) -> bool {
        self == Self::NONE
    }

    /// Largest capacity an arena of this width can hold.
    #[inline]
    fn max_capacity() -> usize {
        Self::NONE.as_usize().saturating_sub(1)
    }

    /// Clamps a requested capacity so the sentinel stays out of range.
    #[inline]
    fn clamp_capacity(requested: usize) -> usize {
        requested.min(Self::max_capacity())
    }
}

macro_rules! impl_slot_index {
    ($($ty:ty),* $(,)?) => {
        $(
            impl SlotIndex for $ty {
                const NONE: Self = <$ty>::MAX;

                #[inline(always)]
                fn from_usize(idx: usize) -> Self {
                    debug_assert!(idx < <$ty>::MAX as usize);
                    idx as $ty
                }

                #[inline(always)]
                fn as_usize(self) -> usize {
                    self as usize
                }
            }
        )*
    };
}

impl_slot_index!(u8, u16, u32, u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_type_max() {
        assert_eq!(<u8 as SlotIndex>::NONE, u8::MAX);
        assert_eq!(<u16 as SlotIndex>::NONE, u16::MAX);
        assert_eq!(<u32 as SlotIndex>::NONE, u32::MAX);
        assert_eq!(<u64 as SlotIndex>::NONE, u64::MAX);
        assert!(<u16 as SlotIndex>::NONE.is_none());
        assert!(!0u16.is_none());
    }

    #[test]
    fn clamp_keeps_capacity_below_sentinel() {
        assert_eq!(<u8 as SlotIndex>::clamp_capacity(255), 254);
        assert_eq!(<u8 as SlotIndex>::clamp_capacity(1000), 254);
        assert_eq!(<u8 as SlotIndex>::clamp_capacity(0), 0);
        assert_eq!(<u16 as SlotIndex>::clamp_capacity(65_535), 65_534);
        assert_eq!(<u32 as SlotIndex>::clamp_capacity(12), 12);
    }

    #[test]
    fn round_trip_positions() {
        for pos in [0usize, 1, 17, 253] {
            assert_eq!(<u8 as SlotIndex>::from_usize(pos).as_usize(), pos);
        }
    }
}
