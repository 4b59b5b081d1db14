//! Fixed-capacity slot arena with a free list.
//!
//! All slots are allocated once at construction. Inserting never grows the
//! backing storage: an entry is written into a slot popped from the free list,
//! and releasing an entry pushes its index back for reuse.
//!
//! ```text
//!   slots (len == capacity, never resized)
//!   ┌─────┬─────────────────────────────────────┐
//!   │ idx │ Slot { entry, prev, next }          │
//!   ├─────┼─────────────────────────────────────┤
//!   │  0  │ { Some((k1, v1)), NONE, 2 }         │
//!   │  1  │ { None,           NONE, NONE }      │  <- free
//!   │  2  │ { Some((k2, v2)), 0,    NONE }      │
//!   └─────┴─────────────────────────────────────┘
//!
//!   free_list: [1]
//! ```
//!
//! Link fields are owned by [`IntrusiveList`](crate::ds::IntrusiveList); the
//! arena only resets them when a slot is released.

use crate::ds::index::SlotIndex;

/// One fixed-position element of the arena.
#[derive(Debug, Clone)]
pub struct Slot<K, V, I> {
    pub(crate) entry: Option<(K, V)>,
    pub(crate) prev: I,
    pub(crate) next: I,
}

impl<K, V, I: SlotIndex> Slot<K, V, I> {
    fn vacant() -> Self {
        Self {
            entry: None,
            prev: I::NONE,
            next: I::NONE,
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.entry.is_some()
    }

    pub fn key(&self) -> Option<&K> {
        self.entry.as_ref().map(|(key, _)| key)
    }

    pub fn value(&self) -> Option<&V> {
        self.entry.as_ref().map(|(_, value)| value)
    }

    pub fn prev(&self) -> I {
        self.prev
    }

    pub fn next(&self) -> I {
        self.next
    }
}

#[derive(Debug)]
pub struct SlotArena<K, V, I> {
    slots: Vec<Slot<K, V, I>>,
    free_list: Vec<I>,
}

impl<K, V, I: SlotIndex> SlotArena<K, V, I> {
    /// Creates an arena with `capacity` slots, clamped below `I::NONE`.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = I::clamp_capacity(capacity);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, Slot::vacant);
        let mut arena = Self {
            slots,
            free_list: Vec::with_capacity(capacity),
        };
        arena.refill_free_list();
        arena
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots currently holding an entry.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free_list.len() == self.slots.len()
    }

    pub fn free_len(&self) -> usize {
        self.free_list.len()
    }

    /// Pops a free slot index, lowest index first on a fresh arena.
    pub fn pop_free(&mut self) -> Option<I> {
        self.free_list.pop()
    }

    /// Writes an entry into `idx`, returning the entry it replaced.
    ///
    /// The slot must have come from [`pop_free`](Self::pop_free) or from an
    /// eviction; its link fields are left untouched.
    pub fn occupy(&mut self, idx: I, key: K, value: V) -> Option<(K, V)> {
        let slot = self.slots.get_mut(idx.as_usize())?;
        slot.entry.replace((key, value))
    }

    /// Empties `idx` and returns it to the free list.
    ///
    /// Returns `None` (and leaves the free list alone) if the slot was
    /// already vacant.
    pub fn release(&mut self, idx: I) -> Option<(K, V)> {
        let slot = self.slots.get_mut(idx.as_usize())?;
        let entry = slot.entry.take()?;
        slot.prev = I::NONE;
        slot.next = I::NONE;
        self.free_list.push(idx);
        Some(entry)
    }

    pub fn get(&self, idx: I) -> Option<&Slot<K, V, I>> {
        if idx.is_none() {
            return None;
        }
        self.slots.get(idx.as_usize())
    }

    pub fn get_mut(&mut self, idx: I) -> Option<&mut Slot<K, V, I>> {
        if idx.is_none() {
            return None;
        }
        self.slots.get_mut(idx.as_usize())
    }

    pub fn contains(&self, idx: I) -> bool {
        self.get(idx).map(Slot::is_occupied).unwrap_or(false)
    }

    /// Empties every slot and restores the free list to its initial order.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            *slot = Slot::vacant();
        }
        self.refill_free_list();
    }

    /// Iterates the free list in pop order (next slot to be handed out first).
    pub fn free_indices(&self) -> impl Iterator<Item = I> + '_ {
        self.free_list.iter().rev().copied()
    }

    /// Iterates occupied slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &K, &V)> {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            slot.entry
                .as_ref()
                .map(|(key, value)| (I::from_usize(idx), key, value))
        })
    }

    /// Returns an approximate memory footprint in bytes, excluding heap data
    /// owned by keys and values.
    pub fn approx_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.slots.capacity() * std::mem::size_of::<Slot<K, V, I>>()
            + self.free_list.capacity() * std::mem::size_of::<I>()
    }

    fn refill_free_list(&mut self) {
        self.free_list.clear();
        self.free_list
            .extend((0..self.slots.len()).rev().map(I::from_usize));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_arena_occupy_release_reuse() {
        let mut arena: SlotArena<u64, &str, u8> = SlotArena::with_capacity(2);
        assert_eq!(arena.capacity(), 2);
        assert!(arena.is_empty());

        let a = arena.pop_free().unwrap();
        assert_eq!(a, 0);
        assert_eq!(arena.occupy(a, 1, "a"), None);
        let b = arena.pop_free().unwrap();
        assert_eq!(b, 1);
        arena.occupy(b, 2, "b");
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.pop_free(), None);

        assert_eq!(arena.release(a), Some((1, "a")));
        assert_eq!(arena.len(), 1);
        assert!(!arena.contains(a));

        let c = arena.pop_free().unwrap();
        assert_eq!(c, a);
        arena.occupy(c, 3, "c");
        assert_eq!(arena.get(c).and_then(Slot::value), Some(&"c"));
    }

    #[test]
    fn slot_arena_occupy_returns_replaced_entry() {
        let mut arena: SlotArena<u64, &str, u16> = SlotArena::with_capacity(1);
        let idx = arena.pop_free().unwrap();
        arena.occupy(idx, 7, "old");
        assert_eq!(arena.occupy(idx, 8, "new"), Some((7, "old")));
        assert_eq!(arena.get(idx).and_then(Slot::key), Some(&8));
    }

    #[test]
    fn slot_arena_double_release_is_ignored() {
        let mut arena: SlotArena<u64, u64, u16> = SlotArena::with_capacity(3);
        let idx = arena.pop_free().unwrap();
        arena.occupy(idx, 1, 1);
        assert!(arena.release(idx).is_some());
        assert!(arena.release(idx).is_none());
        assert_eq!(arena.free_len(), 3);
    }

    #[test]
    fn slot_arena_capacity_is_clamped_below_sentinel() {
        let arena: SlotArena<u64, (), u8> = SlotArena::with_capacity(255);
        assert_eq!(arena.capacity(), 254);
        assert!(arena.get(u8::MAX).is_none());
    }

    #[test]
    fn slot_arena_reset_restores_fresh_order() {
        let mut arena: SlotArena<u64, u64, u16> = SlotArena::with_capacity(4);
        let fresh: Vec<_> = arena.free_indices().collect();
        while let Some(idx) = arena.pop_free() {
            arena.occupy(idx, idx as u64, 0);
        }
        arena.reset();
        assert!(arena.is_empty());
        assert_eq!(arena.free_indices().collect::<Vec<_>>(), fresh);
        assert_eq!(arena.iter().count(), 0);
    }

    #[test]
    fn slot_arena_zero_capacity_never_hands_out_slots() {
        let mut arena: SlotArena<u64, u64, u32> = SlotArena::with_capacity(0);
        assert_eq!(arena.pop_free(), None);
        assert_eq!(arena.len(), 0);
    }
}
