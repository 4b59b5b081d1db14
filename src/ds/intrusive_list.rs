//! Intrusive doubly linked list threaded through a fixed `SlotArena`.
//!
//! Nodes are arena slots and links are slot indices, so splicing a node to
//! the front or detaching the tail never allocates and never chases a
//! pointer. The sentinel `I::NONE` terminates the chain in both directions.
//!
//! ## Architecture
//!
//! ```text
//!   arena (SlotArena<K, V, I>)
//!   ┌─────┬──────────────────────────────────────────┐
//!   │ idx │ Slot { entry, prev, next }               │
//!   ├─────┼──────────────────────────────────────────┤
//!   │  3  │ { (k_a, v_a), prev: NONE, next: 0 }      │
//!   │  0  │ { (k_b, v_b), prev: 3,    next: 5 }      │
//!   │  5  │ { (k_c, v_c), prev: 0,    next: NONE }   │
//!   └─────┴──────────────────────────────────────────┘
//!
//!   head ─► [3] ◄──► [0] ◄──► [5] ◄── tail
//!           MRU                LRU
//! ```
//!
//! ## Operations
//! - `link_as_head(idx)`: detach (if linked) + attach at head
//! - `unlink(idx)`: patch neighbours, follow head/tail, reset own links
//! - `evict_tail()`: unlink the LRU node and hand back its index
//!
//! ## Performance
//! - `link_as_head` / `unlink` / `evict_tail`: O(1)
//! - `iter`: O(n)
//!
//! `check_invariants()` walks the whole structure and is meant for tests.

use crate::ds::index::SlotIndex;
use crate::ds::slot_arena::{Slot, SlotArena};
use crate::error::InvariantError;

/// Traversal order over the recency list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Head to tail.
    #[default]
    MostRecentFirst,
    /// Tail to head.
    LeastRecentFirst,
}

/// Recency list whose nodes live in an owned, fixed-capacity arena.
#[derive(Debug)]
pub struct IntrusiveList<K, V, I> {
    arena: SlotArena<K, V, I>,
    head: I,
    tail: I,
    len: usize,
}

impl<K, V, I: SlotIndex> IntrusiveList<K, V, I> {
    /// Creates an empty list backed by `capacity` preallocated slots.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: SlotArena::with_capacity(capacity),
            head: I::NONE,
            tail: I::NONE,
            len: 0,
        }
    }

    /// Returns the number of linked nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Returns the index at the front (MRU) of the list.
    pub fn front_id(&self) -> Option<I> {
        (!self.head.is_none()).then_some(self.head)
    }

    /// Returns the index at the back (LRU) of the list.
    pub fn back_id(&self) -> Option<I> {
        (!self.tail.is_none()).then_some(self.tail)
    }

    pub fn arena(&self) -> &SlotArena<K, V, I> {
        &self.arena
    }

    /// Returns the entry stored at `idx`, if occupied.
    pub fn get(&self, idx: I) -> Option<(&K, &V)> {
        self.arena
            .get(idx)
            .and_then(|slot| slot.entry.as_ref().map(|(key, value)| (key, value)))
    }

    /// Returns a mutable reference to the value stored at `idx`, if occupied.
    pub fn get_mut(&mut self, idx: I) -> Option<&mut V> {
        self.arena
            .get_mut(idx)
            .and_then(|slot| slot.entry.as_mut().map(|(_, value)| value))
    }

    /// Pops an unused slot, if any.
    pub fn acquire_free(&mut self) -> Option<I> {
        self.arena.pop_free()
    }

    /// Writes an entry into a slot previously obtained from
    /// [`acquire_free`](Self::acquire_free) or [`evict_tail`](Self::evict_tail).
    pub fn fill(&mut self, idx: I, key: K, value: V) -> Option<(K, V)> {
        self.arena.occupy(idx, key, value)
    }

    /// Unlinks `idx` and returns its slot to the free list.
    pub fn release(&mut self, idx: I) -> Option<(K, V)> {
        self.unlink(idx);
        self.arena.release(idx)
    }

    /// Returns `true` if `idx` is part of the chain.
    pub fn is_linked(&self, idx: I) -> bool {
        match self.arena.get(idx) {
            Some(slot) => self.head == idx || !slot.prev.is_none() || !slot.next.is_none(),
            None => false,
        }
    }

    /// Moves `idx` to the front. Already at the front is a no-op.
    pub fn link_as_head(&mut self, idx: I) {
        if self.head == idx || self.arena.get(idx).is_none() {
            return;
        }
        self.unlink(idx);
        self.attach_front(idx);
    }

    /// Removes `idx` from the chain; returns `false` if it was not linked.
    pub fn unlink(&mut self, idx: I) -> bool {
        if !self.is_linked(idx) {
            return false;
        }
        let (prev, next) = match self.arena.get(idx) {
            Some(slot) => (slot.prev, slot.next),
            None => return false,
        };

        if let Some(prev_slot) = self.arena.get_mut(prev) {
            prev_slot.next = next;
        } else {
            self.head = next;
        }

        if let Some(next_slot) = self.arena.get_mut(next) {
            next_slot.prev = prev;
        } else {
            self.tail = prev;
        }

        if let Some(slot) = self.arena.get_mut(idx) {
            slot.prev = I::NONE;
            slot.next = I::NONE;
        }
        self.len -= 1;
        true
    }

    /// Detaches the LRU node and returns its index, or `None` when empty.
    ///
    /// The slot keeps its entry so the caller can read the evicted key before
    /// reusing the index.
    pub fn evict_tail(&mut self) -> Option<I> {
        let tail = self.back_id()?;
        self.unlink(tail);
        Some(tail)
    }

    /// Empties the list and every slot.
    pub fn clear(&mut self) {
        self.arena.reset();
        self.head = I::NONE;
        self.tail = I::NONE;
        self.len = 0;
    }

    /// Returns an iterator over `(idx, &K, &V)` in the requested order.
    pub fn iter(&self, direction: Direction) -> IntrusiveListIter<'_, K, V, I> {
        let current = match direction {
            Direction::MostRecentFirst => self.head,
            Direction::LeastRecentFirst => self.tail,
        };
        IntrusiveListIter {
            list: self,
            current,
            direction,
            remaining: self.len,
        }
    }

    fn attach_front(&mut self, idx: I) {
        let old_head = self.head;
        match self.arena.get_mut(idx) {
            Some(slot) => {
                slot.prev = I::NONE;
                slot.next = old_head;
            },
            None => return,
        }
        if let Some(head_slot) = self.arena.get_mut(old_head) {
            head_slot.prev = idx;
        } else {
            self.tail = idx;
        }
        self.head = idx;
        self.len += 1;
    }

    /// Verifies list well-formedness and the free/linked partition.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let capacity = self.arena.capacity();
        let mut seen = vec![false; capacity];

        if self.head.is_none() != self.tail.is_none() {
            return Err(InvariantError::new(format!(
                "head ({}) and tail ({}) disagree on emptiness",
                self.head, self.tail
            )));
        }

        let mut count = 0usize;
        let mut prev = I::NONE;
        let mut current = self.head;
        while !current.is_none() {
            let slot = self.arena.get(current).ok_or_else(|| {
                InvariantError::new(format!("link to out-of-range slot {current}"))
            })?;
            let pos = current.as_usize();
            if seen[pos] {
                return Err(InvariantError::new(format!("cycle at slot {current}")));
            }
            seen[pos] = true;
            if slot.prev != prev {
                return Err(InvariantError::new(format!(
                    "slot {current} has prev {} but was reached from {prev}",
                    slot.prev
                )));
            }
            if !slot.is_occupied() {
                return Err(InvariantError::new(format!(
                    "linked slot {current} holds no entry"
                )));
            }
            count += 1;
            prev = current;
            current = slot.next;
        }

        if prev != self.tail {
            return Err(InvariantError::new(format!(
                "walk ended at {prev} but tail is {}",
                self.tail
            )));
        }
        if count != self.len {
            return Err(InvariantError::new(format!(
                "walked {count} nodes but len is {}",
                self.len
            )));
        }

        for idx in self.arena.free_indices() {
            let slot = self
                .arena
                .get(idx)
                .ok_or_else(|| InvariantError::new(format!("free index {idx} out of range")))?;
            let pos = idx.as_usize();
            if seen[pos] {
                return Err(InvariantError::new(format!(
                    "slot {idx} is both free and linked"
                )));
            }
            seen[pos] = true;
            if slot.is_occupied() || !slot.prev.is_none() || !slot.next.is_none() {
                return Err(InvariantError::new(format!("free slot {idx} is not vacant")));
            }
        }

        if let Some(pos) = seen.iter().position(|covered| !covered) {
            return Err(InvariantError::new(format!(
                "slot {pos} is neither free nor linked"
            )));
        }
        Ok(())
    }
}

/// Iterator over `(idx, &K, &V)` in recency order.
pub struct IntrusiveListIter<'a, K, V, I> {
    list: &'a IntrusiveList<K, V, I>,
    current: I,
    direction: Direction,
    remaining: usize,
}

impl<'a, K, V, I: SlotIndex> Iterator for IntrusiveListIter<'a, K, V, I> {
    type Item = (I, &'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.current;
        let slot: &'a Slot<K, V, I> = self.list.arena.get(idx)?;
        let (key, value) = slot.entry.as_ref()?;
        self.current = match self.direction {
            Direction::MostRecentFirst => slot.next,
            Direction::LeastRecentFirst => slot.prev,
        };
        self.remaining -= 1;
        Some((idx, key, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}
