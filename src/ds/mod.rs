pub mod index;
pub mod intrusive_list;
pub mod slot_arena;

pub use index::SlotIndex;
pub use intrusive_list::{Direction, IntrusiveList, IntrusiveListIter};
pub use slot_arena::{Slot, SlotArena};
