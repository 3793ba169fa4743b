//! Backing storage: flat array stores, raw record arenas, payload slots.

pub mod arena;
pub mod array;
pub mod cell;
pub mod record;

pub use arena::{ArenaAllocator, ByteArena, HeapArenas};
pub use array::{ArrayStore, StoreProvider, VecProvider, VecStore};
pub use cell::PayloadCell;
pub use record::{EdgeRecord, NodeRecord, Payload, RecordSpan};
