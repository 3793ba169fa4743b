//! Raw byte arenas for the record-based layouts.
//!
//! A [`ByteArena`] is one contiguous allocation holding many variable-position
//! records, managed as a unit: records are placement-constructed during the
//! single population pass and dropped explicitly during teardown, then the
//! block is returned to the allocator whole. The arena itself knows nothing
//! about record types; all offset arithmetic lives with [`super::record::RecordSpan`]
//! and the graphs that own the arena.
//!
//! Allocation goes through the [`ArenaAllocator`] seam so a runtime can hand
//! out memory affine to a particular worker or NUMA node. The default
//! [`HeapArenas`] allocates plain heap blocks; locality then comes from first
//! touch, since each partition is only ever filled by its owning worker.

use crate::graph_error::FlatGraphError;
use std::alloc::{self, Layout};
use std::ptr::NonNull;

/// One contiguous raw allocation, freed whole on drop.
///
/// The arena hands out typed references at caller-supplied byte offsets; the
/// caller is responsible for offset validity, alignment, and initialization
/// order. Graphs keep those invariants by deriving every offset from the same
/// span arithmetic used to size the arena.
#[derive(Debug)]
pub struct ByteArena {
    ptr: NonNull<u8>,
    layout: Layout,
    len: usize,
}

// The arena is a dumb byte block; cross-thread access discipline lives with
// the records placed in it.
unsafe impl Send for ByteArena {}
unsafe impl Sync for ByteArena {}

impl ByteArena {
    /// Allocate a zeroed block of `size` bytes aligned to `align`.
    ///
    /// # Errors
    /// `AllocationFailed` when the underlying allocator returns null; graph
    /// construction cannot proceed without its backing storage.
    pub fn zeroed(size: usize, align: usize) -> Result<Self, FlatGraphError> {
        let layout = Layout::from_size_align(size.max(1), align)
            .map_err(|_| FlatGraphError::AllocationFailed { bytes: size })?;
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr =
            NonNull::new(raw).ok_or(FlatGraphError::AllocationFailed { bytes: size })?;
        Ok(ByteArena { ptr, layout, len: size })
    }

    /// Usable bytes in the block.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Raw pointer to the record at `offset`.
    ///
    /// # Safety
    /// `offset` must keep a `T` within bounds and `T`-aligned relative to the
    /// arena base.
    #[inline]
    pub unsafe fn ptr_at<T>(&self, offset: usize) -> *mut T {
        debug_assert!(offset + size_of::<T>() <= self.len);
        unsafe { self.ptr.as_ptr().add(offset) as *mut T }
    }

    /// Shared reference to the record at `offset`.
    ///
    /// # Safety
    /// As [`ptr_at`](Self::ptr_at), and the record must have been initialized.
    #[inline]
    pub unsafe fn get<T>(&self, offset: usize) -> &T {
        unsafe { &*self.ptr_at::<T>(offset) }
    }

    /// Shared slice of `len` consecutive records starting at `offset`.
    ///
    /// # Safety
    /// As [`get`](Self::get), for the whole range.
    #[inline]
    pub unsafe fn slice<T>(&self, offset: usize, len: usize) -> &[T] {
        debug_assert!(offset + len * size_of::<T>() <= self.len);
        unsafe { std::slice::from_raw_parts(self.ptr_at::<T>(offset), len) }
    }

    /// Mutable slice of `len` consecutive records starting at `offset`.
    ///
    /// # Safety
    /// As [`slice`](Self::slice).
    #[inline]
    pub unsafe fn slice_mut<T>(&mut self, offset: usize, len: usize) -> &mut [T] {
        debug_assert!(offset + len * size_of::<T>() <= self.len);
        unsafe { std::slice::from_raw_parts_mut(self.ptr_at::<T>(offset), len) }
    }

    /// Placement-construct a record at `offset`.
    ///
    /// # Safety
    /// As [`ptr_at`](Self::ptr_at); any previous record at the offset is
    /// overwritten without being dropped.
    #[inline]
    pub unsafe fn write<T>(&mut self, offset: usize, value: T) {
        unsafe { std::ptr::write(self.ptr_at::<T>(offset), value) }
    }
}

impl Drop for ByteArena {
    fn drop(&mut self) {
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

/// External allocator seam for partition arenas.
///
/// `part` identifies the worker partition the block will belong to, so an
/// implementation backed by a topology-aware allocator can bind the block to
/// that worker's memory node. Paging and binding policy are entirely the
/// allocator's business.
pub trait ArenaAllocator: Sync {
    fn allocate(&self, part: usize, size: usize, align: usize)
    -> Result<ByteArena, FlatGraphError>;
}

/// Default allocator: plain zeroed heap blocks for every partition.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapArenas;

impl ArenaAllocator for HeapArenas {
    fn allocate(
        &self,
        _part: usize,
        size: usize,
        align: usize,
    ) -> Result<ByteArena, FlatGraphError> {
        ByteArena::zeroed(size, align)
    }
}
