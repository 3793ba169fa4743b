//! Interior-mutable payload slots.

use std::cell::UnsafeCell;
use std::fmt;

/// A payload slot shared between worker threads.
///
/// The graph structures hand out `&self` access while tasks read and write
/// payloads concurrently; which thread may touch a slot at a given moment is
/// governed entirely by the acquisition protocol, not by this type. Shared
/// reads are safe; shared writes go through [`get_mut_shared`](Self::get_mut_shared)
/// and inherit the protocol as their safety contract.
#[repr(transparent)]
pub struct PayloadCell<T>(UnsafeCell<T>);

// Writes are serialized externally, so Send payloads may be shared.
unsafe impl<T: Send> Sync for PayloadCell<T> {}

impl<T> PayloadCell<T> {
    #[inline]
    pub const fn new(value: T) -> Self {
        PayloadCell(UnsafeCell::new(value))
    }

    /// Shared read.
    #[inline]
    pub fn get(&self) -> &T {
        unsafe { &*self.0.get() }
    }

    /// Exclusive access through a unique reference.
    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        self.0.get_mut()
    }

    /// Mutable access from a shared reference.
    ///
    /// # Safety
    /// The caller must hold exclusive ownership of the slot under the
    /// acquisition protocol: no other thread may read or write it until the
    /// returned reference is dropped.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn get_mut_shared(&self) -> &mut T {
        unsafe { &mut *self.0.get() }
    }

    #[inline]
    pub fn into_inner(self) -> T {
        self.0.into_inner()
    }
}

impl<T: Default> Default for PayloadCell<T> {
    fn default() -> Self {
        PayloadCell::new(T::default())
    }
}

impl<T: Clone> Clone for PayloadCell<T> {
    fn clone(&self) -> Self {
        PayloadCell::new(self.get().clone())
    }
}

impl<T: fmt::Debug> fmt::Debug for PayloadCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PayloadCell").field(self.get()).finish()
    }
}
