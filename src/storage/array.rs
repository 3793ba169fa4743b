//! Pluggable flat backing storage for node and edge arrays.
//!
//! This trait abstracts how the flat variants' arrays are stored (Vec,
//! NUMA-interleaved pages, mmap). The core only needs allocate, index, and
//! bulk copy-in; anything fancier lives behind the trait.

use crate::graph_error::FlatGraphError;
use core::fmt::{self, Debug};

/// Contiguous, indexable storage for `V` with slice access.
pub trait ArrayStore<V>: Sized + Debug {
    /// Construct a buffer of `len` elements produced by `fill`.
    fn allocate(len: usize, fill: impl FnMut() -> V) -> Self;

    /// Construct a buffer holding exactly `len` items drained from `iter`.
    ///
    /// # Errors
    /// Returns `StoreLength` when the iterator yields a different number of
    /// items than declared.
    fn copy_in<I>(iter: I, len: usize) -> Result<Self, FlatGraphError>
    where
        I: IntoIterator<Item = V>;

    /// Current length in elements.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entire read-only buffer.
    fn as_slice(&self) -> &[V];

    /// Entire mutable buffer.
    fn as_mut_slice(&mut self) -> &mut [V];
}

/// Selects a store family for a whole graph instantiation.
///
/// A graph needs arrays of several element types at once (offsets,
/// destinations, payload cells), so the provider maps each element type to a
/// concrete store via a generic associated type.
pub trait StoreProvider {
    type Array<V>: ArrayStore<V>;
}

/// `Vec`-backed storage (default).
#[derive(Clone)]
pub struct VecStore<V>(Vec<V>);

impl<V> Debug for VecStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VecStore").field("len", &self.0.len()).finish()
    }
}

impl<V> ArrayStore<V> for VecStore<V> {
    fn allocate(len: usize, mut fill: impl FnMut() -> V) -> Self {
        Self((0..len).map(|_| fill()).collect())
    }

    fn copy_in<I>(iter: I, len: usize) -> Result<Self, FlatGraphError>
    where
        I: IntoIterator<Item = V>,
    {
        let buf: Vec<V> = iter.into_iter().collect();
        if buf.len() != len {
            return Err(FlatGraphError::StoreLength {
                expected: len,
                found: buf.len(),
            });
        }
        Ok(Self(buf))
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn as_slice(&self) -> &[V] {
        &self.0
    }

    fn as_mut_slice(&mut self) -> &mut [V] {
        &mut self.0
    }
}

impl<V> From<Vec<V>> for VecStore<V> {
    fn from(v: Vec<V>) -> Self {
        Self(v)
    }
}

impl<V> VecStore<V> {
    pub fn into_inner(self) -> Vec<V> {
        self.0
    }
}

/// Default provider: plain heap vectors for every array.
#[derive(Debug, Default, Clone, Copy)]
pub struct VecProvider;

impl StoreProvider for VecProvider {
    type Array<V> = VecStore<V>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_and_index() {
        let mut next = 0u32;
        let store = VecStore::allocate(4, || {
            next += 1;
            next
        });
        assert_eq!(store.len(), 4);
        assert_eq!(store.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn copy_in_checks_length() {
        let ok = VecStore::copy_in(0..5u32, 5).unwrap();
        assert_eq!(ok.as_slice(), &[0, 1, 2, 3, 4]);

        let err = VecStore::copy_in(0..3u32, 5).unwrap_err();
        assert_eq!(
            err,
            FlatGraphError::StoreLength {
                expected: 5,
                found: 3
            }
        );
    }

    #[test]
    fn empty_store() {
        let store: VecStore<u64> = VecStore::copy_in(std::iter::empty(), 0).unwrap();
        assert!(store.is_empty());
    }
}
