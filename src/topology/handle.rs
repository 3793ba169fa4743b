//! `NodeId` and `EdgeId`: strong, zero-cost handles for graph entities.
//!
//! Every node in a populated graph is identified by a dense `NodeId` index in
//! `[0, size())`, regardless of which storage variant holds it. Identity is
//! assigned once during population and never reused or renumbered. Edge
//! handles are opaque: a `EdgeId` is only meaningful in combination with the
//! graph instance whose iterator produced it.
//!
//! This module provides:
//! - A transparent `NodeId` newtype around `u32` for zero-cost layout
//!   guarantees and bulk casting.
//! - An opaque `EdgeId` newtype around `u64`; flat variants store a global
//!   edge ordinal in it, arena variants an encoded record location.
//! - Implementations of common traits (`Debug`, `Display`, ordering,
//!   hashing, serde) so handles can be used in maps, sets, and logs.

use bytemuck::{Pod, Zeroable};
use std::fmt;

/// Dense node handle, stable for the lifetime of the graph that issued it.
///
/// # Memory layout
/// This type is `repr(transparent)` over `u32`, so node arrays can be cast
/// to and from raw index arrays without copying.
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Pod,
    Zeroable,
    serde::Serialize,
    serde::Deserialize,
)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates a handle from a raw dense index.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        NodeId(raw)
    }

    /// Returns the raw dense index.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Returns the index widened for array access.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for NodeId {
    #[inline]
    fn from(raw: u32) -> Self {
        NodeId(raw)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeId").field(&self.0).finish()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque edge handle.
///
/// Flat variants put a global edge ordinal here; arena variants encode the
/// owning partition and the record's byte offset. Callers must treat the
/// payload as opaque and only use handles obtained from the same graph's
/// edge iterators.
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Pod,
    Zeroable,
    serde::Serialize,
    serde::Deserialize,
)]
#[repr(transparent)]
pub struct EdgeId(u64);

impl EdgeId {
    #[inline]
    pub const fn new(raw: u64) -> Self {
        EdgeId(raw)
    }

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Raw value narrowed for array access. Only valid for variants that
    /// store plain ordinals.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EdgeId").field(&self.0).finish()
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod layout_tests {
    //! Compile-time assertions that handles stay pointer-free and packed.
    use super::*;
    use static_assertions::{assert_eq_align, assert_eq_size};

    assert_eq_size!(NodeId, u32);
    assert_eq_align!(NodeId, u32);
    assert_eq_size!(EdgeId, u64);
    assert_eq_size!(Option<NodeId>, u64);
}


#[cfg(test)]
mod serde_tests {
    use super::*;

    #[test]
    fn json_roundtrip() {
        let n = NodeId::new(123);
        let s = serde_json::to_string(&n).unwrap();
        let n2: NodeId = serde_json::from_str(&s).unwrap();
        assert_eq!(n2, n);

        let e = EdgeId::new(u64::MAX);
        let s = serde_json::to_string(&e).unwrap();
        let e2: EdgeId = serde_json::from_str(&s).unwrap();
        assert_eq!(e2, e);
    }
}
