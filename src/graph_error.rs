//! `FlatGraphError`: unified error type for flatgraph public APIs.
//!
//! Every fallible construction path reports through this enum, synchronously,
//! before the faulty structure is handed to the caller. Runtime acquisition
//! conflicts are deliberately *not* part of it: they are a scheduler signal,
//! not an error; see [`crate::acquire::Conflict`].

use thiserror::Error;

/// Unified error type for flatgraph operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlatGraphError {
    /// The cumulative edge-index sequence does not have one entry per node.
    #[error("edge index has {found} entries for {expected} nodes")]
    EdgeIndexLength { expected: usize, found: usize },
    /// The cumulative edge-index sequence decreased between two nodes.
    #[error("edge index decreases at node {node}")]
    NonMonotonicEdgeIndex { node: usize },
    /// The final cumulative edge-index entry disagrees with the declared edge count.
    #[error("declared {declared} edges but edge index totals {found}")]
    EdgeCountMismatch { declared: usize, found: usize },
    /// The edge destination sequence has the wrong length.
    #[error("expected {expected} edge destinations, found {found}")]
    EdgeListLength { expected: usize, found: usize },
    /// An edge destination lies outside `[0, num_nodes)`.
    #[error("edge destination {dst} out of range for {num_nodes} nodes")]
    DestinationOutOfRange { dst: u32, num_nodes: usize },
    /// Node counts differ between a graph and its supplied transpose.
    #[error("node counts differ between graph and transpose: {forward} vs {transpose}")]
    TransposeNodeMismatch { forward: usize, transpose: usize },
    /// Edge counts differ between a graph and its supplied transpose.
    #[error("edge counts differ between graph and transpose: {forward} vs {transpose}")]
    TransposeEdgeMismatch { forward: usize, transpose: usize },
    /// A bulk copy into backing storage received the wrong number of items.
    #[error("bulk copy length mismatch: expected {expected}, found {found}")]
    StoreLength { expected: usize, found: usize },
    /// The backing allocator could not provide an arena block.
    #[error("arena allocation of {bytes} bytes failed")]
    AllocationFailed { bytes: usize },
    /// A partitioned graph needs at least one worker partition.
    #[error("partition count must be at least 1")]
    ZeroPartitions,
}
