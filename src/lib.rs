//! # flatgraph
//!
//! flatgraph is the in-memory graph storage core for parallel graph-processing
//! runtimes: a family of compact, immutable adjacency representations that
//! keep a large graph's topology and per-node/per-edge payloads in flat,
//! cache-friendly storage, populated once from an external topology source and
//! then traversed concurrently by many worker threads.
//!
//! ## Features
//! - Flat CSR storage with O(1) neighbor-range lookup and in-place edge sorting
//! - Inline and linear record layouts that keep each node's edges next to the
//!   node record itself
//! - A NUMA-oriented partitioned layout that splits the node set across
//!   worker-local arenas by a byte-cost model, with thread-local iteration
//! - A bidirectional overlay adding in-edge traversal, by aliasing (symmetric
//!   inputs) or by materializing a supplied transpose
//! - One traversal contract ([`graph::LocalGraph`]) over every layout
//! - Cooperative conflict detection injected through [`acquire::ConflictGuard`],
//!   so a speculative scheduler can abort and retry tasks touching contended
//!   nodes
//!
//! ## Concurrency
//!
//! Topology is immutable after population; payloads are shared between worker
//! threads and protected only by the acquisition protocol. Accessors either
//! succeed immediately or fail immediately with [`acquire::Conflict`]; nothing
//! in this crate blocks, retries, or rolls back.
//!
//! ## Usage
//! Add `flatgraph` as a dependency in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! flatgraph = "0.4"
//! ```

// Re-export our major subsystems:
pub mod acquire;
pub mod graph;
pub mod graph_error;
pub mod storage;
pub mod topology;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::acquire::{AcquirePolicy, Conflict, ConflictGuard, OwnerTable, Unguarded};
    pub use crate::graph::{
        CsrGraph, EdgeEntry, InOutCsrGraph, InlineGraph, LinearGraph, LocalGraph, PartitionPlan,
        PartitionedGraph, local_node_range,
    };
    pub use crate::graph_error::FlatGraphError;
    pub use crate::storage::{ArenaAllocator, ArrayStore, HeapArenas, StoreProvider, VecProvider};
    pub use crate::topology::{EdgeId, GraphBuilder, NodeId, TopologySource};
}
