//! Flat CSR (Compressed Sparse Row) storage variant.
//!
//! Nodes and edges live in four parallel arrays: a cumulative edge-index
//! table, edge destinations, edge payloads, and node payloads. Node `i`'s
//! outgoing range is `[edge_index[i-1], edge_index[i])` with the `-1` entry
//! implicitly zero, so neighbor lookup is a table read, never a scan. The
//! whole structure is populated once from a topology source in a single
//! O(nodes + edges) pass and is immutable afterwards, payloads excepted.
//!
//! An example of use:
//!
//! ```
//! use flatgraph::graph::{CsrGraph, LocalGraph};
//! use flatgraph::topology::{GraphBuilder, NodeId};
//!
//! let mut b = GraphBuilder::<i32>::new(3);
//! b.add_edge(NodeId::new(0), NodeId::new(1), 7);
//! b.add_edge(NodeId::new(1), NodeId::new(2), 9);
//! let g: CsrGraph<u32, i32> = CsrGraph::from_source(&b)?;
//!
//! for src in g.nodes() {
//!     for e in g.edges(src) {
//!         let dst = g.edge_dst(e);
//!         let weight = *g.edge_data(e);
//!         let _ = (dst, weight);
//!     }
//! }
//! # Ok::<(), flatgraph::graph_error::FlatGraphError>(())
//! ```

use crate::acquire::{AcquirePolicy, Conflict, ConflictGuard, acquire_node};
use crate::graph::{EdgeEntry, EdgeRange, LocalGraph, NodeRange, edge_range, node_range, sort_adjacent};
use crate::graph_error::FlatGraphError;
use crate::storage::array::{ArrayStore, StoreProvider, VecProvider};
use crate::storage::cell::PayloadCell;
use crate::topology::handle::{EdgeId, NodeId};
use crate::topology::source::{self, TopologySource};
use std::cmp::Ordering;

/// CSR graph with node payload `N` and edge payload `E`.
///
/// Edge handles are global edge ordinals; node handles are dense indices.
/// Zero-sized payload types occupy no storage in their arrays.
#[derive(Debug)]
pub struct CsrGraph<N, E, P: StoreProvider = VecProvider> {
    node_data: P::Array<PayloadCell<N>>,
    edge_index: P::Array<u64>,
    edge_dsts: P::Array<NodeId>,
    edge_data: P::Array<PayloadCell<E>>,
    num_nodes: usize,
    num_edges: usize,
}

impl<N, E, P> CsrGraph<N, E, P>
where
    P: StoreProvider,
{
    /// Populate from a topology source.
    ///
    /// Allocates all four backing arrays once and bulk-copies the source's
    /// sequences; node payloads start at `N::default()`.
    ///
    /// # Errors
    /// Structural inconsistencies in the source are fatal and reported before
    /// any array is retained.
    pub fn from_source<S>(src: &S) -> Result<Self, FlatGraphError>
    where
        S: TopologySource<EdgeData = E>,
        N: Default,
    {
        source::validate(src)?;
        let num_nodes = src.num_nodes();
        let num_edges = src.num_edges();

        let node_data: P::Array<PayloadCell<N>> =
            ArrayStore::allocate(num_nodes, || PayloadCell::new(N::default()));
        let edge_index: P::Array<u64> = ArrayStore::copy_in(src.edge_index(), num_nodes)?;
        let edge_dsts: P::Array<NodeId> = ArrayStore::copy_in(src.edge_dsts(), num_edges)?;
        let edge_data: P::Array<PayloadCell<E>> =
            ArrayStore::copy_in(src.edge_data().map(PayloadCell::new), num_edges)?;

        log::debug!("populated CSR graph: {num_nodes} nodes, {num_edges} edges");
        Ok(CsrGraph {
            node_data,
            edge_index,
            edge_dsts,
            edge_data,
            num_nodes,
            num_edges,
        })
    }

    #[inline]
    pub(crate) fn raw_begin(&self, n: NodeId) -> u64 {
        if n.index() == 0 {
            0
        } else {
            self.edge_index.as_slice()[n.index() - 1]
        }
    }

    #[inline]
    pub(crate) fn raw_end(&self, n: NodeId) -> u64 {
        self.edge_index.as_slice()[n.index()]
    }

    /// Sort `n`'s outgoing edges with a comparator over `(destination, payload)`.
    ///
    /// The reorder is stable and keeps the destination and payload arrays in
    /// lock-step, so the multiset of `(destination, payload)` pairs is
    /// unchanged. Later passes rely on sorted ranges for merge-style access.
    pub fn sort_edges_by<F>(&mut self, n: NodeId, cmp: F)
    where
        E: Clone,
        F: FnMut(&EdgeEntry<E>, &EdgeEntry<E>) -> Ordering,
    {
        let lo = self.raw_begin(n) as usize;
        let hi = self.raw_end(n) as usize;
        sort_adjacent(
            &mut self.edge_dsts.as_mut_slice()[lo..hi],
            &mut self.edge_data.as_mut_slice()[lo..hi],
            cmp,
        );
    }

    /// Sort `n`'s outgoing edges with a comparator over the payload alone.
    pub fn sort_edges_by_data<F>(&mut self, n: NodeId, mut cmp: F)
    where
        E: Clone,
        F: FnMut(&E, &E) -> Ordering,
    {
        self.sort_edges_by(n, |a, b| cmp(&a.data, &b.data));
    }

    /// Sort `n`'s outgoing edges by ascending payload.
    pub fn sort_edges(&mut self, n: NodeId)
    where
        E: Clone + Ord,
    {
        self.sort_edges_by(n, |a, b| a.data.cmp(&b.data));
    }
}

impl<N, E, P: StoreProvider> LocalGraph for CsrGraph<N, E, P> {
    type NodeData = N;
    type EdgeData = E;
    type NodeIter<'a>
        = NodeRange
    where
        Self: 'a;
    type EdgeIter<'a>
        = EdgeRange
    where
        Self: 'a;

    #[inline]
    fn size(&self) -> usize {
        self.num_nodes
    }

    #[inline]
    fn size_edges(&self) -> usize {
        self.num_edges
    }

    fn nodes(&self) -> NodeRange {
        node_range(self.num_nodes)
    }

    fn try_edges<'a>(
        &'a self,
        n: NodeId,
        guard: &impl ConflictGuard,
        policy: AcquirePolicy,
    ) -> Result<EdgeRange, Conflict> {
        acquire_node(guard, policy, n)?;
        let lo = self.raw_begin(n);
        let hi = self.raw_end(n);
        if policy.lock_neighbors() {
            for k in lo..hi {
                acquire_node(guard, policy, self.edge_dsts.as_slice()[k as usize])?;
            }
        }
        Ok(edge_range(lo, hi))
    }

    #[inline]
    fn edge_dst(&self, e: EdgeId) -> NodeId {
        self.edge_dsts.as_slice()[e.index()]
    }

    fn try_data<'a>(
        &'a self,
        n: NodeId,
        guard: &impl ConflictGuard,
        policy: AcquirePolicy,
    ) -> Result<&'a N, Conflict> {
        acquire_node(guard, policy, n)?;
        Ok(self.node_data.as_slice()[n.index()].get())
    }

    fn try_edge_data<'a>(
        &'a self,
        e: EdgeId,
        _guard: &impl ConflictGuard,
        _policy: AcquirePolicy,
    ) -> Result<&'a E, Conflict> {
        // The source node was acquired when the edge range was obtained.
        Ok(self.edge_data.as_slice()[e.index()].get())
    }

    unsafe fn try_data_mut<'a>(
        &'a self,
        n: NodeId,
        guard: &impl ConflictGuard,
        policy: AcquirePolicy,
    ) -> Result<&'a mut N, Conflict> {
        debug_assert!(policy.permits_write());
        acquire_node(guard, policy, n)?;
        Ok(unsafe { self.node_data.as_slice()[n.index()].get_mut_shared() })
    }

    unsafe fn try_edge_data_mut<'a>(
        &'a self,
        e: EdgeId,
        _guard: &impl ConflictGuard,
        policy: AcquirePolicy,
    ) -> Result<&'a mut E, Conflict> {
        debug_assert!(policy.permits_write());
        Ok(unsafe { self.edge_data.as_slice()[e.index()].get_mut_shared() })
    }

    fn data_mut(&mut self, n: NodeId) -> &mut N {
        self.node_data.as_mut_slice()[n.index()].get_mut()
    }

    fn edge_data_mut(&mut self, e: EdgeId) -> &mut E {
        self.edge_data.as_mut_slice()[e.index()].get_mut()
    }

    #[inline]
    fn out_degree(&self, n: NodeId) -> usize {
        (self.raw_end(n) - self.raw_begin(n)) as usize
    }
}
