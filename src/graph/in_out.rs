//! Bidirectional overlay atop the CSR variant.
//!
//! Augments a unidirectional CSR graph with reverse-edge traversal. Two
//! construction modes exist: when the caller asserts the input is symmetric
//! (every edge `(u,v)` has a mirror `(v,u)`), the overlay reuses the forward
//! arrays directly at zero extra memory cost; otherwise the caller supplies
//! an independently produced transposed topology, and the overlay
//! materializes its own index/source/payload triple. Transpose totals must
//! match the forward graph exactly, checked before anything is allocated.

use crate::acquire::{AcquirePolicy, Conflict, ConflictGuard, acquire_node};
use crate::graph::csr::CsrGraph;
use crate::graph::{EdgeEntry, EdgeRange, LocalGraph, NodeRange, edge_range, sort_adjacent};
use crate::graph_error::FlatGraphError;
use crate::storage::array::{ArrayStore, StoreProvider, VecProvider};
use crate::storage::cell::PayloadCell;
use crate::topology::handle::{EdgeId, NodeId};
use crate::topology::source::{self, TopologySource};
use std::cmp::Ordering;

/// Reverse adjacency storage: either an alias of the forward arrays or a
/// materialized transpose. The non-owning asymmetric form (in-edges as
/// references into forward storage) would slot in here as a third variant.
#[derive(Debug)]
enum InEdges<E, P: StoreProvider> {
    Symmetric,
    Transposed {
        edge_index: P::Array<u64>,
        edge_srcs: P::Array<NodeId>,
        edge_data: P::Array<PayloadCell<E>>,
    },
}

/// CSR graph supporting in- and out-edge traversal.
///
/// All forward accessors behave exactly as on [`CsrGraph`]; the `in_*`
/// family mirrors them over reverse adjacency. In-edge handles index the
/// overlay's own arrays (or the forward arrays when aliased) and must not be
/// mixed with forward edge handles.
#[derive(Debug)]
pub struct InOutCsrGraph<N, E, P: StoreProvider = VecProvider> {
    forward: CsrGraph<N, E, P>,
    in_edges: InEdges<E, P>,
}

impl<N, E, P> InOutCsrGraph<N, E, P>
where
    P: StoreProvider,
{
    /// Populate from a source the caller asserts is symmetric.
    ///
    /// The overlay aliases the forward arrays; no reverse storage is
    /// allocated. The symmetry assertion is the caller's responsibility:
    /// on an asymmetric input the `in_*` accessors will simply mirror the
    /// out-edges and reverse traversal will be wrong.
    pub fn from_symmetric_source<S>(src: &S) -> Result<Self, FlatGraphError>
    where
        S: TopologySource<EdgeData = E>,
        N: Default,
    {
        let forward = CsrGraph::from_source(src)?;
        log::debug!("in-edge overlay aliases forward storage (symmetric input)");
        Ok(InOutCsrGraph {
            forward,
            in_edges: InEdges::Symmetric,
        })
    }

    /// Populate from a source plus an independently supplied transpose.
    ///
    /// # Errors
    /// `TransposeNodeMismatch`/`TransposeEdgeMismatch` when the transpose
    /// totals disagree with the forward graph's, reported before any overlay
    /// allocation proceeds.
    pub fn from_source_with_transpose<S, T>(
        src: &S,
        transpose: &T,
    ) -> Result<Self, FlatGraphError>
    where
        S: TopologySource<EdgeData = E>,
        T: TopologySource<EdgeData = E>,
        N: Default,
    {
        if src.num_nodes() != transpose.num_nodes() {
            return Err(FlatGraphError::TransposeNodeMismatch {
                forward: src.num_nodes(),
                transpose: transpose.num_nodes(),
            });
        }
        if src.num_edges() != transpose.num_edges() {
            return Err(FlatGraphError::TransposeEdgeMismatch {
                forward: src.num_edges(),
                transpose: transpose.num_edges(),
            });
        }

        let forward = CsrGraph::from_source(src)?;
        source::validate(transpose)?;
        let num_nodes = transpose.num_nodes();
        let num_edges = transpose.num_edges();
        let edge_index: P::Array<u64> = ArrayStore::copy_in(transpose.edge_index(), num_nodes)?;
        let edge_srcs: P::Array<NodeId> = ArrayStore::copy_in(transpose.edge_dsts(), num_edges)?;
        let edge_data: P::Array<PayloadCell<E>> =
            ArrayStore::copy_in(transpose.edge_data().map(PayloadCell::new), num_edges)?;

        log::debug!("materialized transposed overlay: {num_nodes} nodes, {num_edges} in-edges");
        Ok(InOutCsrGraph {
            forward,
            in_edges: InEdges::Transposed {
                edge_index,
                edge_srcs,
                edge_data,
            },
        })
    }

    /// The underlying forward graph.
    pub fn forward(&self) -> &CsrGraph<N, E, P> {
        &self.forward
    }

    /// Whether the overlay reuses forward storage instead of owning a copy.
    pub fn aliases_forward(&self) -> bool {
        matches!(self.in_edges, InEdges::Symmetric)
    }

    fn in_raw_begin(&self, n: NodeId) -> u64 {
        match &self.in_edges {
            InEdges::Symmetric => self.forward.raw_begin(n),
            InEdges::Transposed { edge_index, .. } => {
                if n.index() == 0 {
                    0
                } else {
                    edge_index.as_slice()[n.index() - 1]
                }
            }
        }
    }

    fn in_raw_end(&self, n: NodeId) -> u64 {
        match &self.in_edges {
            InEdges::Symmetric => self.forward.raw_end(n),
            InEdges::Transposed { edge_index, .. } => edge_index.as_slice()[n.index()],
        }
    }

    /// In-edge handles covering exactly `n`'s incoming range.
    ///
    /// Under [`AcquirePolicy::Neighbors`] this acquires `n` and every source
    /// node in the range before returning the iterator.
    pub fn try_in_edges(
        &self,
        n: NodeId,
        guard: &impl ConflictGuard,
        policy: AcquirePolicy,
    ) -> Result<EdgeRange, Conflict> {
        acquire_node(guard, policy, n)?;
        let lo = self.in_raw_begin(n);
        let hi = self.in_raw_end(n);
        if policy.lock_neighbors() {
            for k in lo..hi {
                acquire_node(guard, policy, self.in_edge_src(EdgeId::new(k)))?;
            }
        }
        Ok(edge_range(lo, hi))
    }

    /// In-edge range of `n` without conflict detection.
    pub fn in_edges(&self, n: NodeId) -> EdgeRange {
        self.try_in_edges(n, &crate::acquire::Unguarded, AcquirePolicy::None)
            .expect("policy None cannot conflict")
    }

    /// Source node of in-edge `e`, i.e. the node the original edge points from.
    pub fn in_edge_src(&self, e: EdgeId) -> NodeId {
        match &self.in_edges {
            InEdges::Symmetric => self.forward.edge_dst(e),
            InEdges::Transposed { edge_srcs, .. } => edge_srcs.as_slice()[e.index()],
        }
    }

    /// Payload of in-edge `e`.
    pub fn in_edge_data(&self, e: EdgeId) -> &E {
        match &self.in_edges {
            InEdges::Symmetric => self.forward.edge_data(e),
            InEdges::Transposed { edge_data, .. } => edge_data.as_slice()[e.index()].get(),
        }
    }

    /// Mutable in-edge payload through an exclusive graph reference.
    pub fn in_edge_data_mut(&mut self, e: EdgeId) -> &mut E {
        match &mut self.in_edges {
            InEdges::Symmetric => self.forward.edge_data_mut(e),
            InEdges::Transposed { edge_data, .. } => edge_data.as_mut_slice()[e.index()].get_mut(),
        }
    }

    /// In-degree of `n`.
    pub fn in_degree(&self, n: NodeId) -> usize {
        (self.in_raw_end(n) - self.in_raw_begin(n)) as usize
    }

    /// Whether the directed edge `src → dst` exists, checked from the
    /// destination side. O(in-degree of `dst`).
    pub fn has_in_neighbor(&self, dst: NodeId, src: NodeId) -> bool {
        self.in_edges(dst).any(|e| self.in_edge_src(e) == src)
    }

    /// Sort `n`'s incoming edges with a comparator over `(source, payload)`.
    ///
    /// In symmetric mode the overlay and the forward arrays are the same
    /// storage, so this is identical to sorting `n`'s outgoing edges.
    pub fn sort_in_edges_by<F>(&mut self, n: NodeId, cmp: F)
    where
        E: Clone,
        F: FnMut(&EdgeEntry<E>, &EdgeEntry<E>) -> Ordering,
    {
        let lo = self.in_raw_begin(n) as usize;
        let hi = self.in_raw_end(n) as usize;
        match &mut self.in_edges {
            InEdges::Symmetric => self.forward.sort_edges_by(n, cmp),
            InEdges::Transposed {
                edge_srcs,
                edge_data,
                ..
            } => sort_adjacent(
                &mut edge_srcs.as_mut_slice()[lo..hi],
                &mut edge_data.as_mut_slice()[lo..hi],
                cmp,
            ),
        }
    }

    /// Sort `n`'s incoming edges with a comparator over the payload alone.
    pub fn sort_in_edges_by_data<F>(&mut self, n: NodeId, mut cmp: F)
    where
        E: Clone,
        F: FnMut(&E, &E) -> Ordering,
    {
        self.sort_in_edges_by(n, |a, b| cmp(&a.data, &b.data));
    }

    /// Sort `n`'s outgoing edges with a comparator over `(destination, payload)`.
    pub fn sort_edges_by<F>(&mut self, n: NodeId, cmp: F)
    where
        E: Clone,
        F: FnMut(&EdgeEntry<E>, &EdgeEntry<E>) -> Ordering,
    {
        self.forward.sort_edges_by(n, cmp);
    }

    /// Sort `n`'s outgoing edges with a comparator over the payload alone.
    pub fn sort_edges_by_data<F>(&mut self, n: NodeId, mut cmp: F)
    where
        E: Clone,
        F: FnMut(&E, &E) -> Ordering,
    {
        self.forward.sort_edges_by(n, |a, b| cmp(&a.data, &b.data));
    }
}

impl<N, E, P: StoreProvider> LocalGraph for InOutCsrGraph<N, E, P> {
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

    fn size(&self) -> usize {
        self.forward.size()
    }

    fn size_edges(&self) -> usize {
        self.forward.size_edges()
    }

    fn nodes(&self) -> NodeRange {
        self.forward.nodes()
    }

    fn try_edges<'a>(
        &'a self,
        n: NodeId,
        guard: &impl ConflictGuard,
        policy: AcquirePolicy,
    ) -> Result<EdgeRange, Conflict> {
        self.forward.try_edges(n, guard, policy)
    }

    fn edge_dst(&self, e: EdgeId) -> NodeId {
        self.forward.edge_dst(e)
    }

    fn try_data<'a>(
        &'a self,
        n: NodeId,
        guard: &impl ConflictGuard,
        policy: AcquirePolicy,
    ) -> Result<&'a N, Conflict> {
        self.forward.try_data(n, guard, policy)
    }

    fn try_edge_data<'a>(
        &'a self,
        e: EdgeId,
        guard: &impl ConflictGuard,
        policy: AcquirePolicy,
    ) -> Result<&'a E, Conflict> {
        self.forward.try_edge_data(e, guard, policy)
    }

    unsafe fn try_data_mut<'a>(
        &'a self,
        n: NodeId,
        guard: &impl ConflictGuard,
        policy: AcquirePolicy,
    ) -> Result<&'a mut N, Conflict> {
        unsafe { self.forward.try_data_mut(n, guard, policy) }
    }

    unsafe fn try_edge_data_mut<'a>(
        &'a self,
        e: EdgeId,
        guard: &impl ConflictGuard,
        policy: AcquirePolicy,
    ) -> Result<&'a mut E, Conflict> {
        unsafe { self.forward.try_edge_data_mut(e, guard, policy) }
    }

    fn data_mut(&mut self, n: NodeId) -> &mut N {
        self.forward.data_mut(n)
    }

    fn edge_data_mut(&mut self, e: EdgeId) -> &mut E {
        self.forward.edge_data_mut(e)
    }

    fn out_degree(&self, n: NodeId) -> usize {
        self.forward.out_degree(n)
    }
}
