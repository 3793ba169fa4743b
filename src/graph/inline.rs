//! Inline storage variant: edge ranges stored inside the node records.
//!
//! Each node record carries its payload and its own begin/end positions in
//! the shared edge arena, so range lookup touches one record instead of the
//! separate index table the CSR variant reads. Population runs two
//! deterministic passes over the same node order: the first places every
//! node record from the cumulative out-degree table, the second fills the
//! edge arena behind a single bump cursor.

use crate::acquire::{AcquirePolicy, Conflict, ConflictGuard, acquire_node};
use crate::graph::{EdgeRange, LocalGraph, NodeRange, edge_range, node_range};
use crate::graph_error::FlatGraphError;
use crate::storage::array::{ArrayStore, StoreProvider, VecProvider};
use crate::storage::cell::PayloadCell;
use crate::storage::record::EdgeRecord;
use crate::topology::handle::{EdgeId, NodeId};
use crate::topology::source::{self, TopologySource};
use itertools::Itertools;

/// Node record: payload plus the node's half-open range in the edge arena.
#[derive(Debug)]
struct InlineNode<N> {
    data: PayloadCell<N>,
    first: u64,
    last: u64,
}

/// Inline graph with node payload `N` and edge payload `E`.
///
/// Edge handles are global arena ordinals, as in the CSR variant.
#[derive(Debug)]
pub struct InlineGraph<N, E, P: StoreProvider = VecProvider> {
    nodes: P::Array<InlineNode<N>>,
    edges: P::Array<EdgeRecord<E>>,
    num_edges: usize,
}

impl<N, E, P> InlineGraph<N, E, P>
where
    P: StoreProvider,
{
    /// Populate from a topology source.
    pub fn from_source<S>(src: &S) -> Result<Self, FlatGraphError>
    where
        S: TopologySource<EdgeData = E>,
        N: Default,
    {
        source::validate(src)?;
        let num_nodes = src.num_nodes();
        let num_edges = src.num_edges();

        // Pass 1: place node records; each range derives from the previous
        // node's cumulative end.
        let nodes: P::Array<InlineNode<N>> = ArrayStore::copy_in(
            src.edge_index().scan(0u64, |prev, end| {
                let first = *prev;
                *prev = end;
                Some(InlineNode {
                    data: PayloadCell::new(N::default()),
                    first,
                    last: end,
                })
            }),
            num_nodes,
        )?;

        // Pass 2: fill the shared edge arena behind one bump cursor, in the
        // same node order.
        let edges: P::Array<EdgeRecord<E>> = ArrayStore::copy_in(
            src.edge_dsts()
                .zip_eq(src.edge_data())
                .map(|(dst, w)| EdgeRecord::new(dst, w)),
            num_edges,
        )?;

        log::debug!("populated inline graph: {num_nodes} nodes, {num_edges} edges");
        Ok(InlineGraph {
            nodes,
            edges,
            num_edges,
        })
    }

    #[inline]
    fn node(&self, n: NodeId) -> &InlineNode<N> {
        &self.nodes.as_slice()[n.index()]
    }
}

impl<N, E, P: StoreProvider> LocalGraph for InlineGraph<N, E, P> {
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
        self.nodes.len()
    }

    #[inline]
    fn size_edges(&self) -> usize {
        self.num_edges
    }

    fn nodes(&self) -> NodeRange {
        node_range(self.nodes.len())
    }

    fn try_edges<'a>(
        &'a self,
        n: NodeId,
        guard: &impl ConflictGuard,
        policy: AcquirePolicy,
    ) -> Result<EdgeRange, Conflict> {
        acquire_node(guard, policy, n)?;
        let rec = self.node(n);
        if policy.lock_neighbors() {
            for k in rec.first..rec.last {
                acquire_node(guard, policy, self.edges.as_slice()[k as usize].dst)?;
            }
        }
        Ok(edge_range(rec.first, rec.last))
    }

    #[inline]
    fn edge_dst(&self, e: EdgeId) -> NodeId {
        self.edges.as_slice()[e.index()].dst
    }

    fn try_data<'a>(
        &'a self,
        n: NodeId,
        guard: &impl ConflictGuard,
        policy: AcquirePolicy,
    ) -> Result<&'a N, Conflict> {
        acquire_node(guard, policy, n)?;
        Ok(self.node(n).data.get())
    }

    fn try_edge_data<'a>(
        &'a self,
        e: EdgeId,
        _guard: &impl ConflictGuard,
        _policy: AcquirePolicy,
    ) -> Result<&'a E, Conflict> {
        Ok(self.edges.as_slice()[e.index()].data.get())
    }

    unsafe fn try_data_mut<'a>(
        &'a self,
        n: NodeId,
        guard: &impl ConflictGuard,
        policy: AcquirePolicy,
    ) -> Result<&'a mut N, Conflict> {
        debug_assert!(policy.permits_write());
        acquire_node(guard, policy, n)?;
        Ok(unsafe { self.node(n).data.get_mut_shared() })
    }

    unsafe fn try_edge_data_mut<'a>(
        &'a self,
        e: EdgeId,
        _guard: &impl ConflictGuard,
        policy: AcquirePolicy,
    ) -> Result<&'a mut E, Conflict> {
        debug_assert!(policy.permits_write());
        Ok(unsafe { self.edges.as_slice()[e.index()].data.get_mut_shared() })
    }

    fn data_mut(&mut self, n: NodeId) -> &mut N {
        self.nodes.as_mut_slice()[n.index()].data.get_mut()
    }

    fn edge_data_mut(&mut self, e: EdgeId) -> &mut E {
        self.edges.as_mut_slice()[e.index()].data.get_mut()
    }

    #[inline]
    fn out_degree(&self, n: NodeId) -> usize {
        let rec = self.node(n);
        (rec.last - rec.first) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::csr::CsrGraph;
    use crate::topology::source::GraphBuilder;

    fn n(i: u32) -> NodeId {
        NodeId::new(i)
    }

    fn weighted() -> GraphBuilder<u32> {
        let mut b = GraphBuilder::new(4);
        b.add_edge(n(0), n(1), 1);
        b.add_edge(n(0), n(2), 2);
        b.add_edge(n(1), n(2), 3);
        b.add_edge(n(2), n(3), 4);
        b.add_edge(n(3), n(0), 5);
        b
    }

    #[test]
    fn ranges_match_source() {
        let g: InlineGraph<(), u32> = InlineGraph::from_source(&weighted()).unwrap();
        assert_eq!(g.size(), 4);
        assert_eq!(g.size_edges(), 5);
        let got: Vec<(u32, u32)> = g
            .edges(n(0))
            .map(|e| (g.edge_dst(e).get(), *g.edge_data(e)))
            .collect();
        assert_eq!(got, vec![(1, 1), (2, 2)]);
        assert_eq!(g.out_degree(n(3)), 1);
        assert!(g.has_neighbor(n(2), n(3)));
        assert!(!g.has_neighbor(n(3), n(1)));
    }

    #[test]
    fn agrees_with_csr_variant() {
        let src = weighted();
        let a: CsrGraph<(), u32> = CsrGraph::from_source(&src).unwrap();
        let b: InlineGraph<(), u32> = InlineGraph::from_source(&src).unwrap();
        for v in a.nodes() {
            let csr: Vec<(u32, u32)> = a
                .edges(v)
                .map(|e| (a.edge_dst(e).get(), *a.edge_data(e)))
                .collect();
            let inline: Vec<(u32, u32)> = b
                .edges(v)
                .map(|e| (b.edge_dst(e).get(), *b.edge_data(e)))
                .collect();
            assert_eq!(csr, inline);
        }
    }

    #[test]
    fn payload_mutation() {
        let mut g: InlineGraph<u64, u32> = InlineGraph::from_source(&weighted()).unwrap();
        *g.data_mut(n(1)) = 7;
        let e = g.edges(n(0)).next().unwrap();
        *g.edge_data_mut(e) = 100;
        assert_eq!(*g.data(n(1)), 7);
        assert_eq!(*g.edge_data(e), 100);
    }
}
