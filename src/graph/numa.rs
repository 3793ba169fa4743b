//! Partitioned storage variant: the linear layout split across worker-local
//! arenas.
//!
//! The node set is divided into contiguous ranges sized by a byte-cost model
//! (node record + edge records per node), one range per worker. Each worker's
//! range lives in its own arena obtained from the [`ArenaAllocator`] seam, and
//! ranges are filled independently in parallel: partitions are disjoint by
//! construction, so the fill needs no cross-thread synchronization. A
//! per-node locator table stitches the partitions back into one logical
//! address space for global iteration, while [`PartitionedGraph::local_nodes`]
//! walks only the records a given worker owns.

use crate::acquire::{AcquirePolicy, Conflict, ConflictGuard, acquire_node};
use crate::graph::{ArenaEdges, LocalGraph, NodeRange, arena_edges, node_range, node_subrange};
use crate::graph_error::FlatGraphError;
use crate::storage::arena::{ArenaAllocator, ByteArena, HeapArenas};
use crate::storage::cell::PayloadCell;
use crate::storage::record::{EdgeRecord, NodeRecord, RecordSpan};
use crate::topology::handle::{EdgeId, NodeId};
use crate::topology::source::{self, TopologySource};
use rayon::prelude::*;
use std::marker::PhantomData;
use std::mem::needs_drop;
use std::ops::Range;
use std::ptr;

/// One worker's contiguous slice of the node set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartRange {
    /// Nodes owned by this partition, in original node order.
    pub nodes: Range<u32>,
    /// Edges owned by this partition.
    pub num_edges: usize,
    /// Exact arena bytes the partition's records occupy.
    pub bytes: usize,
}

/// Assignment of consecutive nodes to worker partitions.
///
/// Computed by walking the degree sequence once, accumulating the byte cost
/// of each node's records and closing a partition whenever the running cost
/// crosses the next worker's share of the total. The last worker absorbs any
/// remainder, so every node is assigned exactly once even under rounding.
#[derive(Debug, Clone)]
pub struct PartitionPlan {
    parts: Vec<PartRange>,
}

impl PartitionPlan {
    /// Plan partitions for a topology source.
    pub fn compute<S: TopologySource>(
        src: &S,
        span: RecordSpan,
        workers: usize,
    ) -> Result<Self, FlatGraphError> {
        let mut degrees = Vec::with_capacity(src.num_nodes());
        let mut prev = 0u64;
        for end in src.edge_index() {
            degrees.push((end - prev) as u32);
            prev = end;
        }
        Self::from_degrees(&degrees, span, workers)
    }

    /// Plan partitions for a degree sequence.
    ///
    /// # Errors
    /// `ZeroPartitions` when `workers == 0`.
    pub fn from_degrees(
        degrees: &[u32],
        span: RecordSpan,
        workers: usize,
    ) -> Result<Self, FlatGraphError> {
        if workers == 0 {
            return Err(FlatGraphError::ZeroPartitions);
        }
        let total = span.arena_bytes(degrees.iter().map(|&d| d as usize));
        let block = total / workers;

        let mut parts = Vec::with_capacity(workers);
        let mut node = 0usize;
        let mut cur = 0usize;
        for tid in 0..workers - 1 {
            let target = (tid + 1) * block;
            let start = node;
            let mut edges = 0usize;
            let mut bytes = 0usize;
            while node < degrees.len() && cur < target {
                let cost = span.span(degrees[node] as usize);
                cur += cost;
                bytes += cost;
                edges += degrees[node] as usize;
                node += 1;
            }
            parts.push(PartRange {
                nodes: start as u32..node as u32,
                num_edges: edges,
                bytes,
            });
        }
        // Last worker absorbs the remainder.
        let start = node;
        let mut edges = 0usize;
        let mut bytes = 0usize;
        while node < degrees.len() {
            bytes += span.span(degrees[node] as usize);
            edges += degrees[node] as usize;
            node += 1;
        }
        parts.push(PartRange {
            nodes: start as u32..node as u32,
            num_edges: edges,
            bytes,
        });

        debug_assert_eq!(parts.len(), workers);
        Ok(PartitionPlan { parts })
    }

    pub fn num_parts(&self) -> usize {
        self.parts.len()
    }

    pub fn parts(&self) -> &[PartRange] {
        &self.parts
    }

    /// Partition owning `n`.
    pub fn part_of(&self, n: NodeId) -> usize {
        self.parts
            .partition_point(|p| p.nodes.end <= n.get())
            .min(self.parts.len() - 1)
    }
}

const PART_SHIFT: u32 = 48;
const OFFSET_MASK: u64 = (1u64 << PART_SHIFT) - 1;

/// Per-worker header: the arena block and the node range it owns. The arena
/// remembers its own byte size, which is what lets teardown return the block
/// to the allocator whole.
#[derive(Debug)]
struct Partition {
    arena: ByteArena,
    nodes: Range<u32>,
}

/// Node locator: owning partition plus record byte offset within it.
#[derive(Debug, Clone, Copy)]
struct RecordLoc {
    part: u32,
    offset: usize,
}

/// Partitioned linear graph with node payload `N` and edge payload `E`.
///
/// Edge handles encode the owning partition in their high bits and the
/// record byte offset in the low bits.
#[derive(Debug)]
pub struct PartitionedGraph<N, E> {
    parts: Box<[Partition]>,
    locs: Box<[RecordLoc]>,
    span: RecordSpan,
    num_edges: usize,
    _payloads: PhantomData<(PayloadCell<N>, PayloadCell<E>)>,
}

impl<N, E> PartitionedGraph<N, E>
where
    N: Default + Send,
    E: Send,
{
    /// Populate with `workers` partitions using plain heap arenas.
    pub fn from_source<S>(src: &S, workers: usize) -> Result<Self, FlatGraphError>
    where
        S: TopologySource<EdgeData = E> + Sync,
    {
        Self::from_source_in(src, workers, &HeapArenas)
    }

    /// Populate with `workers` partitions, allocating each partition's arena
    /// through `alloc` so blocks can be bound to worker-local memory.
    pub fn from_source_in<S, A>(
        src: &S,
        workers: usize,
        alloc: &A,
    ) -> Result<Self, FlatGraphError>
    where
        S: TopologySource<EdgeData = E> + Sync,
        A: ArenaAllocator,
    {
        source::validate(src)?;
        let num_nodes = src.num_nodes();
        let num_edges = src.num_edges();
        let span = RecordSpan::of::<N, E>();

        let mut degrees = Vec::with_capacity(num_nodes);
        let mut prev = 0u64;
        for end in src.edge_index() {
            degrees.push((end - prev) as u32);
            prev = end;
        }
        let plan = PartitionPlan::from_degrees(&degrees, span, workers)?;
        log::debug!(
            "partition plan: {} workers, {:?} nodes per partition",
            workers,
            plan.parts().iter().map(|p| p.nodes.len()).collect::<Vec<_>>()
        );

        // Each partition allocates and fills its own arena; ranges are
        // disjoint, so the workers never touch shared state.
        let built: Vec<(Partition, Vec<usize>)> = plan
            .parts()
            .par_iter()
            .enumerate()
            .map(|(pid, pr)| -> Result<(Partition, Vec<usize>), FlatGraphError> {
                let mut arena = alloc.allocate(pid, pr.bytes, span.align())?;
                let mut offs = Vec::with_capacity(pr.nodes.len());
                let mut cursor = 0usize;
                for nid in pr.nodes.clone() {
                    let deg = degrees[nid as usize];
                    offs.push(cursor);
                    unsafe { arena.write(cursor, NodeRecord::new(N::default(), deg)) };
                    let mut eoff = cursor + span.edge_offset();
                    for (dst, w) in src.neighbors(NodeId::new(nid)).take(deg as usize) {
                        unsafe { arena.write(eoff, EdgeRecord::new(dst, w)) };
                        eoff += span.edge_stride();
                    }
                    cursor += span.span(deg as usize);
                }
                debug_assert_eq!(cursor, pr.bytes);
                Ok((
                    Partition {
                        arena,
                        nodes: pr.nodes.clone(),
                    },
                    offs,
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Stitch the per-worker blocks into one logical address space.
        let mut locs = vec![RecordLoc { part: 0, offset: 0 }; num_nodes];
        let mut parts = Vec::with_capacity(built.len());
        for (pid, (part, offs)) in built.into_iter().enumerate() {
            for (k, offset) in offs.into_iter().enumerate() {
                debug_assert!(offset as u64 <= OFFSET_MASK);
                locs[part.nodes.start as usize + k] = RecordLoc {
                    part: pid as u32,
                    offset,
                };
            }
            parts.push(part);
        }

        let graph = PartitionedGraph {
            parts: parts.into_boxed_slice(),
            locs: locs.into_boxed_slice(),
            span,
            num_edges,
            _payloads: PhantomData,
        };
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        graph.debug_assert_cover();
        log::debug!("populated partitioned graph: {num_nodes} nodes, {num_edges} edges");
        Ok(graph)
    }
}

impl<N, E> PartitionedGraph<N, E> {
    #[inline]
    fn record(&self, n: NodeId) -> &NodeRecord<N> {
        let loc = self.locs[n.index()];
        unsafe { self.parts[loc.part as usize].arena.get(loc.offset) }
    }

    #[inline]
    fn edge_record(&self, e: EdgeId) -> &EdgeRecord<E> {
        let part = (e.get() >> PART_SHIFT) as usize;
        let offset = (e.get() & OFFSET_MASK) as usize;
        unsafe { self.parts[part].arena.get(offset) }
    }

    fn edge_slice(&self, n: NodeId) -> &[EdgeRecord<E>] {
        let loc = self.locs[n.index()];
        let deg = self.record(n).degree();
        unsafe {
            self.parts[loc.part as usize]
                .arena
                .slice(loc.offset + self.span.edge_offset(), deg)
        }
    }

    /// Number of worker partitions.
    pub fn num_partitions(&self) -> usize {
        self.parts.len()
    }

    /// Partition owning `n`.
    pub fn partition_of(&self, n: NodeId) -> usize {
        self.locs[n.index()].part as usize
    }

    /// Arena bytes held by `worker`'s partition.
    pub fn partition_bytes(&self, worker: usize) -> usize {
        self.parts[worker].arena.len()
    }

    /// Nodes owned by `worker`'s partition, in original node order.
    ///
    /// Concatenating `local_nodes` over all workers in partition order yields
    /// exactly the global [`LocalGraph::nodes`] sequence; workers use this to
    /// process the slice of the graph they physically own.
    pub fn local_nodes(&self, worker: usize) -> NodeRange {
        node_subrange(self.parts[worker].nodes.clone())
    }

    #[cfg(any(debug_assertions, feature = "check-invariants"))]
    fn debug_assert_cover(&self) {
        let mut next = 0u32;
        for part in self.parts.iter() {
            assert_eq!(part.nodes.start, next, "partitions must be contiguous");
            next = part.nodes.end;
        }
        assert_eq!(next as usize, self.locs.len(), "partitions must cover all nodes");
    }
}

impl<N, E> Drop for PartitionedGraph<N, E> {
    fn drop(&mut self) {
        // Payload destructors run record by record; the arenas then free
        // their blocks whole.
        if !needs_drop::<N>() && !needs_drop::<E>() {
            return;
        }
        for loc in self.locs.iter() {
            let arena = &self.parts[loc.part as usize].arena;
            unsafe {
                let rec = arena.ptr_at::<NodeRecord<N>>(loc.offset);
                let deg = (*rec).degree();
                if needs_drop::<E>() {
                    let first = loc.offset + self.span.edge_offset();
                    for k in 0..deg {
                        let e = first + k * self.span.edge_stride();
                        ptr::drop_in_place(arena.ptr_at::<EdgeRecord<E>>(e));
                    }
                }
                if needs_drop::<N>() {
                    ptr::drop_in_place(rec);
                }
            }
        }
    }
}

impl<N, E> LocalGraph for PartitionedGraph<N, E> {
    type NodeData = N;
    type EdgeData = E;
    type NodeIter<'a>
        = NodeRange
    where
        Self: 'a;
    type EdgeIter<'a>
        = ArenaEdges
    where
        Self: 'a;

    #[inline]
    fn size(&self) -> usize {
        self.locs.len()
    }

    #[inline]
    fn size_edges(&self) -> usize {
        self.num_edges
    }

    fn nodes(&self) -> NodeRange {
        node_range(self.locs.len())
    }

    fn try_edges<'a>(
        &'a self,
        n: NodeId,
        guard: &impl ConflictGuard,
        policy: AcquirePolicy,
    ) -> Result<ArenaEdges, Conflict> {
        acquire_node(guard, policy, n)?;
        let loc = self.locs[n.index()];
        let deg = self.record(n).degree();
        if policy.lock_neighbors() {
            for er in self.edge_slice(n) {
                acquire_node(guard, policy, er.dst())?;
            }
        }
        Ok(arena_edges(
            (loc.part as u64) << PART_SHIFT,
            loc.offset + self.span.edge_offset(),
            deg,
            self.span.edge_stride(),
        ))
    }

    #[inline]
    fn edge_dst(&self, e: EdgeId) -> NodeId {
        self.edge_record(e).dst()
    }

    fn try_data<'a>(
        &'a self,
        n: NodeId,
        guard: &impl ConflictGuard,
        policy: AcquirePolicy,
    ) -> Result<&'a N, Conflict> {
        acquire_node(guard, policy, n)?;
        Ok(self.record(n).data().get())
    }

    fn try_edge_data<'a>(
        &'a self,
        e: EdgeId,
        _guard: &impl ConflictGuard,
        _policy: AcquirePolicy,
    ) -> Result<&'a E, Conflict> {
        Ok(self.edge_record(e).data().get())
    }

    unsafe fn try_data_mut<'a>(
        &'a self,
        n: NodeId,
        guard: &impl ConflictGuard,
        policy: AcquirePolicy,
    ) -> Result<&'a mut N, Conflict> {
        debug_assert!(policy.permits_write());
        acquire_node(guard, policy, n)?;
        Ok(unsafe { self.record(n).data().get_mut_shared() })
    }

    unsafe fn try_edge_data_mut<'a>(
        &'a self,
        e: EdgeId,
        _guard: &impl ConflictGuard,
        policy: AcquirePolicy,
    ) -> Result<&'a mut E, Conflict> {
        debug_assert!(policy.permits_write());
        Ok(unsafe { self.edge_record(e).data().get_mut_shared() })
    }

    fn data_mut(&mut self, n: NodeId) -> &mut N {
        unsafe { self.record(n).data().get_mut_shared() }
    }

    fn edge_data_mut(&mut self, e: EdgeId) -> &mut E {
        unsafe { self.edge_record(e).data().get_mut_shared() }
    }

    #[inline]
    fn out_degree(&self, n: NodeId) -> usize {
        self.record(n).degree()
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

    fn weighted(num_nodes: u32, edges: &[(u32, u32, u64)]) -> GraphBuilder<u64> {
        let mut b = GraphBuilder::new(num_nodes as usize);
        for &(u, v, w) in edges {
            b.add_edge(n(u), n(v), w);
        }
        b
    }

    fn plan_covers(plan: &PartitionPlan, num_nodes: u32) {
        let mut next = 0u32;
        for part in plan.parts() {
            assert_eq!(part.nodes.start, next);
            next = part.nodes.end;
        }
        assert_eq!(next, num_nodes);
    }

    #[test]
    fn plan_assigns_every_node_once() {
        let span = RecordSpan::of::<(), u64>();
        for workers in 1..=6 {
            let degrees = [3u32, 0, 5, 1, 1, 0, 2, 4];
            let plan = PartitionPlan::from_degrees(&degrees, span, workers).unwrap();
            assert_eq!(plan.num_parts(), workers);
            plan_covers(&plan, degrees.len() as u32);
            let edges: usize = plan.parts().iter().map(|p| p.num_edges).sum();
            assert_eq!(edges, degrees.iter().map(|&d| d as usize).sum::<usize>());
        }
    }

    #[test]
    fn plan_with_more_workers_than_nodes() {
        let span = RecordSpan::of::<(), ()>();
        let plan = PartitionPlan::from_degrees(&[1, 1], span, 8).unwrap();
        assert_eq!(plan.num_parts(), 8);
        plan_covers(&plan, 2);
    }

    #[test]
    fn plan_rejects_zero_workers() {
        let span = RecordSpan::of::<(), ()>();
        assert_eq!(
            PartitionPlan::from_degrees(&[1], span, 0).unwrap_err(),
            FlatGraphError::ZeroPartitions
        );
    }

    #[test]
    fn part_of_matches_ranges() {
        let span = RecordSpan::of::<(), u64>();
        let degrees = [2u32, 2, 2, 2, 2, 2];
        let plan = PartitionPlan::from_degrees(&degrees, span, 3).unwrap();
        for i in 0..degrees.len() as u32 {
            let p = plan.part_of(n(i));
            assert!(plan.parts()[p].nodes.contains(&i));
        }
    }

    #[test]
    fn agrees_with_csr_variant() {
        let src = weighted(5, &[(0, 1, 1), (0, 2, 2), (1, 2, 3), (2, 3, 4), (3, 0, 5), (4, 0, 6)]);
        let a: CsrGraph<(), u64> = CsrGraph::from_source(&src).unwrap();
        for workers in [1, 2, 3, 7] {
            let b: PartitionedGraph<(), u64> =
                PartitionedGraph::from_source(&src, workers).unwrap();
            assert_eq!(a.size(), b.size());
            assert_eq!(a.size_edges(), b.size_edges());
            for v in a.nodes() {
                let csr: Vec<(u32, u64)> = a
                    .edges(v)
                    .map(|e| (a.edge_dst(e).get(), *a.edge_data(e)))
                    .collect();
                let part: Vec<(u32, u64)> = b
                    .edges(v)
                    .map(|e| (b.edge_dst(e).get(), *b.edge_data(e)))
                    .collect();
                assert_eq!(csr, part);
            }
        }
    }

    #[test]
    fn local_nodes_concatenate_to_global_iteration() {
        let src = weighted(9, &[(0, 1, 1), (2, 3, 1), (4, 5, 1), (6, 7, 1), (8, 0, 1)]);
        let g: PartitionedGraph<(), u64> = PartitionedGraph::from_source(&src, 4).unwrap();
        let local: Vec<u32> = (0..g.num_partitions())
            .flat_map(|w| g.local_nodes(w).map(|v| v.get()))
            .collect();
        let global: Vec<u32> = g.nodes().map(|v| v.get()).collect();
        assert_eq!(local, global);
        for w in 0..g.num_partitions() {
            for v in g.local_nodes(w) {
                assert_eq!(g.partition_of(v), w);
            }
        }
    }

    #[test]
    fn node_payloads_live_in_owning_partition() {
        let src = weighted(4, &[(0, 1, 9), (1, 2, 9), (2, 3, 9)]);
        let mut g: PartitionedGraph<u32, u64> = PartitionedGraph::from_source(&src, 2).unwrap();
        for v in g.nodes() {
            *g.data_mut(v) = v.get() * 10;
        }
        for v in g.nodes() {
            assert_eq!(*g.data(v), v.get() * 10);
        }
    }

    #[test]
    fn teardown_frees_partitions_and_payloads() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        #[derive(Clone, Default)]
        struct DropTick(Option<Arc<AtomicUsize>>);
        impl Drop for DropTick {
            fn drop(&mut self) {
                if let Some(t) = &self.0 {
                    t.fetch_add(1, Ordering::Relaxed);
                }
            }
        }

        let ticks = Arc::new(AtomicUsize::new(0));
        let mut b = GraphBuilder::<DropTick>::new(3);
        b.add_edge(n(0), n(1), DropTick(Some(ticks.clone())));
        b.add_edge(n(1), n(2), DropTick(Some(ticks.clone())));

        let g: PartitionedGraph<(), DropTick> = PartitionedGraph::from_source(&b, 2).unwrap();
        let before = ticks.load(Ordering::Relaxed);
        drop(g);
        assert_eq!(ticks.load(Ordering::Relaxed) - before, 2);
    }
}
