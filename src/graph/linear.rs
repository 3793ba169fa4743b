//! Linear storage variant: self-describing records in one raw arena.
//!
//! A node record stores only its payload and out-degree; its edge records
//! follow it immediately in the arena, so the edge range is computed from
//! the record's own position instead of being stored. This drops a begin/end
//! pair per node in exchange for a statically known, uniform edge-record
//! stride.
//!
//! Records live in an untyped byte arena, so this variant manages payload
//! lifetime explicitly: teardown walks every node and runs the node and edge
//! payload destructors before the arena is returned as one block.

use crate::acquire::{AcquirePolicy, Conflict, ConflictGuard, acquire_node};
use crate::graph::{ArenaEdges, LocalGraph, NodeRange, arena_edges, node_range};
use crate::graph_error::FlatGraphError;
use crate::storage::arena::ByteArena;
use crate::storage::cell::PayloadCell;
use crate::storage::record::{EdgeRecord, NodeRecord, RecordSpan};
use crate::topology::handle::{EdgeId, NodeId};
use crate::topology::source::{self, TopologySource};
use std::cmp::Ordering;
use std::marker::PhantomData;
use std::mem::needs_drop;
use std::ptr;

/// Linear graph with node payload `N` and edge payload `E`.
///
/// Edge handles carry the record's byte offset in the arena.
#[derive(Debug)]
pub struct LinearGraph<N, E> {
    arena: ByteArena,
    /// Byte offset of each node's record; the derived pointer-like view of
    /// the dense node handle.
    offsets: Box<[usize]>,
    span: RecordSpan,
    num_edges: usize,
    _payloads: PhantomData<(PayloadCell<N>, PayloadCell<E>)>,
}

impl<N, E> LinearGraph<N, E> {
    /// Populate from a topology source.
    ///
    /// One pass lays records down behind a bump cursor in node order; the
    /// arena is sized exactly from the degree sequence beforehand.
    pub fn from_source<S>(src: &S) -> Result<Self, FlatGraphError>
    where
        S: TopologySource<EdgeData = E>,
        N: Default,
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

        let total = span.arena_bytes(degrees.iter().map(|&d| d as usize));
        let mut arena = ByteArena::zeroed(total, span.align())?;
        let mut offsets = Vec::with_capacity(num_nodes);
        let mut cursor = 0usize;
        for (i, &deg) in degrees.iter().enumerate() {
            offsets.push(cursor);
            unsafe { arena.write(cursor, NodeRecord::new(N::default(), deg)) };
            let mut eoff = cursor + span.edge_offset();
            let mut written = 0usize;
            for (dst, w) in src.neighbors(NodeId::new(i as u32)).take(deg as usize) {
                unsafe { arena.write(eoff, EdgeRecord::new(dst, w)) };
                eoff += span.edge_stride();
                written += 1;
            }
            debug_assert_eq!(written, deg as usize, "degree table disagrees with neighbors");
            cursor += span.span(deg as usize);
        }
        debug_assert_eq!(cursor, total);

        log::debug!(
            "populated linear graph: {num_nodes} nodes, {num_edges} edges, {total} arena bytes"
        );
        Ok(LinearGraph {
            arena,
            offsets: offsets.into_boxed_slice(),
            span,
            num_edges,
            _payloads: PhantomData,
        })
    }

    #[inline]
    fn record(&self, n: NodeId) -> &NodeRecord<N> {
        unsafe { self.arena.get(self.offsets[n.index()]) }
    }

    /// Byte offset of `n`'s first edge record, computed from the record's
    /// own position.
    #[inline]
    fn edge_begin_offset(&self, n: NodeId) -> usize {
        self.offsets[n.index()] + self.span.edge_offset()
    }

    #[inline]
    fn edge_record(&self, e: EdgeId) -> &EdgeRecord<E> {
        unsafe { self.arena.get(e.get() as usize) }
    }

    fn edge_slice(&self, n: NodeId) -> &[EdgeRecord<E>] {
        let deg = self.record(n).degree();
        unsafe { self.arena.slice(self.edge_begin_offset(n), deg) }
    }

    /// Sort `n`'s outgoing edge records in place with a comparator over whole
    /// records (destination and payload).
    pub fn sort_edges_by<F>(&mut self, n: NodeId, mut cmp: F)
    where
        F: FnMut(&EdgeRecord<E>, &EdgeRecord<E>) -> Ordering,
    {
        let off = self.edge_begin_offset(n);
        let deg = self.record(n).degree();
        let edges: &mut [EdgeRecord<E>] = unsafe { self.arena.slice_mut(off, deg) };
        edges.sort_by(|a, b| cmp(a, b));
    }

    /// Sort `n`'s outgoing edges with a comparator over the payload alone.
    pub fn sort_edges_by_data<F>(&mut self, n: NodeId, mut cmp: F)
    where
        F: FnMut(&E, &E) -> Ordering,
    {
        self.sort_edges_by(n, |a, b| cmp(a.data().get(), b.data().get()));
    }

    /// Sort `n`'s outgoing edges by ascending payload.
    pub fn sort_edges(&mut self, n: NodeId)
    where
        E: Ord,
    {
        self.sort_edges_by_data(n, |a, b| a.cmp(b));
    }
}

impl<N, E> Drop for LinearGraph<N, E> {
    fn drop(&mut self) {
        // Records sit in a raw byte arena, so payload destructors must run
        // explicitly before the block is freed whole.
        if !needs_drop::<N>() && !needs_drop::<E>() {
            return;
        }
        for &off in self.offsets.iter() {
            unsafe {
                let rec = self.arena.ptr_at::<NodeRecord<N>>(off);
                let deg = (*rec).degree();
                if needs_drop::<E>() {
                    let first = off + self.span.edge_offset();
                    for k in 0..deg {
                        let e = first + k * self.span.edge_stride();
                        ptr::drop_in_place(self.arena.ptr_at::<EdgeRecord<E>>(e));
                    }
                }
                if needs_drop::<N>() {
                    ptr::drop_in_place(rec);
                }
            }
        }
    }
}

impl<N, E> LocalGraph for LinearGraph<N, E> {
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
        self.offsets.len()
    }

    #[inline]
    fn size_edges(&self) -> usize {
        self.num_edges
    }

    fn nodes(&self) -> NodeRange {
        node_range(self.offsets.len())
    }

    fn try_edges<'a>(
        &'a self,
        n: NodeId,
        guard: &impl ConflictGuard,
        policy: AcquirePolicy,
    ) -> Result<ArenaEdges, Conflict> {
        acquire_node(guard, policy, n)?;
        let deg = self.record(n).degree();
        if policy.lock_neighbors() {
            for er in self.edge_slice(n) {
                acquire_node(guard, policy, er.dst())?;
            }
        }
        Ok(arena_edges(
            0,
            self.edge_begin_offset(n),
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
