//! Property tests for the NUMA partition plan: exact cover, contiguity, and
//! local/global iteration agreement under arbitrary topologies.

use flatgraph::graph::{LocalGraph, PartitionPlan, PartitionedGraph};
use flatgraph::storage::RecordSpan;
use flatgraph::topology::{GraphBuilder, NodeId};
use proptest::prelude::*;

proptest! {
    #[test]
    fn plan_partitions_cover_exactly(
        degrees in proptest::collection::vec(0u32..20, 0..80),
        workers in 1usize..10,
    ) {
        let span = RecordSpan::of::<u64, u32>();
        let plan = PartitionPlan::from_degrees(&degrees, span, workers).unwrap();
        prop_assert_eq!(plan.num_parts(), workers);

        // Contiguous in original node order, no gaps, no overlap.
        let mut next = 0u32;
        for part in plan.parts() {
            prop_assert_eq!(part.nodes.start, next);
            next = part.nodes.end;
        }
        prop_assert_eq!(next as usize, degrees.len());

        // Edge and byte totals split without loss.
        let edges: usize = plan.parts().iter().map(|p| p.num_edges).sum();
        prop_assert_eq!(edges, degrees.iter().map(|&d| d as usize).sum::<usize>());
        let bytes: usize = plan.parts().iter().map(|p| p.bytes).sum();
        prop_assert_eq!(bytes, span.arena_bytes(degrees.iter().map(|&d| d as usize)));
    }

    #[test]
    fn local_iteration_concatenates_to_global(
        edges in proptest::collection::vec((0u32..30, 0u32..30), 0..120),
        workers in 1usize..8,
    ) {
        let mut b = GraphBuilder::<()>::new(30);
        for &(u, v) in &edges {
            b.add_edge(NodeId::new(u), NodeId::new(v), ());
        }
        let g: PartitionedGraph<(), ()> = PartitionedGraph::from_source(&b, workers).unwrap();

        let local: Vec<u32> = (0..g.num_partitions())
            .flat_map(|w| g.local_nodes(w).map(|v| v.get()))
            .collect();
        let global: Vec<u32> = g.nodes().map(|v| v.get()).collect();
        prop_assert_eq!(local, global);

        // Each partition's byte size matches what its records need.
        let span = RecordSpan::of::<(), ()>();
        for w in 0..g.num_partitions() {
            let expected = span.arena_bytes(g.local_nodes(w).map(|v| g.out_degree(v)));
            prop_assert_eq!(g.partition_bytes(w), expected);
        }
    }
}

#[test]
fn single_worker_owns_everything() {
    let mut b = GraphBuilder::<()>::new(5);
    b.add_edge(NodeId::new(0), NodeId::new(4), ());
    let g: PartitionedGraph<(), ()> = PartitionedGraph::from_source(&b, 1).unwrap();
    assert_eq!(g.num_partitions(), 1);
    assert_eq!(g.local_nodes(0).count(), 5);
    for v in g.nodes() {
        assert_eq!(g.partition_of(v), 0);
    }
}
