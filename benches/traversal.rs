use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use flatgraph::graph::{CsrGraph, InlineGraph, LinearGraph, LocalGraph, PartitionedGraph};
use flatgraph::topology::{GraphBuilder, NodeId};

// Synthetic graph with uniformly random edges and u64 weights.
fn random_graph(n: usize, avg_degree: usize, seed: u64) -> GraphBuilder<u64> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut b = GraphBuilder::new(n);
    for u in 0..n as u32 {
        for _ in 0..avg_degree {
            let v = rng.gen_range(0..n as u32);
            b.add_edge(NodeId::new(u), NodeId::new(v), rng.r#gen::<u64>() >> 32);
        }
    }
    b
}

fn sum_weights<G: LocalGraph<EdgeData = u64>>(g: &G) -> u64 {
    let mut acc = 0u64;
    for v in g.nodes() {
        for e in g.edges(v) {
            acc = acc.wrapping_add(*g.edge_data(e)).wrapping_add(g.edge_dst(e).get() as u64);
        }
    }
    acc
}

fn bench_traversal(c: &mut Criterion) {
    let mut group = c.benchmark_group("full-traversal");

    for &(n, d) in &[(1_000usize, 8usize), (10_000, 16)] {
        let src = random_graph(n, d, 42);
        let csr: CsrGraph<(), u64> = CsrGraph::from_source(&src).unwrap();
        let inline: InlineGraph<(), u64> = InlineGraph::from_source(&src).unwrap();
        let linear: LinearGraph<(), u64> = LinearGraph::from_source(&src).unwrap();
        let parted: PartitionedGraph<(), u64> = PartitionedGraph::from_source(&src, 4).unwrap();

        group.bench_with_input(BenchmarkId::new("csr", n), &csr, |bench, g| {
            bench.iter(|| black_box(sum_weights(g)))
        });
        group.bench_with_input(BenchmarkId::new("inline", n), &inline, |bench, g| {
            bench.iter(|| black_box(sum_weights(g)))
        });
        group.bench_with_input(BenchmarkId::new("linear", n), &linear, |bench, g| {
            bench.iter(|| black_box(sum_weights(g)))
        });
        group.bench_with_input(BenchmarkId::new("partitioned", n), &parted, |bench, g| {
            bench.iter(|| black_box(sum_weights(g)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_traversal);
criterion_main!(benches);
