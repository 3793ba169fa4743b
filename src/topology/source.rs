//! Topology sources: the construction input for every graph variant.
//!
//! A [`TopologySource`] is whatever produced the graph's structure (a file
//! parser, a generator, another graph), reduced to the sequences population
//! needs: totals, a cumulative out-degree table, and per-node neighbor
//! iterators in a deterministic node order. Graphs copy everything out in one
//! linear pass; the source is never consulted again after population.
//!
//! [`GraphBuilder`] is the crate's in-memory source: push edges, then
//! populate any variant from it.

use crate::graph_error::FlatGraphError;
use crate::topology::handle::NodeId;

/// Read-only topology description consumed during population.
///
/// Sequences must be mutually consistent: `edge_index()` yields one
/// cumulative out-degree per node ending at `num_edges()`, and
/// `edge_dsts()`/`edge_data()` yield edges grouped by source in node order,
/// matching the per-node `neighbors()` order exactly. [`validate`] checks the
/// cheap parts of that contract before any allocation happens.
pub trait TopologySource {
    type EdgeData;

    fn num_nodes(&self) -> usize;

    fn num_edges(&self) -> usize;

    /// Cumulative out-degree per node in node order: entry `i` is the total
    /// number of edges owned by nodes `0..=i`. Length `num_nodes()`, final
    /// entry `num_edges()`.
    fn edge_index(&self) -> impl Iterator<Item = u64> + '_;

    /// `(destination, payload)` pairs for `n`'s outgoing edges, in stored
    /// order.
    fn neighbors(&self, n: NodeId) -> impl Iterator<Item = (NodeId, Self::EdgeData)> + '_;

    /// All edge destinations grouped by source in node order.
    fn edge_dsts(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.num_nodes() as u32)
            .flat_map(move |i| self.neighbors(NodeId::new(i)).map(|(d, _)| d))
    }

    /// All edge payloads, same length and order as [`edge_dsts`](Self::edge_dsts).
    fn edge_data(&self) -> impl Iterator<Item = Self::EdgeData> + '_ {
        (0..self.num_nodes() as u32)
            .flat_map(move |i| self.neighbors(NodeId::new(i)).map(|(_, w)| w))
    }

    /// Out-degree of `n`.
    fn degree(&self, n: NodeId) -> usize {
        self.neighbors(n).count()
    }
}

/// Check a source's declared totals against its sequences.
///
/// Runs in O(nodes + edges) and touches no payloads. Population calls this
/// before allocating, so a malformed source fails fast with nothing built.
pub fn validate<S: TopologySource>(src: &S) -> Result<(), FlatGraphError> {
    let num_nodes = src.num_nodes();
    let num_edges = src.num_edges();

    let mut entries = 0usize;
    let mut prev = 0u64;
    for (i, cum) in src.edge_index().enumerate() {
        if cum < prev {
            return Err(FlatGraphError::NonMonotonicEdgeIndex { node: i });
        }
        prev = cum;
        entries += 1;
    }
    if entries != num_nodes {
        return Err(FlatGraphError::EdgeIndexLength {
            expected: num_nodes,
            found: entries,
        });
    }
    if prev as usize != num_edges {
        return Err(FlatGraphError::EdgeCountMismatch {
            declared: num_edges,
            found: prev as usize,
        });
    }

    let mut listed = 0usize;
    for dst in src.edge_dsts() {
        if dst.index() >= num_nodes {
            return Err(FlatGraphError::DestinationOutOfRange {
                dst: dst.get(),
                num_nodes,
            });
        }
        listed += 1;
    }
    if listed != num_edges {
        return Err(FlatGraphError::EdgeListLength {
            expected: num_edges,
            found: listed,
        });
    }

    log::debug!("topology source validated: {num_nodes} nodes, {num_edges} edges");
    Ok(())
}

/// In-memory adjacency-list topology.
///
/// The stand-in for an external structure parser: tests and small tools build
/// one edge by edge, then populate a storage variant from it.
///
/// ```
/// use flatgraph::topology::{GraphBuilder, NodeId};
///
/// let mut b = GraphBuilder::<u32>::new(3);
/// b.add_edge(NodeId::new(0), NodeId::new(1), 10);
/// b.add_edge(NodeId::new(1), NodeId::new(2), 20);
/// assert_eq!(b.num_edges(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder<E = ()> {
    adj: Vec<Vec<(NodeId, E)>>,
    num_edges: usize,
}

impl<E> GraphBuilder<E> {
    pub fn new(num_nodes: usize) -> Self {
        GraphBuilder {
            adj: (0..num_nodes).map(|_| Vec::new()).collect(),
            num_edges: 0,
        }
    }

    /// Append a node with no edges, returning its handle.
    pub fn add_node(&mut self) -> NodeId {
        let id = NodeId::new(self.adj.len() as u32);
        self.adj.push(Vec::new());
        id
    }

    /// Append the edge `src → dst`.
    ///
    /// # Panics
    /// Panics when either endpoint is not a node of this builder.
    pub fn add_edge(&mut self, src: NodeId, dst: NodeId, data: E) {
        assert!(
            dst.index() < self.adj.len(),
            "edge destination {dst} out of range"
        );
        self.adj[src.index()].push((dst, data));
        self.num_edges += 1;
    }

    pub fn num_nodes(&self) -> usize {
        self.adj.len()
    }

    pub fn num_edges(&self) -> usize {
        self.num_edges
    }
}

impl<E: Clone> TopologySource for GraphBuilder<E> {
    type EdgeData = E;

    fn num_nodes(&self) -> usize {
        self.adj.len()
    }

    fn num_edges(&self) -> usize {
        self.num_edges
    }

    fn edge_index(&self) -> impl Iterator<Item = u64> + '_ {
        self.adj.iter().scan(0u64, |cum, row| {
            *cum += row.len() as u64;
            Some(*cum)
        })
    }

    fn neighbors(&self, n: NodeId) -> impl Iterator<Item = (NodeId, E)> + '_ {
        self.adj[n.index()].iter().cloned()
    }

    fn degree(&self, n: NodeId) -> usize {
        self.adj[n.index()].len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> GraphBuilder<u32> {
        let mut b = GraphBuilder::new(4);
        b.add_edge(NodeId::new(0), NodeId::new(1), 1);
        b.add_edge(NodeId::new(0), NodeId::new(2), 2);
        b.add_edge(NodeId::new(1), NodeId::new(3), 3);
        b.add_edge(NodeId::new(2), NodeId::new(3), 4);
        b
    }

    #[test]
    fn cumulative_edge_index() {
        let b = diamond();
        assert_eq!(b.edge_index().collect::<Vec<_>>(), vec![2, 3, 4, 4]);
        assert_eq!(
            b.edge_dsts().map(NodeId::get).collect::<Vec<_>>(),
            vec![1, 2, 3, 3]
        );
        assert_eq!(b.edge_data().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert_eq!(b.degree(NodeId::new(0)), 2);
        assert_eq!(b.degree(NodeId::new(3)), 0);
    }

    #[test]
    fn validate_accepts_consistent_source() {
        validate(&diamond()).unwrap();
        validate(&GraphBuilder::<()>::new(0)).unwrap();
    }

    #[test]
    fn validate_rejects_inconsistent_totals() {
        struct Bad;
        impl TopologySource for Bad {
            type EdgeData = ();
            fn num_nodes(&self) -> usize {
                2
            }
            fn num_edges(&self) -> usize {
                3
            }
            fn edge_index(&self) -> impl Iterator<Item = u64> + '_ {
                [1u64, 2].into_iter()
            }
            fn neighbors(&self, _n: NodeId) -> impl Iterator<Item = (NodeId, ())> + '_ {
                std::iter::once((NodeId::new(0), ()))
            }
        }
        let err = validate(&Bad).unwrap_err();
        assert_eq!(
            err,
            FlatGraphError::EdgeCountMismatch {
                declared: 3,
                found: 2
            }
        );
    }

    #[test]
    fn validate_rejects_decreasing_index() {
        struct Bad;
        impl TopologySource for Bad {
            type EdgeData = ();
            fn num_nodes(&self) -> usize {
                2
            }
            fn num_edges(&self) -> usize {
                1
            }
            fn edge_index(&self) -> impl Iterator<Item = u64> + '_ {
                [2u64, 1].into_iter()
            }
            fn neighbors(&self, _n: NodeId) -> impl Iterator<Item = (NodeId, ())> + '_ {
                std::iter::empty()
            }
        }
        assert_eq!(
            validate(&Bad).unwrap_err(),
            FlatGraphError::NonMonotonicEdgeIndex { node: 1 }
        );
    }

    #[test]
    fn validate_rejects_out_of_range_destination() {
        struct Bad;
        impl TopologySource for Bad {
            type EdgeData = ();
            fn num_nodes(&self) -> usize {
                1
            }
            fn num_edges(&self) -> usize {
                1
            }
            fn edge_index(&self) -> impl Iterator<Item = u64> + '_ {
                std::iter::once(1)
            }
            fn neighbors(&self, _n: NodeId) -> impl Iterator<Item = (NodeId, ())> + '_ {
                std::iter::once((NodeId::new(9), ()))
            }
        }
        assert_eq!(
            validate(&Bad).unwrap_err(),
            FlatGraphError::DestinationOutOfRange {
                dst: 9,
                num_nodes: 1
            }
        );
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn add_edge_rejects_unknown_destination() {
        let mut b = GraphBuilder::<()>::new(1);
        b.add_edge(NodeId::new(0), NodeId::new(5), ());
    }
}
