//! # Sparse Graphs
//!
//! [`Graph`] is a sequential adjacency structure over `num_sources` source
//! vertices and `num_targets` target vertices. [`DistGraph`] splits the
//! source vertices into contiguous blocks over a communicator, one block
//! per member, with the last member taking the remainder.
//!
//! Both follow the same edit protocol. `queue_*` calls only buffer an edit
//! and mark the graph inconsistent; [`Graph::make_consistent`] then drops
//! the queued removals, sorts the edges by `(source, target)`, removes
//! duplicates and rebuilds the per-source offsets. Offset queries panic on
//! an inconsistent graph.
//!
//! ```rust
//! use gridla::graph::Graph;
//!
//! let mut g = Graph::new(3);
//! g.queue_connection(2, 0);
//! g.queue_connection(0, 1);
//! g.queue_connection(2, 0);
//! g.make_consistent();
//! assert_eq!(g.num_edges(), 2);
//! assert_eq!(g.num_connections(2), 1);
//! ```

use crate::distributed::Comm;
use std::collections::BTreeSet;
use tracing::trace;

/// Edge storage shared by both graph flavours: parallel source and target
/// arrays plus the CSR-like offsets of a contiguous range of sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct EdgeList {
    sources: Vec<usize>,
    targets: Vec<usize>,
    marked: BTreeSet<(usize, usize)>,
    offsets: Vec<usize>,
    consistent: bool,
}

impl EdgeList {
    /// An empty, consistent list covering `num_sources` sources.
    fn new(num_sources: usize) -> Self {
        Self {
            offsets: vec![0; num_sources + 1],
            consistent: true,
            ..Default::default()
        }
    }

    fn reserve(&mut self, additional: usize) {
        self.sources.reserve(additional);
        self.targets.reserve(additional);
    }

    fn capacity(&self) -> usize {
        self.sources.capacity().min(self.targets.capacity())
    }

    fn push(&mut self, source: usize, target: usize) {
        self.sources.push(source);
        self.targets.push(target);
        self.consistent = false;
    }

    fn mark(&mut self, source: usize, target: usize) {
        self.marked.insert((source, target));
        self.consistent = false;
    }

    /// Sources in `first..first + count` index the offsets.
    fn make_consistent(&mut self, first: usize, count: usize) {
        if self.consistent {
            return;
        }
        let mut pairs: Vec<(usize, usize)> = self
            .sources
            .iter()
            .copied()
            .zip(self.targets.iter().copied())
            .filter(|pair| !self.marked.contains(pair))
            .collect();
        self.marked.clear();
        pairs.sort_unstable();
        pairs.dedup();
        (self.sources, self.targets) = pairs.into_iter().unzip();

        self.offsets.clear();
        self.offsets.reserve(count + 1);
        let mut e = 0;
        for s in first..=first + count {
            while e < self.sources.len() && self.sources[e] < s {
                e += 1;
            }
            self.offsets.push(e);
        }
        self.consistent = true;
    }

    fn offset(&self, local_source: usize, count: usize) -> usize {
        assert!(self.consistent, "graph is not consistent; call make_consistent first");
        assert!(
            local_source <= count,
            "source offset {local_source} out of range [0, {count}]"
        );
        self.offsets[local_source]
    }
}

/// A sequential directed graph from `num_sources` to `num_targets` vertices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    num_sources: usize,
    num_targets: usize,
    edges: EdgeList,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Graph {
    /// A graph on `num_vertices` vertices with no edges.
    pub fn new(num_vertices: usize) -> Self {
        Self::with_shape(num_vertices, num_vertices)
    }

    pub fn with_shape(num_sources: usize, num_targets: usize) -> Self {
        Self {
            num_sources,
            num_targets,
            edges: EdgeList::new(num_sources),
        }
    }

    /// Drops every edge and sets the vertex counts to zero.
    pub fn empty(&mut self) {
        *self = Self::new(0);
    }

    /// Drops every edge and sets new vertex counts.
    pub fn resize(&mut self, num_sources: usize, num_targets: usize) {
        *self = Self::with_shape(num_sources, num_targets);
    }

    pub fn reserve(&mut self, num_edges: usize) {
        self.edges.reserve(num_edges);
    }

    fn check_edge(&self, source: usize, target: usize) {
        assert!(
            source < self.num_sources,
            "source {source} out of range [0, {})",
            self.num_sources
        );
        assert!(
            target < self.num_targets,
            "target {target} out of range [0, {})",
            self.num_targets
        );
    }

    pub fn queue_connection(&mut self, source: usize, target: usize) {
        self.check_edge(source, target);
        self.edges.push(source, target);
    }

    /// Removes `(source, target)` at the next [`make_consistent`](Self::make_consistent),
    /// including copies queued after this call but before that one.
    pub fn queue_disconnection(&mut self, source: usize, target: usize) {
        self.check_edge(source, target);
        self.edges.mark(source, target);
    }

    pub fn connect(&mut self, source: usize, target: usize) {
        self.queue_connection(source, target);
        self.make_consistent();
    }

    pub fn disconnect(&mut self, source: usize, target: usize) {
        self.queue_disconnection(source, target);
        self.make_consistent();
    }

    pub fn make_consistent(&mut self) {
        self.edges.make_consistent(0, self.num_sources);
    }

    pub fn num_sources(&self) -> usize {
        self.num_sources
    }

    pub fn num_targets(&self) -> usize {
        self.num_targets
    }

    pub fn num_edges(&self) -> usize {
        self.edges.sources.len()
    }

    pub fn capacity(&self) -> usize {
        self.edges.capacity()
    }

    pub fn consistent(&self) -> bool {
        self.edges.consistent
    }

    pub fn source(&self, edge: usize) -> usize {
        self.edges.sources[edge]
    }

    pub fn target(&self, edge: usize) -> usize {
        self.edges.targets[edge]
    }

    /// Index of the first edge leaving `source`; `edge_offset(num_sources)`
    /// is the edge count.
    pub fn edge_offset(&self, source: usize) -> usize {
        self.edges.offset(source, self.num_sources)
    }

    pub fn num_connections(&self, source: usize) -> usize {
        self.edge_offset(source + 1) - self.edge_offset(source)
    }

    pub fn sources(&self) -> &[usize] {
        &self.edges.sources
    }

    pub fn targets(&self) -> &[usize] {
        &self.edges.targets
    }
}

/// A graph whose source vertices are block-partitioned over a communicator.
///
/// Member `r` of an `s`-member communicator owns sources
/// `r * blocksize .. r * blocksize + num_local_sources` with
/// `blocksize = num_sources / s`; the last member also takes the
/// `num_sources % s` left over. Each member stores only the edges leaving
/// its own sources, and no method communicates.
#[derive(Debug, Clone)]
pub struct DistGraph {
    comm: Comm,
    num_sources: usize,
    num_targets: usize,
    blocksize: usize,
    first_local_source: usize,
    num_local_sources: usize,
    edges: EdgeList,
}

impl DistGraph {
    /// An empty graph over `comm`.
    pub fn new(comm: &Comm) -> Self {
        Self::with_shape(0, 0, comm)
    }

    pub fn with_vertices(num_vertices: usize, comm: &Comm) -> Self {
        Self::with_shape(num_vertices, num_vertices, comm)
    }

    pub fn with_shape(num_sources: usize, num_targets: usize, comm: &Comm) -> Self {
        let mut graph = Self {
            comm: comm.clone(),
            num_sources,
            num_targets,
            blocksize: 0,
            first_local_source: 0,
            num_local_sources: 0,
            edges: EdgeList::new(0),
        };
        graph.repartition();
        graph
    }

    /// Each member keeps the edges of `graph` that leave its own sources.
    /// `graph` is expected to be identical on every member of `comm`.
    pub fn from_graph(graph: &Graph, comm: &Comm) -> Self {
        let mut dist = Self::with_shape(graph.num_sources, graph.num_targets, comm);
        let local = dist.first_local_source..dist.first_local_source + dist.num_local_sources;
        for (&s, &t) in graph.edges.sources.iter().zip(&graph.edges.targets) {
            if local.contains(&s) {
                dist.edges.push(s, t);
            }
        }
        for &(s, t) in &graph.edges.marked {
            if local.contains(&s) {
                dist.edges.mark(s, t);
            }
        }
        if graph.consistent() {
            dist.make_consistent();
        }
        dist
    }

    fn repartition(&mut self) {
        let (rank, size) = (self.comm.rank(), self.comm.size());
        self.blocksize = self.num_sources / size;
        self.first_local_source = rank * self.blocksize;
        self.num_local_sources = if rank + 1 < size {
            self.blocksize
        } else {
            self.num_sources - (size - 1) * self.blocksize
        };
        self.edges = EdgeList::new(self.num_local_sources);
        trace!(
            rank,
            first = self.first_local_source,
            count = self.num_local_sources,
            "graph partitioned"
        );
    }

    pub fn empty(&mut self) {
        self.resize(0, 0);
    }

    /// Drops every edge and repartitions for the new vertex counts.
    pub fn resize(&mut self, num_sources: usize, num_targets: usize) {
        self.num_sources = num_sources;
        self.num_targets = num_targets;
        self.repartition();
    }

    /// Moves the graph onto `comm`, dropping every edge.
    pub fn set_comm(&mut self, comm: &Comm) {
        self.comm = comm.clone();
        self.repartition();
    }

    pub fn reserve(&mut self, num_local_edges: usize) {
        self.edges.reserve(num_local_edges);
    }

    pub fn is_local_source(&self, source: usize) -> bool {
        (self.first_local_source..self.first_local_source + self.num_local_sources).contains(&source)
    }

    fn check_local_edge(&self, local_source: usize, target: usize) {
        assert!(
            local_source < self.num_local_sources,
            "local source {local_source} out of range [0, {})",
            self.num_local_sources
        );
        assert!(
            target < self.num_targets,
            "target {target} out of range [0, {})",
            self.num_targets
        );
    }

    fn to_local(&self, source: usize) -> usize {
        assert!(
            self.is_local_source(source),
            "source {source} is not local to rank {} (owns [{}, {}))",
            self.comm.rank(),
            self.first_local_source,
            self.first_local_source + self.num_local_sources
        );
        source - self.first_local_source
    }

    /// Queues an edge from a global source, which must be local.
    pub fn queue_connection(&mut self, source: usize, target: usize) {
        let local = self.to_local(source);
        self.queue_local_connection(local, target);
    }

    pub fn queue_local_connection(&mut self, local_source: usize, target: usize) {
        self.check_local_edge(local_source, target);
        self.edges.push(self.first_local_source + local_source, target);
    }

    /// Queues the removal of an edge from a global source, which must be local.
    pub fn queue_disconnection(&mut self, source: usize, target: usize) {
        let local = self.to_local(source);
        self.queue_local_disconnection(local, target);
    }

    pub fn queue_local_disconnection(&mut self, local_source: usize, target: usize) {
        self.check_local_edge(local_source, target);
        self.edges.mark(self.first_local_source + local_source, target);
    }

    pub fn connect(&mut self, source: usize, target: usize) {
        self.queue_connection(source, target);
        self.make_consistent();
    }

    pub fn connect_local(&mut self, local_source: usize, target: usize) {
        self.queue_local_connection(local_source, target);
        self.make_consistent();
    }

    pub fn disconnect(&mut self, source: usize, target: usize) {
        self.queue_disconnection(source, target);
        self.make_consistent();
    }

    pub fn disconnect_local(&mut self, local_source: usize, target: usize) {
        self.queue_local_disconnection(local_source, target);
        self.make_consistent();
    }

    pub fn make_consistent(&mut self) {
        self.edges
            .make_consistent(self.first_local_source, self.num_local_sources);
    }

    pub fn comm(&self) -> &Comm {
        &self.comm
    }

    pub fn num_sources(&self) -> usize {
        self.num_sources
    }

    pub fn num_targets(&self) -> usize {
        self.num_targets
    }

    pub fn blocksize(&self) -> usize {
        self.blocksize
    }

    pub fn first_local_source(&self) -> usize {
        self.first_local_source
    }

    pub fn num_local_sources(&self) -> usize {
        self.num_local_sources
    }

    pub fn num_local_edges(&self) -> usize {
        self.edges.sources.len()
    }

    pub fn capacity(&self) -> usize {
        self.edges.capacity()
    }

    pub fn consistent(&self) -> bool {
        self.edges.consistent
    }

    /// Global source of local edge `local_edge`.
    pub fn source(&self, local_edge: usize) -> usize {
        self.edges.sources[local_edge]
    }

    pub fn target(&self, local_edge: usize) -> usize {
        self.edges.targets[local_edge]
    }

    /// Index of the first local edge leaving local source `local_source`.
    pub fn edge_offset(&self, local_source: usize) -> usize {
        self.edges.offset(local_source, self.num_local_sources)
    }

    pub fn num_connections(&self, local_source: usize) -> usize {
        self.edge_offset(local_source + 1) - self.edge_offset(local_source)
    }

    pub fn sources(&self) -> &[usize] {
        &self.edges.sources
    }

    pub fn targets(&self) -> &[usize] {
        &self.edges.targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_consistent_sorts_and_dedups() {
        let mut g = Graph::new(4);
        for &(s, t) in &[(3, 1), (0, 2), (3, 1), (1, 0), (0, 1)] {
            g.queue_connection(s, t);
        }
        assert!(!g.consistent());
        g.make_consistent();
        let pairs: Vec<_> = g.sources().iter().copied().zip(g.targets().iter().copied()).collect();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 0), (3, 1)]);
        assert_eq!(
            (0..=4).map(|s| g.edge_offset(s)).collect::<Vec<_>>(),
            vec![0, 2, 3, 3, 4]
        );
        assert_eq!(g.num_connections(2), 0);
    }

    #[test]
    fn test_disconnection_applies_on_consistency() {
        let mut g = Graph::new(3);
        g.connect(0, 1);
        g.connect(1, 2);
        g.queue_disconnection(0, 1);
        assert_eq!(g.num_edges(), 2);
        g.make_consistent();
        assert_eq!(g.num_edges(), 1);
        assert_eq!((g.source(0), g.target(0)), (1, 2));
    }

    #[test]
    #[should_panic(expected = "not consistent")]
    fn test_offsets_require_consistency() {
        let mut g = Graph::new(2);
        g.queue_connection(0, 1);
        let _ = g.edge_offset(0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_target_bounds() {
        let mut g = Graph::with_shape(2, 3);
        g.queue_connection(1, 3);
    }

    #[test]
    fn test_empty_graph_offsets() {
        let mut g = Graph::new(3);
        g.make_consistent();
        assert_eq!(g.edge_offset(3), 0);
        g.empty();
        assert_eq!(g.num_sources(), 0);
        assert_eq!(g.edge_offset(0), 0);
    }
}
