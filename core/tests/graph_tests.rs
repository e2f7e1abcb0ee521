mod common;

use common::init_test_subscriber;
use gridla::distributed::spmd;
use gridla::graph::{DistGraph, Graph};

#[test]
fn test_make_consistent_is_idempotent() {
    let _guard = init_test_subscriber();
    let mut g = Graph::with_shape(5, 3);
    g.reserve(8);
    assert!(g.capacity() >= 8);
    for &(s, t) in &[(4, 2), (1, 0), (4, 2), (0, 0), (1, 0), (3, 1)] {
        g.queue_connection(s, t);
    }
    g.make_consistent();
    let once = g.clone();
    g.make_consistent();
    assert_eq!(g, once);
    assert_eq!(g.num_edges(), 4);
    let offsets: Vec<usize> = (0..=5).map(|s| g.edge_offset(s)).collect();
    assert_eq!(offsets, vec![0, 1, 2, 2, 3, 4]);
    for s in 0..5 {
        for e in g.edge_offset(s)..g.edge_offset(s + 1) {
            assert_eq!(g.source(e), s);
        }
    }
}

#[test]
fn test_queued_disconnection_beats_later_connection() {
    let mut g = Graph::new(3);
    g.queue_disconnection(0, 1);
    g.queue_connection(0, 1);
    g.queue_connection(0, 2);
    g.make_consistent();
    assert_eq!(g.num_connections(0), 1);
    assert_eq!(g.target(0), 2);
}

#[test]
fn test_resize_drops_edges() {
    let mut g = Graph::new(2);
    g.connect(0, 1);
    g.resize(4, 4);
    assert_eq!(g.num_edges(), 0);
    assert_eq!(g.num_sources(), 4);
    assert!(g.consistent());
}

#[test]
fn test_dist_graph_partition() {
    let parts = spmd(3, |comm| {
        let g = DistGraph::with_vertices(10, &comm);
        (g.blocksize(), g.first_local_source(), g.num_local_sources())
    });
    assert_eq!(parts, vec![(3, 0, 3), (3, 3, 3), (3, 6, 4)]);
}

#[test]
fn test_dist_graph_more_ranks_than_sources() {
    let parts = spmd(4, |comm| {
        let g = DistGraph::with_vertices(2, &comm);
        (g.first_local_source(), g.num_local_sources())
    });
    assert_eq!(parts, vec![(0, 0), (0, 0), (0, 0), (0, 2)]);
}

#[test]
fn test_dist_graph_local_edges() {
    let results = spmd(2, |comm| {
        let mut g = DistGraph::with_vertices(5, &comm);
        // Every rank walks the same global edge list and keeps its own.
        for &(s, t) in &[(4, 0), (0, 3), (2, 2), (0, 3), (1, 4), (4, 1)] {
            if g.is_local_source(s) {
                g.queue_connection(s, t);
            }
        }
        assert!(!g.consistent());
        g.make_consistent();
        let edges: Vec<(usize, usize)> = (0..g.num_local_edges()).map(|e| (g.source(e), g.target(e))).collect();
        let counts: Vec<usize> = (0..g.num_local_sources()).map(|s| g.num_connections(s)).collect();
        (edges, counts)
    });
    assert_eq!(results[0], (vec![(0, 3), (1, 4)], vec![1, 1]));
    assert_eq!(results[1], (vec![(2, 2), (4, 0), (4, 1)], vec![1, 0, 2]));
}

#[test]
fn test_dist_graph_local_index_api() {
    spmd(2, |comm| {
        let mut g = DistGraph::with_shape(4, 6, &comm);
        g.connect_local(1, 5);
        g.connect_local(0, 2);
        assert_eq!(g.source(0), g.first_local_source());
        assert_eq!(g.source(1), g.first_local_source() + 1);
        g.disconnect_local(1, 5);
        assert_eq!(g.num_local_edges(), 1);
        assert_eq!(g.edge_offset(g.num_local_sources()), 1);
    });
}

#[test]
fn test_dist_graph_from_graph_and_set_comm() {
    let results = spmd(3, |comm| {
        let mut seq = Graph::new(7);
        for s in 0..7 {
            seq.queue_connection(s, (s + 1) % 7);
            seq.queue_connection(s, (s + 3) % 7);
        }
        seq.make_consistent();
        let mut g = DistGraph::from_graph(&seq, &comm);
        assert!(g.consistent());
        let local = g.num_local_edges();

        // Moving to the single-process communicator makes this rank own everything.
        let single = comm.subset(vec![comm.world_rank(comm.rank())], 99);
        g.set_comm(&single);
        (local, g.num_local_sources(), g.num_local_edges())
    });
    assert_eq!(results, vec![(4, 7, 0), (4, 7, 0), (6, 7, 0)]);
}

#[test]
#[should_panic(expected = "is not local")]
fn test_queue_for_remote_source_panics() {
    spmd(2, |comm| {
        let mut g = DistGraph::with_vertices(4, &comm);
        // Source 3 lives on rank 1.
        g.queue_connection(3, 0);
    });
}
