mod common;

use common::{init_test_subscriber, on_grid};
use gridla::distributed::spmd;
use gridla::{Error, Grid, GridOrder};

#[test]
fn test_point_to_point_ring() {
    let _guard = init_test_subscriber();
    let got = spmd(4, |comm| {
        let (me, p) = (comm.rank(), comm.size());
        let right = (me + 1) % p;
        let left = (me + p - 1) % p;
        comm.send_recv(vec![me as u32; 3], right, left).unwrap()
    });
    for (me, v) in got.into_iter().enumerate() {
        assert_eq!(v, vec![((me + 3) % 4) as u32; 3]);
    }
}

#[test]
fn test_broadcast_and_gather() {
    let got = spmd(3, |comm| {
        let b = comm.broadcast(vec![comm.rank() * 10], 2).unwrap();
        let g = comm.gather(vec![comm.rank(); comm.rank()], 0).unwrap();
        (b, g)
    });
    for (rank, (b, g)) in got.into_iter().enumerate() {
        assert_eq!(b, vec![20]);
        if rank == 0 {
            assert_eq!(g, Some(vec![vec![], vec![1], vec![2, 2]]));
        } else {
            assert_eq!(g, None);
        }
    }
}

#[test]
fn test_all_to_all_transposes_buffers() {
    let got = spmd(3, |comm| {
        let me = comm.rank();
        let sends = (0..3).map(|q| vec![10 * me + q]).collect();
        comm.all_to_all(sends).unwrap()
    });
    for (me, recv) in got.into_iter().enumerate() {
        assert_eq!(recv, (0..3).map(|q| vec![10 * q + me]).collect::<Vec<_>>());
    }
}

#[test]
fn test_all_reduce_is_identical_everywhere() {
    // Lengths that do not split evenly into ring chunks, including empty.
    for len in [0usize, 1, 5, 7] {
        let got = spmd(4, move |comm| {
            let data: Vec<f64> = (0..len).map(|i| (comm.rank() + 1) as f64 * (i as f64 + 0.1)).collect();
            comm.all_reduce_sum(data).unwrap()
        });
        let want: Vec<f64> = (0..len).map(|i| 10.0 * (i as f64 + 0.1)).collect();
        for v in &got {
            assert_eq!(v.len(), len);
            for (a, b) in v.iter().zip(&want) {
                assert!((a - b).abs() < 1e-12);
            }
            assert_eq!(v, &got[0]);
        }
    }
}

#[test]
fn test_all_reduce_max_and_reduce_scatter() {
    let got = spmd(3, |comm| {
        let max = comm.all_reduce_max(vec![comm.rank() as i64, -(comm.rank() as i64)]).unwrap();
        let contributions = (0..3).map(|q| vec![q as i64 + comm.rank() as i64]).collect();
        let piece = comm.reduce_scatter_sum(contributions).unwrap();
        comm.barrier().unwrap();
        (max, piece)
    });
    for (me, (max, piece)) in got.into_iter().enumerate() {
        assert_eq!(max, vec![2, 0]);
        assert_eq!(piece, vec![3 * me as i64 + 3]);
    }
}

#[test]
fn test_mismatched_element_type_is_reported() {
    let got = spmd(2, |comm| {
        if comm.rank() == 0 {
            comm.send(1, vec![1u8]).unwrap();
            None
        } else {
            Some(comm.recv::<f64>(0))
        }
    });
    match &got[1] {
        Some(Err(Error::Comm(_))) => {}
        other => panic!("expected a communication error, got {other:?}"),
    }
}

#[test]
fn test_invalid_grid_shape() {
    let got = spmd(6, |comm| Grid::with_shape(&comm, 4, 2, GridOrder::ColumnMajor).err());
    assert!(got.iter().all(|e| matches!(e, Some(Error::InvalidGrid { height: 4, width: 2, size: 6 }))));
}

#[test]
fn test_default_grid_is_near_square() {
    let shapes = spmd(6, |comm| {
        let grid = Grid::new(&comm).unwrap();
        (grid.height(), grid.width())
    });
    assert!(shapes.iter().all(|&s| s == (2, 3)));
}

#[test]
fn test_grid_coordinates_and_teams() {
    let infos = on_grid(2, 3, |grid| {
        let vc = grid.vc_rank();
        let vr = grid.vr_rank();
        assert_eq!(grid.coords_of_vc(vc), (grid.row(), grid.col()));
        assert_eq!(grid.coords_of_vr(vr), (grid.row(), grid.col()));
        assert_eq!(grid.mc_comm().rank(), grid.row());
        assert_eq!(grid.mr_comm().rank(), grid.col());
        assert_eq!(grid.mc_comm().size(), 2);
        assert_eq!(grid.mr_comm().size(), 3);
        assert_eq!(grid.vc_comm().rank(), vc);
        assert_eq!(grid.vr_comm().rank(), vr);
        assert_eq!(grid.md_comm().size(), grid.lcm());
        assert_eq!(grid.md_comm().rank(), grid.diag_path_rank());

        // Summing ranks within a team only sees that team.
        let row_sum = grid.mr_comm().all_reduce_sum(vec![vc]).unwrap()[0];
        let col_sum = grid.mc_comm().all_reduce_sum(vec![vc]).unwrap()[0];
        (grid.row(), grid.col(), row_sum, col_sum)
    });
    for (row, col, row_sum, col_sum) in infos {
        // VC ranks of row `row` are row, row + 2, row + 4.
        assert_eq!(row_sum, 3 * row + 6);
        // VC ranks of column `col` are 2col, 2col + 1.
        assert_eq!(col_sum, 4 * col + 1);
    }
}

#[test]
fn test_row_major_order() {
    let coords = spmd(4, |comm| {
        let grid = Grid::with_shape(&comm, 2, 2, GridOrder::RowMajor).unwrap();
        (comm.rank(), grid.row(), grid.col())
    });
    for (rank, row, col) in coords {
        assert_eq!((row, col), (rank / 2, rank % 2));
    }
}
