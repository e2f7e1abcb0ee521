mod common;

use common::{on_grid, on_grid_ordered, random_matrix};
use gridla::dist::{copy, transpose_copy};
use gridla::{Dist, DistMatrix, Distribution, Grid, GridOrder, Matrix};

/// The highest root a `dist` matrix may be anchored at on `grid`.
fn last_root(grid: &Grid, dist: Distribution) -> usize {
    if dist.col == Dist::Circ {
        grid.size() - 1
    } else if dist.has_root() {
        grid.gcd() - 1
    } else {
        0
    }
}

/// Entry-wise bit patterns, so that `-0.0` and `0.0` are told apart.
fn bits(a: &Matrix<f64>) -> Vec<u64> {
    a.as_ref().to_vec().iter().map(|v| v.to_bits()).collect()
}

/// A random matrix with a few signed zeros mixed in.
fn with_signed_zeros(m: usize, n: usize, seed: u64) -> Matrix<f64> {
    let mut a = random_matrix(m, n, seed);
    for k in (0..m.min(n)).step_by(2) {
        a.set(k, k, -0.0);
    }
    a
}

/// Redistributes between every ordered pair of supported distributions and
/// checks that the global contents survive unchanged on every process.
///
/// Sources and destinations both use non-trivial alignments and, where the
/// layout has one, the last admissible root.
fn all_pairs(height: usize, width: usize, order: GridOrder, m: usize, n: usize) {
    on_grid_ordered(height, width, order, |grid| {
        let global = with_signed_zeros(m, n, 7);
        let replicated = DistMatrix::from_global(&grid, Distribution::STAR_STAR, &global);
        for src_dist in Distribution::ALL {
            let mut src = DistMatrix::aligned(
                &grid,
                src_dist,
                m,
                n,
                (src_dist.col.stride(&grid) - 1) % src_dist.col.stride(&grid),
                2 % src_dist.row.stride(&grid),
                last_root(&grid, src_dist),
            );
            copy(&replicated.as_ref(), &mut src.as_mut()).unwrap();
            for dst_dist in Distribution::ALL {
                let ca = 1 % dst_dist.col.stride(&grid);
                let ra = 1 % dst_dist.row.stride(&grid);
                let mut dst = DistMatrix::aligned(&grid, dst_dist, m, n, ca, ra, last_root(&grid, dst_dist) / 2);
                copy(&src.as_ref(), &mut dst.as_mut()).unwrap();
                let back = dst.to_global().unwrap();
                assert_eq!(
                    bits(&back),
                    bits(&global),
                    "{src_dist} -> {dst_dist} on {height}x{width} {order:?} grid, {m}x{n} matrix"
                );
            }
        }
    });
}

#[test]
fn test_all_pairs_square_grid() {
    all_pairs(2, 2, GridOrder::ColumnMajor, 7, 5);
}

#[test]
fn test_all_pairs_rectangular_grid() {
    all_pairs(3, 2, GridOrder::ColumnMajor, 5, 8);
}

#[test]
fn test_all_pairs_row_major_grid() {
    all_pairs(2, 4, GridOrder::RowMajor, 6, 9);
}

#[test]
fn test_all_pairs_empty_matrix() {
    all_pairs(2, 2, GridOrder::ColumnMajor, 0, 0);
    all_pairs(3, 2, GridOrder::ColumnMajor, 0, 3);
}

#[test]
fn test_all_pairs_with_rowless_processes() {
    // Fewer rows than grid rows (and than VC ranks): several processes hold
    // 0 x w local blocks with w > 1.
    all_pairs(3, 2, GridOrder::ColumnMajor, 2, 5);
    all_pairs(3, 2, GridOrder::ColumnMajor, 1, 4);
}

#[test]
fn test_round_trip_is_bitwise_exact() {
    on_grid(2, 3, |grid| {
        let global = with_signed_zeros(8, 7, 17);
        for d1 in Distribution::ALL {
            let a = DistMatrix::from_global(&grid, d1, &global);
            for d2 in Distribution::ALL {
                let there = DistMatrix::redistributed(&a.as_ref(), d2).unwrap();
                let mut back = DistMatrix::aligned(&grid, d1, 8, 7, a.col_align(), a.row_align(), a.root());
                copy(&there.as_ref(), &mut back.as_mut()).unwrap();
                assert_eq!(
                    bits(back.local()),
                    bits(a.local()),
                    "{d1} -> {d2} -> {d1} changed the local block"
                );
            }
        }
    });
}

#[test]
fn test_redistributed_keeps_alignment_where_related() {
    on_grid(2, 3, |grid| {
        let global = random_matrix(6, 6, 11);
        let mut a = DistMatrix::aligned(&grid, Distribution::MC_MR, 6, 6, 1, 2, 0);
        copy(&DistMatrix::from_global(&grid, Distribution::STAR_STAR, &global).as_ref(), &mut a.as_mut()).unwrap();
        let b = DistMatrix::redistributed(&a.as_ref(), Distribution::MC_STAR).unwrap();
        assert_eq!(b.col_align(), 1);
        assert_eq!(b.to_global().unwrap(), global);
        let c = DistMatrix::redistributed(&a.as_ref(), Distribution::STAR_MR).unwrap();
        assert_eq!(c.row_align(), 2);
        assert_eq!(c.to_global().unwrap(), global);
    });
}

#[test]
fn test_views_redistribute_like_matrices() {
    on_grid(2, 2, |grid| {
        let global = random_matrix(9, 7, 3);
        let a = DistMatrix::from_global(&grid, Distribution::MC_MR, &global);
        let view = a.view(3, 2, 4, 5);
        let replicated = DistMatrix::redistributed(&view, Distribution::STAR_STAR).unwrap();
        let want = Matrix::from_fn(4, 5, |i, j| global.get(i + 3, j + 2));
        assert_eq!(replicated.local(), &want);
    });
}

#[test]
fn test_transpose_copy_and_adjoint() {
    on_grid(3, 2, |grid| {
        let global = random_matrix(5, 4, 5);
        let a = DistMatrix::from_global(&grid, Distribution::VC_STAR, &global);
        let mut t = DistMatrix::zeros(&grid, Distribution::MC_MR, 4, 5);
        transpose_copy(&a.as_ref(), &mut t.as_mut(), false).unwrap();
        assert_eq!(t.to_global().unwrap(), global.transpose());
    });
}

#[test]
fn test_complex_adjoint_conjugates() {
    use num_complex::Complex64;
    on_grid(2, 2, |grid| {
        let global = Matrix::from_fn(3, 4, |i, j| Complex64::new(i as f64, j as f64 + 1.0));
        let a = DistMatrix::from_global(&grid, Distribution::MC_MR, &global);
        let mut h = DistMatrix::zeros(&grid, Distribution::STAR_VR, 4, 3);
        transpose_copy(&a.as_ref(), &mut h.as_mut(), true).unwrap();
        assert_eq!(h.to_global().unwrap(), global.adjoint());
    });
}

#[test]
fn test_entry_access_routes_to_owners() {
    on_grid(2, 3, |grid| {
        for dist in [Distribution::MC_MR, Distribution::VR_STAR, Distribution::STAR_STAR, Distribution::CIRC_CIRC] {
            let mut a = DistMatrix::<f64>::zeros(&grid, dist, 5, 4);
            a.set(3, 2, 7.5);
            a.update(3, 2, 0.5);
            a.set(0, 0, -1.0);
            assert_eq!(a.get(3, 2).unwrap(), 8.0, "{dist}");
            assert_eq!(a.get(0, 0).unwrap(), -1.0, "{dist}");
            assert_eq!(a.get(4, 3).unwrap(), 0.0, "{dist}");
        }
    });
}

#[test]
fn test_submatrix_and_diagonal() {
    on_grid(2, 2, |grid| {
        let global = random_matrix(5, 5, 13);
        let mut a = DistMatrix::from_global(&grid, Distribution::MC_MR, &global);
        let sub = a.get_submatrix(&[4, 0], &[1, 3]).unwrap();
        assert_eq!(sub.get(0, 1), global.get(4, 3));
        assert_eq!(sub.get(1, 0), global.get(0, 1));

        let d = a.get_diagonal(-1).unwrap();
        assert_eq!(d.height(), 4);
        for k in 0..4 {
            assert_eq!(d.get(k, 0), global.get(k + 1, k));
        }

        let ones = Matrix::from_fn(5, 1, |_, _| 1.0);
        a.update_diagonal(2.0, &ones, 0);
        for k in 0..5 {
            assert_eq!(a.get(k, k).unwrap(), global.get(k, k) + 2.0);
        }
    });
}

#[test]
fn test_reads_keep_signed_zeros() {
    on_grid(2, 3, |grid| {
        let global = with_signed_zeros(6, 6, 23);
        for dist in [Distribution::MC_MR, Distribution::STAR_VC, Distribution::MD_STAR, Distribution::CIRC_CIRC] {
            let a = DistMatrix::from_global(&grid, dist, &global);
            assert_eq!(bits(&a.to_global().unwrap()), bits(&global), "{dist}");

            let d = a.get_diagonal(0).unwrap();
            for k in 0..6 {
                assert_eq!(d.get(k, 0).to_bits(), global.get(k, k).to_bits(), "{dist} diagonal {k}");
            }
            let sub = a.get_submatrix(&[2, 5, 2], &[2, 0]).unwrap();
            assert_eq!(sub.get(0, 0).to_bits(), (-0.0f64).to_bits(), "{dist}");
            assert_eq!(sub.get(2, 0).to_bits(), (-0.0f64).to_bits(), "{dist}");
            assert_eq!(sub.get(1, 1), global.get(5, 0), "{dist}");
        }
    });
}
