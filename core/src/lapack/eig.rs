use crate::dist::{DistMatrix, DistRef, Distribution};
use crate::error::Result;
use crate::matrix::Matrix;
use gridla_kernels::{RealScalar, UpperOrLower, cpu_jacobi_eig};
use serde::{Deserialize, Serialize};
use tracing::debug_span;

/// Order in which eigenpairs are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Sort {
    #[default]
    Ascending,
    Descending,
    Unsorted,
}

/// Reorders `w` and the columns of `z` together.
pub fn sort_eigenpairs<R: RealScalar>(w: &mut Vec<R>, z: &mut Matrix<R>, sort: Sort) {
    assert_eq!(w.len(), z.width(), "sort_eigenpairs: {} values for {} vectors", w.len(), z.width());
    let mut order: Vec<usize> = (0..w.len()).collect();
    match sort {
        Sort::Unsorted => return,
        Sort::Ascending => order.sort_by(|&a, &b| w[a].partial_cmp(&w[b]).unwrap_or(std::cmp::Ordering::Equal)),
        Sort::Descending => order.sort_by(|&a, &b| w[b].partial_cmp(&w[a]).unwrap_or(std::cmp::Ordering::Equal)),
    }
    let sorted = Matrix::from_fn(z.height(), z.width(), |i, j| z.get(i, order[j]));
    *w = order.iter().map(|&k| w[k]).collect();
    *z = sorted;
}

/// Eigen-decomposition `A = Z diag(w) Z^T` of a real symmetric matrix of
/// which only the `uplo` triangle is read.
///
/// Every process runs the same cyclic Jacobi sweeps on a `[STAR,STAR]`
/// copy, so `w` comes back replicated; `Z` is returned as `[MC,MR]`.
pub fn symmetric_eig<R: RealScalar>(
    uplo: UpperOrLower,
    a: &DistRef<'_, R>,
    sort: Sort,
) -> Result<(Vec<R>, DistMatrix<R>)> {
    let n = a.height();
    assert_eq!(n, a.width(), "symmetric_eig: A must be square, got {}x{}", n, a.width());
    let _span = debug_span!("symmetric_eig", n, ?sort).entered();

    let full = DistMatrix::redistributed(a, Distribution::STAR_STAR)?;
    let stored = full.local();
    let mut dense = Matrix::from_fn(n, n, |i, j| {
        if uplo.contains(i, j) {
            stored.get(i, j)
        } else {
            stored.get(j, i)
        }
    });
    let mut z = Matrix::zeros(n, n);
    let mut w = cpu_jacobi_eig(&mut dense.as_mut(), &mut z.as_mut())?;
    sort_eigenpairs(&mut w, &mut z, sort);

    let z_star = DistMatrix::from_global(a.grid(), Distribution::STAR_STAR, &z);
    let z = DistMatrix::redistributed(&z_star.as_ref(), Distribution::MC_MR)?;
    Ok((w, z))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_eigenpairs_moves_columns() {
        let mut w = vec![3.0f64, 1.0, 2.0];
        let mut z = Matrix::from_fn(2, 3, |i, j| (10 * j + i) as f64);
        sort_eigenpairs(&mut w, &mut z, Sort::Ascending);
        assert_eq!(w, vec![1.0, 2.0, 3.0]);
        assert_eq!(z.get(0, 0), 10.0);
        assert_eq!(z.get(1, 2), 1.0);

        sort_eigenpairs(&mut w, &mut z, Sort::Descending);
        assert_eq!(w, vec![3.0, 2.0, 1.0]);
        assert_eq!(z.get(0, 0), 0.0);

        let before = z.clone();
        sort_eigenpairs(&mut w, &mut z, Sort::Unsorted);
        assert_eq!(z, before);
    }
}
