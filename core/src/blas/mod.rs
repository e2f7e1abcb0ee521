//! # Distributed BLAS
//!
//! Level-1 helpers and the blocked level-3 algorithms.
//!
//! ## 🧩 Pattern
//!
//! Every level-3 routine walks the inner (or triangular) dimension in
//! panels of [`AlgorithmConfig::block_size`](crate::AlgorithmConfig)
//! and, per panel:
//!
//! 1.  redistributes the panel into the layouts where the update is local
//!     (`[MC,STAR]` rows and `[STAR,MR]` columns for an `[MC,MR]` target,
//!     `[STAR,STAR]` for a small diagonal block, `[STAR,VR]` for work that
//!     is split over every process);
//! 2.  runs a `gridla-kernels` routine on the local blocks;
//! 3.  writes the panel back with a filter or a sum-scatter.
//!
//! The operands that are updated in place must be `[MC,MR]`; read-only
//! operands may have any distribution and are routed as needed.

mod gemm;
mod hemm;
mod herk;
mod level1;
mod swap;
mod trmm;
mod trsm;

pub use gemm::gemm;
pub use hemm::{hemm, symm};
pub use herk::{her2k, herk, syr2k, syrk};
pub use level1::{
    adjoint, axpy, make_hermitian, make_symmetric, make_trapezoidal, make_triangular, scale, set_identity,
    set_to_zero, transpose,
};
pub use swap::{column_swap, row_swap, swap, symmetric_swap};
pub use trmm::trmm;
pub use trsm::trsm;

use crate::dist::{DistMatrix, DistMut, DistRef, Distribution, copy, transpose_copy};
use crate::error::Result;
use gridla_kernels::{Orientation, Scalar, UpperOrLower};

/// Panels `(start, size)` covering `0..n` in steps of `nb`.
pub(crate) fn panels(n: usize, nb: usize) -> impl DoubleEndedIterator<Item = (usize, usize)> {
    assert!(nb > 0, "block size must be positive");
    (0..n.div_ceil(nb)).map(move |k| {
        let start = k * nb;
        (start, nb.min(n - start))
    })
}

/// `src` redistributed into `dist` with explicit alignments.
pub(crate) fn redistribute<T: Scalar>(
    src: &DistRef<'_, T>,
    dist: Distribution,
    col_align: usize,
    row_align: usize,
) -> Result<DistMatrix<T>> {
    let mut out = DistMatrix::aligned(src.grid(), dist, src.height(), src.width(), col_align, row_align, 0);
    copy(src, &mut out.as_mut())?;
    Ok(out)
}

/// `src^T` (or `src^H`) redistributed into `dist` with explicit alignments.
pub(crate) fn redistribute_transposed<T: Scalar>(
    src: &DistRef<'_, T>,
    dist: Distribution,
    col_align: usize,
    row_align: usize,
    conjugate: bool,
) -> Result<DistMatrix<T>> {
    let mut out = DistMatrix::aligned(src.grid(), dist, src.width(), src.height(), col_align, row_align, 0);
    transpose_copy(src, &mut out.as_mut(), conjugate)?;
    Ok(out)
}

/// Rows `(start, len)` of a triangle's off-diagonal panel beside diagonal
/// block `k0..k0 + kb` of an order-`m` matrix: below it for `Lower`, above
/// it for `Upper`.
pub(crate) fn off_diagonal(uplo: UpperOrLower, k0: usize, kb: usize, m: usize) -> (usize, usize) {
    match uplo {
        UpperOrLower::Lower => (k0 + kb, m - k0 - kb),
        UpperOrLower::Upper => (0, k0),
    }
}

/// Solves a right-sided triangular problem on `B` through its left-sided
/// twin on `B^T` (or `B^H`): `X op(A) = B` becomes `op(A)^T X^T = B^T`.
///
/// `left` receives the orientation to apply to `A` from the left and the
/// transposed right-hand side.
pub(crate) fn through_transpose<T: Scalar>(
    orient: Orientation,
    b: &mut DistMut<'_, T>,
    left: impl FnOnce(Orientation, &mut DistMut<'_, T>) -> Result<()>,
) -> Result<()> {
    let conjugate = orient.conjugates();
    let mut bt = redistribute_transposed(&b.as_ref(), Distribution::MC_MR, 0, 0, conjugate)?;
    let left_orient = match orient {
        Orientation::Normal => Orientation::Transpose,
        Orientation::Transpose | Orientation::Adjoint => Orientation::Normal,
    };
    left(left_orient, &mut bt.as_mut())?;
    transpose_copy(&bt.as_ref(), b, conjugate)
}

/// `op(A)` as an `[MC,MR]` matrix with column alignment `col_align`.
pub(crate) fn explicit_op<T: Scalar>(
    a: &DistRef<'_, T>,
    orient: Orientation,
    col_align: usize,
) -> Result<DistMatrix<T>> {
    if orient.is_normal() {
        redistribute(a, Distribution::MC_MR, col_align, 0)
    } else {
        redistribute_transposed(a, Distribution::MC_MR, col_align, 0, orient.conjugates())
    }
}

/// Panics unless `dist` is `[MC,MR]`.
pub(crate) fn require_mc_mr(op: &str, what: &str, dist: Distribution) {
    assert!(
        dist == Distribution::MC_MR,
        "{op}: {what} must be distributed as [MC,MR], got {dist}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panels_cover_range() {
        let p: Vec<_> = panels(10, 4).collect();
        assert_eq!(p, vec![(0, 4), (4, 4), (8, 2)]);
        assert_eq!(panels(0, 4).count(), 0);
        let back: Vec<_> = panels(5, 2).rev().collect();
        assert_eq!(back, vec![(4, 1), (2, 2), (0, 2)]);
    }

    #[test]
    fn test_off_diagonal_panels() {
        assert_eq!(off_diagonal(UpperOrLower::Lower, 2, 2, 7), (4, 3));
        assert_eq!(off_diagonal(UpperOrLower::Upper, 2, 2, 7), (0, 2));
        assert_eq!(off_diagonal(UpperOrLower::Lower, 5, 2, 7), (7, 0));
    }
}
