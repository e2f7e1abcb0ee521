use super::level1::scale;
use super::{explicit_op, off_diagonal, panels, redistribute, require_mc_mr, through_transpose};
use crate::config::AlgorithmConfig;
use crate::dist::{DistMatrix, DistMut, DistRef, Distribution, redist};
use crate::error::Result;
use gridla_kernels::{Orientation, Scalar, Side, UnitOrNonUnit, UpperOrLower, cpu_gemm, cpu_trmm};
use tracing::debug_span;

/// Triangular matrix-matrix product.
///
/// Overwrites `B` (`[MC,MR]`) with `alpha * op(A) * B` (`Side::Left`) or
/// `alpha * B * op(A)` (`Side::Right`), reading only the `uplo` triangle
/// of `A`.
#[allow(clippy::too_many_arguments)]
pub fn trmm<T: Scalar>(
    side: Side,
    uplo: UpperOrLower,
    orient: Orientation,
    diag: UnitOrNonUnit,
    alpha: T,
    a: &DistRef<'_, T>,
    b: &mut DistMut<'_, T>,
    cfg: &AlgorithmConfig,
) -> Result<()> {
    require_mc_mr("trmm", "B", b.dist());
    let order = a.height();
    assert_eq!(order, a.width(), "trmm: A must be square, got {}x{}", order, a.width());
    let conforms = match side {
        Side::Left => b.height() == order,
        Side::Right => b.width() == order,
    };
    assert!(
        conforms,
        "trmm: {order}x{order} triangle does not conform with {}x{} on the {side:?}",
        b.height(),
        b.width()
    );
    let _span = debug_span!("trmm", ?side, ?uplo, ?orient, m = b.height(), n = b.width()).entered();

    scale(alpha, b);
    let nb = cfg.block_size;
    match side {
        Side::Left => multiply_left(uplo, orient, diag, a, b, nb),
        Side::Right => through_transpose(orient, b, |left_orient, bt| multiply_left(uplo, left_orient, diag, a, bt, nb)),
    }
}

fn multiply_left<T: Scalar>(
    uplo: UpperOrLower,
    orient: Orientation,
    diag: UnitOrNonUnit,
    a: &DistRef<'_, T>,
    b: &mut DistMut<'_, T>,
    nb: usize,
) -> Result<()> {
    if orient.is_normal() {
        return multiply_left_normal(uplo, diag, a, b, nb);
    }
    let op_a = explicit_op(a, orient, b.col_align())?;
    multiply_left_normal(uplo.flip(), diag, &op_a.as_ref(), b, nb)
}

/// `B := L B` walks the panels bottom-up (`U B` top-down), so the rows a
/// panel feeds into are updated before that panel is overwritten.
fn multiply_left_normal<T: Scalar>(
    uplo: UpperOrLower,
    diag: UnitOrNonUnit,
    a: &DistRef<'_, T>,
    b: &mut DistMut<'_, T>,
    nb: usize,
) -> Result<()> {
    let (m, n) = (b.height(), b.width());
    let blocks: Vec<(usize, usize)> = match uplo {
        UpperOrLower::Lower => panels(m, nb).rev().collect(),
        UpperOrLower::Upper => panels(m, nb).collect(),
    };
    for (k0, kb) in blocks {
        let row_align = b.row_align();
        let b1_star_mr = redistribute(&b.as_ref().view(k0, 0, kb, n), Distribution::STAR_MR, 0, row_align)?;

        let (r0, rn) = off_diagonal(uplo, k0, kb, m);
        if rn > 0 {
            let mut b2 = b.view_mut(r0, 0, rn, n);
            let a21 = redistribute(&a.view(r0, k0, rn, kb), Distribution::MC_STAR, b2.col_align(), 0)?;
            cpu_gemm(
                Orientation::Normal,
                Orientation::Normal,
                T::one(),
                &a21.local().as_ref(),
                &b1_star_mr.local().as_ref(),
                T::one(),
                &mut b2.local_mut(),
            );
        }

        let a11 = redistribute(&a.view(k0, k0, kb, kb), Distribution::STAR_STAR, 0, 0)?;
        let mut x1 = DistMatrix::redistributed(&b1_star_mr.as_ref(), Distribution::STAR_VR)?;
        cpu_trmm(
            Side::Left,
            uplo,
            Orientation::Normal,
            diag,
            T::one(),
            &a11.local().as_ref(),
            &mut x1.local_mut().as_mut(),
        );
        let x1 = redistribute(&x1.as_ref(), Distribution::STAR_MR, 0, row_align)?;
        redist::filter(&x1.as_ref(), &mut b.view_mut(k0, 0, kb, n));
    }
    Ok(())
}
