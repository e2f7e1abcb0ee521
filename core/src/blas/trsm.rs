use super::level1::scale;
use super::{explicit_op, off_diagonal, panels, redistribute, require_mc_mr, through_transpose};
use crate::config::AlgorithmConfig;
use crate::dist::{DistMatrix, DistMut, DistRef, Distribution, redist};
use crate::error::{Result, at_offset};
use gridla_kernels::{Orientation, Scalar, Side, UnitOrNonUnit, UpperOrLower, cpu_gemm, cpu_trsm};
use tracing::debug_span;

/// Triangular solve with many right-hand sides.
///
/// Overwrites `B` (`[MC,MR]`) with `X`, where `op(A) X = alpha B` for
/// `Side::Left` or `X op(A) = alpha B` for `Side::Right`. Only the `uplo`
/// triangle of `A` is read; `A` may have any distribution.
///
/// A zero on the diagonal of a non-unit `A` yields [`Error::Singular`]
/// on every process, with the global index of the first zero pivot met.
///
/// [`Error::Singular`]: crate::Error::Singular
#[allow(clippy::too_many_arguments)]
pub fn trsm<T: Scalar>(
    side: Side,
    uplo: UpperOrLower,
    orient: Orientation,
    diag: UnitOrNonUnit,
    alpha: T,
    a: &DistRef<'_, T>,
    b: &mut DistMut<'_, T>,
    cfg: &AlgorithmConfig,
) -> Result<()> {
    require_mc_mr("trsm", "B", b.dist());
    let order = a.height();
    assert_eq!(order, a.width(), "trsm: A must be square, got {}x{}", order, a.width());
    let conforms = match side {
        Side::Left => b.height() == order,
        Side::Right => b.width() == order,
    };
    assert!(
        conforms,
        "trsm: {order}x{order} triangle does not conform with {}x{} on the {side:?}",
        b.height(),
        b.width()
    );
    let _span = debug_span!("trsm", ?side, ?uplo, ?orient, m = b.height(), n = b.width()).entered();

    scale(alpha, b);
    let nb = cfg.block_size;
    match side {
        Side::Left => solve_left(uplo, orient, diag, a, b, nb),
        Side::Right => through_transpose(orient, b, |left_orient, bt| solve_left(uplo, left_orient, diag, a, bt, nb)),
    }
}

fn solve_left<T: Scalar>(
    uplo: UpperOrLower,
    orient: Orientation,
    diag: UnitOrNonUnit,
    a: &DistRef<'_, T>,
    b: &mut DistMut<'_, T>,
    nb: usize,
) -> Result<()> {
    if orient.is_normal() {
        return solve_left_normal(uplo, diag, a, b, nb);
    }
    let op_a = explicit_op(a, orient, b.col_align())?;
    solve_left_normal(uplo.flip(), diag, &op_a.as_ref(), b, nb)
}

/// Forward substitution (`Lower`) or back substitution (`Upper`) by panels.
///
/// Each diagonal block is replicated as `[STAR,STAR]` and the matching rows
/// of `B` are spread over every process as `[STAR,VR]` for the local solve.
/// The solved rows then come back as `[STAR,MR]`, which both refreshes `B`
/// and feeds the rank-`nb` update of the rows still to be solved.
fn solve_left_normal<T: Scalar>(
    uplo: UpperOrLower,
    diag: UnitOrNonUnit,
    a: &DistRef<'_, T>,
    b: &mut DistMut<'_, T>,
    nb: usize,
) -> Result<()> {
    let (m, n) = (b.height(), b.width());
    let blocks: Vec<(usize, usize)> = match uplo {
        UpperOrLower::Lower => panels(m, nb).collect(),
        UpperOrLower::Upper => panels(m, nb).rev().collect(),
    };
    for (k0, kb) in blocks {
        let a11 = redistribute(&a.view(k0, k0, kb, kb), Distribution::STAR_STAR, 0, 0)?;
        let mut b1 = b.view_mut(k0, 0, kb, n);
        let mut x1 = DistMatrix::redistributed(&b1.as_ref(), Distribution::STAR_VR)?;
        at_offset(
            k0,
            cpu_trsm(
                Side::Left,
                uplo,
                Orientation::Normal,
                diag,
                T::one(),
                &a11.local().as_ref(),
                &mut x1.local_mut().as_mut(),
            ),
        )?;
        let x1 = redistribute(&x1.as_ref(), Distribution::STAR_MR, 0, b1.row_align())?;
        redist::filter(&x1.as_ref(), &mut b1);

        let (r0, rn) = off_diagonal(uplo, k0, kb, m);
        if rn == 0 {
            continue;
        }
        let mut b2 = b.view_mut(r0, 0, rn, n);
        let a21 = redistribute(&a.view(r0, k0, rn, kb), Distribution::MC_STAR, b2.col_align(), 0)?;
        cpu_gemm(
            Orientation::Normal,
            Orientation::Normal,
            -T::one(),
            &a21.local().as_ref(),
            &x1.local().as_ref(),
            T::one(),
            &mut b2.local_mut(),
        );
    }
    Ok(())
}
