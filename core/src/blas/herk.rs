use super::{panels, redistribute, require_mc_mr};
use crate::config::AlgorithmConfig;
use crate::dist::{DistMut, DistRef, Distribution};
use crate::error::Result;
use gridla_kernels::{IndexMap, Orientation, Scalar, UpperOrLower, cpu_trrk};
use tracing::debug_span;

/// One `alpha * op(X) * op(Y)^H` (or `^T`) term of a rank-k update.
struct Term<'r, 'a, T> {
    alpha: T,
    x: &'r DistRef<'a, T>,
    y: &'r DistRef<'a, T>,
}

fn outer_dim<T: Scalar>(a: &DistRef<'_, T>, orient: Orientation) -> (usize, usize) {
    if orient.is_normal() {
        (a.height(), a.width())
    } else {
        (a.width(), a.height())
    }
}

/// Scales the `uplo` triangle of `C` by `beta`, leaving the other one alone.
fn scale_triangle<T: Scalar>(uplo: UpperOrLower, beta: T, c: &mut DistMut<'_, T>) {
    if beta == T::one() {
        return;
    }
    let meta = c.meta().clone();
    c.local_mut().for_each_mut(|i, j, v| {
        if uplo.contains(meta.global_row(i), meta.global_col(j)) {
            *v = if beta == T::zero() { T::zero() } else { beta * *v };
        }
    });
}

/// Shared driver for the rank-k and rank-2k updates.
///
/// For `orient == Normal` the panels are columns of `X` and `Y` gathered as
/// `[MC,STAR]` and `[MR,STAR]`; otherwise they are rows gathered as
/// `[STAR,MC]` and `[STAR,MR]`. Either way each process then owns the
/// pieces of `op(X)` and `op(Y)` that meet at its block of `C`, and a local
/// triangular update finishes the panel.
#[allow(clippy::too_many_arguments)]
fn rank_update<T: Scalar>(
    op: &'static str,
    uplo: UpperOrLower,
    orient: Orientation,
    conjugate: bool,
    terms: &[Term<'_, '_, T>],
    beta: T,
    c: &mut DistMut<'_, T>,
    cfg: &AlgorithmConfig,
) -> Result<()> {
    require_mc_mr(op, "C", c.dist());
    let n = c.height();
    assert_eq!(n, c.width(), "{op}: C must be square, got {}x{}", n, c.width());
    let (_, k) = outer_dim(terms[0].x, orient);
    for t in terms {
        for a in [t.x, t.y] {
            assert_eq!(
                outer_dim(a, orient),
                (n, k),
                "{op}: operand is {}x{}, expected op(A) of {n}x{k}",
                a.height(),
                a.width()
            );
        }
    }
    let _span = debug_span!("rank_update", op, ?uplo, ?orient, n, k).entered();

    scale_triangle(uplo, beta, c);
    let second = if conjugate {
        Orientation::Adjoint
    } else {
        Orientation::Transpose
    };
    let (col_align, row_align) = (c.col_align(), c.row_align());
    let rows = IndexMap::new(c.col_shift(), c.col_stride());
    let cols = IndexMap::new(c.row_shift(), c.row_stride());

    for (k0, kb) in panels(k, cfg.block_size) {
        for t in terms {
            let (x1, y1, orient_x, orient_y) = if orient.is_normal() {
                let x1 = redistribute(&t.x.view(0, k0, n, kb), Distribution::MC_STAR, col_align, 0)?;
                let y1 = redistribute(&t.y.view(0, k0, n, kb), Distribution::MR_STAR, row_align, 0)?;
                (x1, y1, Orientation::Normal, second)
            } else {
                let x1 = redistribute(&t.x.view(k0, 0, kb, n), Distribution::STAR_MC, 0, col_align)?;
                let y1 = redistribute(&t.y.view(k0, 0, kb, n), Distribution::STAR_MR, 0, row_align)?;
                (x1, y1, second, Orientation::Normal)
            };
            cpu_trrk(
                uplo,
                orient_x,
                orient_y,
                t.alpha,
                &x1.local().as_ref(),
                &y1.local().as_ref(),
                T::one(),
                &mut c.local_mut(),
                rows,
                cols,
            );
        }
    }
    Ok(())
}

/// Hermitian rank-k update of one triangle of `C` (`[MC,MR]`):
/// `C := alpha * A * A^H + beta * C` (`Normal`) or
/// `C := alpha * A^H * A + beta * C` (`Adjoint`).
///
/// `alpha` and `beta` should be real for the result to stay Hermitian.
pub fn herk<T: Scalar>(
    uplo: UpperOrLower,
    orient: Orientation,
    alpha: T,
    a: &DistRef<'_, T>,
    beta: T,
    c: &mut DistMut<'_, T>,
    cfg: &AlgorithmConfig,
) -> Result<()> {
    let terms = [Term { alpha, x: a, y: a }];
    rank_update("herk", uplo, orient, true, &terms, beta, c, cfg)
}

/// Symmetric rank-k update: `C := alpha * A * A^T + beta * C` (`Normal`) or
/// `C := alpha * A^T * A + beta * C` (`Transpose`).
pub fn syrk<T: Scalar>(
    uplo: UpperOrLower,
    orient: Orientation,
    alpha: T,
    a: &DistRef<'_, T>,
    beta: T,
    c: &mut DistMut<'_, T>,
    cfg: &AlgorithmConfig,
) -> Result<()> {
    let terms = [Term { alpha, x: a, y: a }];
    rank_update("syrk", uplo, orient, false, &terms, beta, c, cfg)
}

/// `C := alpha * A * B^H + conj(alpha) * B * A^H + beta * C` (`Normal`), or
/// the same with `A^H * B` and `B^H * A`.
#[allow(clippy::too_many_arguments)]
pub fn her2k<T: Scalar>(
    uplo: UpperOrLower,
    orient: Orientation,
    alpha: T,
    a: &DistRef<'_, T>,
    b: &DistRef<'_, T>,
    beta: T,
    c: &mut DistMut<'_, T>,
    cfg: &AlgorithmConfig,
) -> Result<()> {
    let terms = [
        Term { alpha, x: a, y: b },
        Term {
            alpha: alpha.conjugate(),
            x: b,
            y: a,
        },
    ];
    rank_update("her2k", uplo, orient, true, &terms, beta, c, cfg)
}

/// `C := alpha * (A * B^T + B * A^T) + beta * C` (`Normal`), or the same
/// with `A^T * B` and `B^T * A`.
#[allow(clippy::too_many_arguments)]
pub fn syr2k<T: Scalar>(
    uplo: UpperOrLower,
    orient: Orientation,
    alpha: T,
    a: &DistRef<'_, T>,
    b: &DistRef<'_, T>,
    beta: T,
    c: &mut DistMut<'_, T>,
    cfg: &AlgorithmConfig,
) -> Result<()> {
    let terms = [Term { alpha, x: a, y: b }, Term { alpha, x: b, y: a }];
    rank_update("syr2k", uplo, orient, false, &terms, beta, c, cfg)
}
