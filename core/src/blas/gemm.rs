use super::level1::scale;
use super::{panels, redistribute, require_mc_mr};
use crate::config::{AlgorithmConfig, GemmVariant};
use crate::dist::{DistMatrix, DistMut, DistRef, Distribution, redist};
use crate::error::Result;
use gridla_kernels::{Orientation, Scalar, cpu_gemm};
use tracing::debug_span;

fn op_shape<T: Scalar>(a: &DistRef<'_, T>, orient: Orientation) -> (usize, usize) {
    if orient.is_normal() {
        (a.height(), a.width())
    } else {
        (a.width(), a.height())
    }
}

/// `C := alpha * op(A) * op(B) + beta * C` with `C` in `[MC,MR]`.
///
/// The stationary-C variant keeps `C` in place and, for each panel of the
/// inner dimension, gathers the matching columns of `op(A)` as `[MC,STAR]`
/// (or rows of `A` as `[STAR,MC]`) and rows of `op(B)` as `[STAR,MR]` (or
/// `[MR,STAR]`), so that the update is one local `gemm` per process. The
/// dot variant spreads the inner dimension over all processes and
/// sum-scatters the local products into `C`, which wins when `C` is small.
///
/// # Panics
///
/// If the operand shapes do not conform or `C` is not `[MC,MR]`.
#[allow(clippy::too_many_arguments)]
pub fn gemm<T: Scalar>(
    orient_a: Orientation,
    orient_b: Orientation,
    alpha: T,
    a: &DistRef<'_, T>,
    b: &DistRef<'_, T>,
    beta: T,
    c: &mut DistMut<'_, T>,
    cfg: &AlgorithmConfig,
) -> Result<()> {
    require_mc_mr("gemm", "C", c.dist());
    let (m, k) = op_shape(a, orient_a);
    let (kb, n) = op_shape(b, orient_b);
    assert!(
        k == kb && m == c.height() && n == c.width(),
        "gemm: op(A) is {m}x{k}, op(B) is {kb}x{n}, C is {}x{}",
        c.height(),
        c.width()
    );
    let variant = match cfg.gemm_variant {
        GemmVariant::Auto if m.max(n) * 8 <= k => GemmVariant::Dot,
        GemmVariant::Auto => GemmVariant::StationaryC,
        v => v,
    };
    let _span = debug_span!("gemm", m, n, k, ?orient_a, ?orient_b, ?variant).entered();

    scale(beta, c);
    if k == 0 {
        return Ok(());
    }
    match variant {
        GemmVariant::Dot => gemm_dot(orient_a, orient_b, alpha, a, b, c),
        _ => gemm_stationary_c(orient_a, orient_b, alpha, a, b, c, cfg.block_size),
    }
}

fn gemm_stationary_c<T: Scalar>(
    orient_a: Orientation,
    orient_b: Orientation,
    alpha: T,
    a: &DistRef<'_, T>,
    b: &DistRef<'_, T>,
    c: &mut DistMut<'_, T>,
    nb: usize,
) -> Result<()> {
    let (m, k) = op_shape(a, orient_a);
    let n = c.width();
    let (c_col_align, c_row_align) = (c.col_align(), c.row_align());

    for (k0, kb) in panels(k, nb) {
        let a1 = if orient_a.is_normal() {
            redistribute(&a.view(0, k0, m, kb), Distribution::MC_STAR, c_col_align, 0)?
        } else {
            redistribute(&a.view(k0, 0, kb, m), Distribution::STAR_MC, 0, c_col_align)?
        };
        let b1 = if orient_b.is_normal() {
            redistribute(&b.view(k0, 0, kb, n), Distribution::STAR_MR, 0, c_row_align)?
        } else {
            redistribute(&b.view(0, k0, n, kb), Distribution::MR_STAR, c_row_align, 0)?
        };
        cpu_gemm(
            orient_a,
            orient_b,
            alpha,
            &a1.local().as_ref(),
            &b1.local().as_ref(),
            T::one(),
            &mut c.local_mut(),
        );
    }
    Ok(())
}

/// Inner dimension split over VC: each process multiplies its slice of
/// `op(A)` columns with the same slice of `op(B)` rows, and the `m x n`
/// partial products are summed straight into `C`.
fn gemm_dot<T: Scalar>(
    orient_a: Orientation,
    orient_b: Orientation,
    alpha: T,
    a: &DistRef<'_, T>,
    b: &DistRef<'_, T>,
    c: &mut DistMut<'_, T>,
) -> Result<()> {
    let (m, _) = op_shape(a, orient_a);
    let n = c.width();
    let a1 = if orient_a.is_normal() {
        redistribute(a, Distribution::STAR_VC, 0, 0)?
    } else {
        redistribute(a, Distribution::VC_STAR, 0, 0)?
    };
    let b1 = if orient_b.is_normal() {
        redistribute(b, Distribution::VC_STAR, 0, 0)?
    } else {
        redistribute(b, Distribution::STAR_VC, 0, 0)?
    };
    let mut partial = DistMatrix::zeros(c.grid(), Distribution::STAR_STAR, m, n);
    cpu_gemm(
        orient_a,
        orient_b,
        alpha,
        &a1.local().as_ref(),
        &b1.local().as_ref(),
        T::zero(),
        &mut partial.local_mut().as_mut(),
    );
    redist::sum_scatter(T::one(), &partial.as_ref(), c, true)
}
