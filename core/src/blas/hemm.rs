use super::gemm::gemm;
use super::level1::{make_hermitian, make_symmetric};
use super::redistribute;
use crate::config::AlgorithmConfig;
use crate::dist::{DistMut, DistRef, Distribution};
use crate::error::Result;
use gridla_kernels::{Orientation, Scalar, Side, UpperOrLower};
use tracing::debug_span;

#[allow(clippy::too_many_arguments)]
fn structured_multiply<T: Scalar>(
    op: &'static str,
    conjugate: bool,
    side: Side,
    uplo: UpperOrLower,
    alpha: T,
    a: &DistRef<'_, T>,
    b: &DistRef<'_, T>,
    beta: T,
    c: &mut DistMut<'_, T>,
    cfg: &AlgorithmConfig,
) -> Result<()> {
    assert_eq!(a.height(), a.width(), "{op}: A must be square, got {}x{}", a.height(), a.width());
    let _span = debug_span!("structured_multiply", op, ?side, ?uplo, m = c.height(), n = c.width()).entered();

    let mut full = redistribute(a, Distribution::MC_MR, 0, 0)?;
    if conjugate {
        make_hermitian(uplo, &mut full.as_mut())?;
    } else {
        make_symmetric(uplo, &mut full.as_mut())?;
    }
    let n = Orientation::Normal;
    match side {
        Side::Left => gemm(n, n, alpha, &full.as_ref(), b, beta, c, cfg),
        Side::Right => gemm(n, n, alpha, b, &full.as_ref(), beta, c, cfg),
    }
}

/// `C := alpha * A * B + beta * C` (`Left`) or `alpha * B * A + beta * C`
/// (`Right`) for Hermitian `A`, of which only the `uplo` triangle is read.
#[allow(clippy::too_many_arguments)]
pub fn hemm<T: Scalar>(
    side: Side,
    uplo: UpperOrLower,
    alpha: T,
    a: &DistRef<'_, T>,
    b: &DistRef<'_, T>,
    beta: T,
    c: &mut DistMut<'_, T>,
    cfg: &AlgorithmConfig,
) -> Result<()> {
    structured_multiply("hemm", true, side, uplo, alpha, a, b, beta, c, cfg)
}

/// Symmetric counterpart of [`hemm`].
#[allow(clippy::too_many_arguments)]
pub fn symm<T: Scalar>(
    side: Side,
    uplo: UpperOrLower,
    alpha: T,
    a: &DistRef<'_, T>,
    b: &DistRef<'_, T>,
    beta: T,
    c: &mut DistMut<'_, T>,
    cfg: &AlgorithmConfig,
) -> Result<()> {
    structured_multiply("symm", false, side, uplo, alpha, a, b, beta, c, cfg)
}
