use crate::blas::{herk, make_triangular, require_mc_mr, syrk};
use crate::config::AlgorithmConfig;
use crate::dist::DistMut;
use crate::error::Result;
use gridla_kernels::{Orientation, Scalar, UpperOrLower};
use tracing::debug_span;

/// Overwrites the `uplo` triangle of `A` with `L^T L` (`Lower`) or `U U^T`
/// (`Upper`), or with the conjugate-transposed products when `conjugate`
/// is set. The other triangle is left untouched.
pub fn trtrmm<T: Scalar>(
    uplo: UpperOrLower,
    a: &mut DistMut<'_, T>,
    conjugate: bool,
    cfg: &AlgorithmConfig,
) -> Result<()> {
    require_mc_mr("trtrmm", "A", a.dist());
    let n = a.height();
    assert_eq!(n, a.width(), "trtrmm: A must be square, got {}x{}", n, a.width());
    let _span = debug_span!("trtrmm", ?uplo, conjugate, n).entered();

    let mut tri = a.as_ref().to_owned();
    make_triangular(uplo, &mut tri.as_mut());
    let orient = match (uplo, conjugate) {
        (UpperOrLower::Upper, _) => Orientation::Normal,
        (UpperOrLower::Lower, true) => Orientation::Adjoint,
        (UpperOrLower::Lower, false) => Orientation::Transpose,
    };
    if conjugate {
        herk(uplo, orient, T::one(), &tri.as_ref(), T::zero(), a, cfg)
    } else {
        syrk(uplo, orient, T::one(), &tri.as_ref(), T::zero(), a, cfg)
    }
}

/// [`trtrmm`] with conjugation: `L^H L` or `U U^H`.
pub fn hetrmm<T: Scalar>(uplo: UpperOrLower, a: &mut DistMut<'_, T>, cfg: &AlgorithmConfig) -> Result<()> {
    trtrmm(uplo, a, true, cfg)
}
