use crate::blas::{panels, redistribute, require_mc_mr};
use crate::config::AlgorithmConfig;
use crate::dist::{DistMatrix, DistMut, Distribution, redist};
use crate::error::{Result, at_offset};
use gridla_kernels::{Orientation, Scalar, Side, UnitOrNonUnit, UpperOrLower, cpu_gemm, cpu_lu, cpu_trsm};
use tracing::debug_span;

/// In-place LU factorization without pivoting: on success `A` holds the
/// unit lower triangle `L` strictly below its diagonal and `U` on and
/// above it, with `A = L U`.
///
/// Per panel the diagonal block is factored redundantly as `[STAR,STAR]`,
/// the column panel is solved against `U11` as `[VC,STAR]`, the row panel
/// against `L11` as `[STAR,VR]`, and the trailing matrix takes the
/// `[MC,STAR] x [STAR,MR]` update.
///
/// An exactly zero pivot returns [`Error::Singular`](crate::Error::Singular)
/// with its global index; `A` is then left partially factored.
pub fn lu<T: Scalar>(a: &mut DistMut<'_, T>, cfg: &AlgorithmConfig) -> Result<()> {
    require_mc_mr("lu", "A", a.dist());
    let (m, n) = (a.height(), a.width());
    let _span = debug_span!("lu", m, n, nb = cfg.block_size).entered();

    for (k0, kb) in panels(m.min(n), cfg.block_size) {
        let (m2, n2) = (m - k0 - kb, n - k0 - kb);
        let mut a11 = redistribute(&a.as_ref().view(k0, k0, kb, kb), Distribution::STAR_STAR, 0, 0)?;
        at_offset(k0, cpu_lu(&mut a11.local_mut().as_mut()))?;
        redist::filter(&a11.as_ref(), &mut a.view_mut(k0, k0, kb, kb));
        let a11 = a11.local().as_ref();

        let a21 = if m2 > 0 {
            let mut a21 = DistMatrix::redistributed(&a.as_ref().view(k0 + kb, k0, m2, kb), Distribution::VC_STAR)?;
            at_offset(
                k0,
                cpu_trsm(
                    Side::Right,
                    UpperOrLower::Upper,
                    Orientation::Normal,
                    UnitOrNonUnit::NonUnit,
                    T::one(),
                    &a11,
                    &mut a21.local_mut().as_mut(),
                ),
            )?;
            let mut panel = a.view_mut(k0 + kb, k0, m2, kb);
            let a21 = redistribute(&a21.as_ref(), Distribution::MC_STAR, panel.col_align(), 0)?;
            redist::filter(&a21.as_ref(), &mut panel);
            Some(a21)
        } else {
            None
        };

        let a12 = if n2 > 0 {
            let mut a12 = DistMatrix::redistributed(&a.as_ref().view(k0, k0 + kb, kb, n2), Distribution::STAR_VR)?;
            at_offset(
                k0,
                cpu_trsm(
                    Side::Left,
                    UpperOrLower::Lower,
                    Orientation::Normal,
                    UnitOrNonUnit::Unit,
                    T::one(),
                    &a11,
                    &mut a12.local_mut().as_mut(),
                ),
            )?;
            let mut panel = a.view_mut(k0, k0 + kb, kb, n2);
            let a12 = redistribute(&a12.as_ref(), Distribution::STAR_MR, 0, panel.row_align())?;
            redist::filter(&a12.as_ref(), &mut panel);
            Some(a12)
        } else {
            None
        };

        if let (Some(a21), Some(a12)) = (a21, a12) {
            let mut a22 = a.view_mut(k0 + kb, k0 + kb, m2, n2);
            cpu_gemm(
                Orientation::Normal,
                Orientation::Normal,
                -T::one(),
                &a21.local().as_ref(),
                &a12.local().as_ref(),
                T::one(),
                &mut a22.local_mut(),
            );
        }
    }
    Ok(())
}
