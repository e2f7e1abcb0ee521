use crate::blas::{panels, redistribute, require_mc_mr};
use crate::config::AlgorithmConfig;
use crate::dist::{DistMatrix, DistMut, Distribution, redist};
use crate::error::{Result, at_offset};
use gridla_kernels::{Orientation, Scalar, Side, UnitOrNonUnit, UpperOrLower, cpu_gemm, cpu_trinv, cpu_trsm};
use tracing::debug_span;

/// Inverts the `uplo` triangle of the square `[MC,MR]` matrix `A` in place.
/// The opposite triangle is not referenced.
///
/// Panels are visited top-down. For `Upper`, with `U11` the current
/// diagonal block:
///
/// ```text
/// U01 := -U01 inv(U11)      [VC,STAR]
/// U02 :=  U02 + U01 U12     [MC,STAR] x [STAR,MR]
/// U12 :=  inv(U11) U12      [STAR,VR]
/// U11 :=  inv(U11)          [STAR,STAR]
/// ```
///
/// and `Lower` runs the transposed recurrence.
pub fn trinv<T: Scalar>(
    uplo: UpperOrLower,
    diag: UnitOrNonUnit,
    a: &mut DistMut<'_, T>,
    cfg: &AlgorithmConfig,
) -> Result<()> {
    require_mc_mr("trinv", "A", a.dist());
    let n = a.height();
    assert_eq!(n, a.width(), "trinv: A must be square, got {}x{}", n, a.width());
    let _span = debug_span!("trinv", ?uplo, ?diag, n, nb = cfg.block_size).entered();

    for (k0, kb) in panels(n, cfg.block_size) {
        let n2 = n - k0 - kb;
        let a11 = redistribute(&a.as_ref().view(k0, k0, kb, kb), Distribution::STAR_STAR, 0, 0)?;
        match uplo {
            UpperOrLower::Upper => upper_step(diag, a, &a11, k0, kb, n2)?,
            UpperOrLower::Lower => lower_step(diag, a, &a11, k0, kb, n2)?,
        }
        let mut a11 = a11;
        at_offset(k0, cpu_trinv(uplo, diag, &mut a11.local_mut().as_mut()))?;
        redist::filter(&a11.as_ref(), &mut a.view_mut(k0, k0, kb, kb));
    }
    Ok(())
}

fn upper_step<T: Scalar>(
    diag: UnitOrNonUnit,
    a: &mut DistMut<'_, T>,
    u11: &DistMatrix<T>,
    k0: usize,
    kb: usize,
    n2: usize,
) -> Result<()> {
    let u11 = u11.local().as_ref();
    let u01 = if k0 > 0 {
        let mut u01 = DistMatrix::redistributed(&a.as_ref().view(0, k0, k0, kb), Distribution::VC_STAR)?;
        at_offset(
            k0,
            cpu_trsm(
                Side::Right,
                UpperOrLower::Upper,
                Orientation::Normal,
                diag,
                -T::one(),
                &u11,
                &mut u01.local_mut().as_mut(),
            ),
        )?;
        let mut panel = a.view_mut(0, k0, k0, kb);
        let u01 = redistribute(&u01.as_ref(), Distribution::MC_STAR, panel.col_align(), 0)?;
        redist::filter(&u01.as_ref(), &mut panel);
        Some(u01)
    } else {
        None
    };
    if n2 == 0 {
        return Ok(());
    }

    let row_align = a.as_ref().view(k0, k0 + kb, kb, n2).row_align();
    if let Some(u01) = &u01 {
        let u12 = redistribute(&a.as_ref().view(k0, k0 + kb, kb, n2), Distribution::STAR_MR, 0, row_align)?;
        let mut u02 = a.view_mut(0, k0 + kb, k0, n2);
        cpu_gemm(
            Orientation::Normal,
            Orientation::Normal,
            T::one(),
            &u01.local().as_ref(),
            &u12.local().as_ref(),
            T::one(),
            &mut u02.local_mut(),
        );
    }
    let mut u12 = DistMatrix::redistributed(&a.as_ref().view(k0, k0 + kb, kb, n2), Distribution::STAR_VR)?;
    at_offset(
        k0,
        cpu_trsm(
            Side::Left,
            UpperOrLower::Upper,
            Orientation::Normal,
            diag,
            T::one(),
            &u11,
            &mut u12.local_mut().as_mut(),
        ),
    )?;
    let u12 = redistribute(&u12.as_ref(), Distribution::STAR_MR, 0, row_align)?;
    redist::filter(&u12.as_ref(), &mut a.view_mut(k0, k0 + kb, kb, n2));
    Ok(())
}

fn lower_step<T: Scalar>(
    diag: UnitOrNonUnit,
    a: &mut DistMut<'_, T>,
    l11: &DistMatrix<T>,
    k0: usize,
    kb: usize,
    n2: usize,
) -> Result<()> {
    let l11 = l11.local().as_ref();
    let l10 = if k0 > 0 {
        let mut l10 = DistMatrix::redistributed(&a.as_ref().view(k0, 0, kb, k0), Distribution::STAR_VR)?;
        at_offset(
            k0,
            cpu_trsm(
                Side::Left,
                UpperOrLower::Lower,
                Orientation::Normal,
                diag,
                -T::one(),
                &l11,
                &mut l10.local_mut().as_mut(),
            ),
        )?;
        let mut panel = a.view_mut(k0, 0, kb, k0);
        let l10 = redistribute(&l10.as_ref(), Distribution::STAR_MR, 0, panel.row_align())?;
        redist::filter(&l10.as_ref(), &mut panel);
        Some(l10)
    } else {
        None
    };
    if n2 == 0 {
        return Ok(());
    }

    let col_align = a.as_ref().view(k0 + kb, k0, n2, kb).col_align();
    if let Some(l10) = &l10 {
        let l21 = redistribute(&a.as_ref().view(k0 + kb, k0, n2, kb), Distribution::MC_STAR, col_align, 0)?;
        let mut l20 = a.view_mut(k0 + kb, 0, n2, k0);
        cpu_gemm(
            Orientation::Normal,
            Orientation::Normal,
            T::one(),
            &l21.local().as_ref(),
            &l10.local().as_ref(),
            T::one(),
            &mut l20.local_mut(),
        );
    }
    let mut l21 = DistMatrix::redistributed(&a.as_ref().view(k0 + kb, k0, n2, kb), Distribution::VC_STAR)?;
    at_offset(
        k0,
        cpu_trsm(
            Side::Right,
            UpperOrLower::Lower,
            Orientation::Normal,
            diag,
            T::one(),
            &l11,
            &mut l21.local_mut().as_mut(),
        ),
    )?;
    let l21 = redistribute(&l21.as_ref(), Distribution::MC_STAR, col_align, 0)?;
    redist::filter(&l21.as_ref(), &mut a.view_mut(k0 + kb, k0, n2, kb));
    Ok(())
}
