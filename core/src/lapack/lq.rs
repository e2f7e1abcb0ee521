//! Householder LQ factorization.
//!
//! `lq` reduces `A` (`m x n`) from the right with reflectors
//! `H_k = I - t_k u_k^H u_k`, where the row vector `u_k` is zero before
//! position `k` and one at it, so that `A H_0 H_1 ... H_{r-1} = L` with
//! `r = min(m, n)`. Hence `A = L Q` for the unitary
//! `Q = H_{r-1}^H ... H_0^H`.
//!
//! On return `L` occupies the lower trapezoid of `A` and the tail of each
//! `u_k` is stored to the right of the diagonal in row `k`.
//!
//! The factorization is blocked: the reflectors of a panel of rows are
//! accumulated as `H_{k0} ... H_{k0+nb-1} = I - V^H T V`, with `V` holding
//! the panel's `u_k` as rows and `T` upper triangular, and the rows below
//! the panel take that product in three gemms.

use crate::blas::{panels, redistribute, require_mc_mr, trsm};
use crate::config::AlgorithmConfig;
use crate::dist::{DistMatrix, DistMut, DistRef, Distribution, copy, redist};
use crate::error::Result;
use crate::matrix::Matrix;
use gridla_kernels::{Orientation, Scalar, Side, UnitOrNonUnit, UpperOrLower, cpu_gemm};
use num_traits::{Float, Zero};
use tracing::debug_span;

/// Householder scalars of an LQ factorization, replicated on every process.
#[derive(Debug, Clone, PartialEq)]
pub struct LqFactors<T> {
    pub t: Vec<T>,
}

/// Row `k` of `a`, replicated everywhere.
fn replicated_row<T: Scalar>(a: &DistRef<'_, T>, k: usize) -> Result<Matrix<T>> {
    let row = DistMatrix::redistributed(&a.view(k, 0, 1, a.width()), Distribution::STAR_STAR)?;
    Ok(row.into_local())
}

/// Reflector that maps the row `r` to `beta * e_0` from the right.
///
/// Returns `(tau, beta, u)` with `u[0] = 1`; `tau` is zero when `r` is
/// already a multiple of `e_0` with a real leading entry.
fn reflector<T: Scalar>(r: &[T]) -> (T, T::Real, Vec<T>) {
    let alpha = r[0];
    let tail: T::Real = r[1..]
        .iter()
        .fold(T::Real::zero(), |acc, &x| acc + x.magnitude_squared());
    let mut u = vec![T::zero(); r.len()];
    u[0] = T::one();
    if tail == T::Real::zero() && alpha.imag_part() == T::Real::zero() {
        return (T::zero(), alpha.real_part(), u);
    }
    let norm = (alpha.magnitude_squared() + tail).sqrt();
    let beta = if alpha.real_part() >= T::Real::zero() {
        -norm
    } else {
        norm
    };
    let b = T::from_real(beta);
    // With x = r^H: tau = (beta - conj(alpha)) / beta and v = x / (conj(alpha) - beta).
    // The stored row is u = v^H.
    let tau = (b - alpha.conjugate()) / b;
    let scale = T::one() / (alpha - b);
    for (ui, &ri) in u.iter_mut().zip(r).skip(1) {
        *ui = ri * scale;
    }
    (tau, beta, u)
}

/// `B := B - coef * (B u^H) u` for the replicated row vector `u` (indexed
/// by the global columns of `B`).
fn reflect_from_right<T: Scalar>(coef: T, u: &[T], b: &mut DistMut<'_, T>) -> Result<()> {
    let meta = b.meta().clone();
    let grid = meta.grid().clone();
    let mut w = DistMatrix::aligned(&grid, Distribution::MC_STAR, b.height(), 1, b.col_align(), 0, 0);
    {
        let local = b.local();
        let mut wl = w.local_mut().as_mut();
        for j in 0..local.width() {
            let uj = u[meta.global_col(j)].conjugate();
            if uj == T::zero() {
                continue;
            }
            for i in 0..local.height() {
                let v = wl.get(i, 0) + local.get(i, j) * uj;
                wl.set(i, 0, v);
            }
        }
    }
    redist::sum_over(grid.mr_comm(), &mut w.as_mut())?;
    let w = w.local();
    b.local_mut().for_each_mut(|i, j, v| {
        *v -= coef * w.get(i, 0) * u[meta.global_col(j)];
    });
    Ok(())
}

/// `B := B - coef * u^H (u B)` for the replicated row vector `u` (indexed
/// by the global rows of `B`).
fn reflect_from_left<T: Scalar>(coef: T, u: &[T], b: &mut DistMut<'_, T>) -> Result<()> {
    let meta = b.meta().clone();
    let grid = meta.grid().clone();
    let mut z = DistMatrix::aligned(&grid, Distribution::STAR_MR, 1, b.width(), 0, b.row_align(), 0);
    {
        let local = b.local();
        let mut zl = z.local_mut().as_mut();
        for j in 0..local.width() {
            let mut acc = T::zero();
            for i in 0..local.height() {
                acc += u[meta.global_row(i)] * local.get(i, j);
            }
            zl.set(0, j, acc);
        }
    }
    redist::sum_over(grid.mc_comm(), &mut z.as_mut())?;
    let z = z.local();
    b.local_mut().for_each_mut(|i, j, v| {
        *v -= coef * u[meta.global_row(i)].conjugate() * z.get(0, j);
    });
    Ok(())
}

/// The reflectors of the already factored rows `k0..k0 + nb` as the rows of
/// an `nb x n` `[STAR,MR]` matrix aligned with `a`.
fn panel_reflectors<T: Scalar>(a: &DistRef<'_, T>, k0: usize, nb: usize) -> Result<DistMatrix<T>> {
    let mut v = redistribute(&a.view(k0, 0, nb, a.width()), Distribution::STAR_MR, 0, a.row_align())?;
    let meta = v.meta().clone();
    v.local_mut().as_mut().for_each_mut(|i, j, x| {
        let (k, j) = (k0 + i, meta.global_col(j));
        if j < k {
            *x = T::zero();
        } else if j == k {
            *x = T::one();
        }
    });
    Ok(v)
}

/// The upper triangular `T` with `H_0 ... H_{nb-1} = I - V^H T V`, given
/// the Gram matrix `gram = V V^H` of the reflector rows and their scalars.
fn triangular_factor<T: Scalar>(gram: &Matrix<T>, tau: &[T]) -> Matrix<T> {
    let nb = tau.len();
    let mut t = Matrix::zeros(nb, nb);
    for k in 0..nb {
        t.set(k, k, tau[k]);
        for i in 0..k {
            let acc = (i..k).fold(T::zero(), |acc, l| acc + t.get(i, l) * gram.get(l, k));
            t.set(i, k, -tau[k] * acc);
        }
    }
    t
}

/// `B := B (I - V^H T V)` for `[STAR,MR]` reflector rows `V` aligned with
/// the `[MC,MR]` matrix `B`.
fn block_reflect_from_right<T: Scalar>(v: &DistMatrix<T>, t: &Matrix<T>, b: &mut DistMut<'_, T>) -> Result<()> {
    let grid = b.grid().clone();
    let nb = v.height();
    let v_local = v.local().as_ref();

    // W = B V^H, then Z = W T.
    let mut w = DistMatrix::aligned(&grid, Distribution::MC_STAR, b.height(), nb, b.col_align(), 0, 0);
    cpu_gemm(
        Orientation::Normal,
        Orientation::Adjoint,
        T::one(),
        &b.local(),
        &v_local,
        T::zero(),
        &mut w.local_mut().as_mut(),
    );
    redist::sum_over(grid.mr_comm(), &mut w.as_mut())?;
    let mut z = Matrix::zeros(w.local().height(), nb);
    cpu_gemm(
        Orientation::Normal,
        Orientation::Normal,
        T::one(),
        &w.local().as_ref(),
        &t.as_ref(),
        T::zero(),
        &mut z.as_mut(),
    );
    cpu_gemm(
        Orientation::Normal,
        Orientation::Normal,
        -T::one(),
        &z.as_ref(),
        &v_local,
        T::one(),
        &mut b.local_mut(),
    );
    Ok(())
}

/// In-place blocked Householder LQ of an `[MC,MR]` matrix.
///
/// Panels of `cfg.block_size` rows are reduced one reflector at a time;
/// the rows below each panel are then updated with the panel's accumulated
/// `I - V^H T V`.
pub fn lq<T: Scalar>(a: &mut DistMut<'_, T>, cfg: &AlgorithmConfig) -> Result<LqFactors<T>> {
    require_mc_mr("lq", "A", a.dist());
    let (m, n) = (a.height(), a.width());
    let _span = debug_span!("lq", m, n, nb = cfg.block_size).entered();

    let r = m.min(n);
    let mut t = Vec::with_capacity(r);
    for (k0, kb) in panels(r, cfg.block_size) {
        let panel_end = k0 + kb;
        for k in k0..panel_end {
            let row = replicated_row(&a.as_ref(), k)?;
            let tail: Vec<T> = (k..n).map(|j| row.get(0, j)).collect();
            let (tau, beta, u_tail) = reflector(&tail);
            let mut u = vec![T::zero(); n];
            u[k..].copy_from_slice(&u_tail);
            if k + 1 < panel_end && tau != T::zero() {
                reflect_from_right(tau, &u, &mut a.view_mut(k + 1, 0, panel_end - k - 1, n))?;
            }
            a.set(k, k, T::from_real(beta));
            for j in k + 1..n {
                a.set(k, j, u[j]);
            }
            t.push(tau);
        }

        let m2 = m - panel_end;
        if m2 == 0 {
            continue;
        }
        let v = panel_reflectors(&a.as_ref(), k0, kb)?;
        let mut gram = Matrix::zeros(kb, kb);
        cpu_gemm(
            Orientation::Normal,
            Orientation::Adjoint,
            T::one(),
            &v.local().as_ref(),
            &v.local().as_ref(),
            T::zero(),
            &mut gram.as_mut(),
        );
        let gram = Matrix::from_column_major(kb, kb, a.grid().mr_comm().all_reduce_sum(gram.into_vec())?);
        let tri = triangular_factor(&gram, &t[k0..panel_end]);
        block_reflect_from_right(&v, &tri, &mut a.view_mut(panel_end, 0, m2, n))?;
    }
    Ok(LqFactors { t })
}

/// Rebuilds `u_k` from row `k` of the factored matrix.
fn stored_reflector<T: Scalar>(factored: &DistRef<'_, T>, k: usize) -> Result<Vec<T>> {
    let row = replicated_row(factored, k)?;
    let n = factored.width();
    let mut u = vec![T::zero(); n];
    u[k] = T::one();
    for (j, uj) in u.iter_mut().enumerate().skip(k + 1) {
        *uj = row.get(0, j);
    }
    Ok(u)
}

/// Applies `Q` (or `Q^H`) from an LQ factorization to `B` (`[MC,MR]`):
/// `B := op(Q) B` for `Side::Left`, `B := B op(Q)` for `Side::Right`.
///
/// `Transpose` is not supported since `Q` is only unitary under the
/// conjugate transpose.
pub fn apply_q<T: Scalar>(
    side: Side,
    orient: Orientation,
    factored: &DistRef<'_, T>,
    factors: &LqFactors<T>,
    b: &mut DistMut<'_, T>,
) -> Result<()> {
    require_mc_mr("apply_q", "B", b.dist());
    assert!(
        orient != Orientation::Transpose,
        "apply_q: only Normal and Adjoint orientations are supported"
    );
    let n = factored.width();
    let applied_dim = match side {
        Side::Left => b.height(),
        Side::Right => b.width(),
    };
    assert_eq!(applied_dim, n, "apply_q: Q is {n}x{n} but B is {}x{}", b.height(), b.width());
    let r = factors.t.len();
    let _span = debug_span!("apply_q", ?side, ?orient, n, r).entered();

    // Q = H_{r-1}^H ... H_0^H. Each branch applies the factors in the order
    // that makes the product come out right and picks H_k or H_k^H.
    let ascending = matches!(
        (side, orient),
        (Side::Left, Orientation::Normal) | (Side::Right, Orientation::Adjoint)
    );
    let conj_tau = orient.is_normal();
    let order: Vec<usize> = if ascending {
        (0..r).collect()
    } else {
        (0..r).rev().collect()
    };
    for k in order {
        let tau = factors.t[k];
        if tau == T::zero() {
            continue;
        }
        let coef = if conj_tau { tau.conjugate() } else { tau };
        let u = stored_reflector(factored, k)?;
        match side {
            Side::Left => reflect_from_left(coef, &u, b)?,
            Side::Right => reflect_from_right(coef, &u, b)?,
        }
    }
    Ok(())
}

/// The leading `min(m, n)` rows of `Q`, so that `A = L Q` with `L` the
/// `m x min(m, n)` lower trapezoid of the factored matrix.
pub fn explicit_q<T: Scalar>(factored: &DistRef<'_, T>, factors: &LqFactors<T>) -> Result<DistMatrix<T>> {
    let n = factored.width();
    let r = factors.t.len();
    let mut q = DistMatrix::zeros(factored.grid(), Distribution::MC_MR, r, n);
    crate::blas::set_identity(&mut q.as_mut());
    apply_q(Side::Right, Orientation::Normal, factored, factors, &mut q.as_mut())?;
    Ok(q)
}

/// Minimum-norm solution of the wide system `A X = B` from the LQ
/// factorization of `A` (`m x n`, `m <= n`): `X = Q^H [L^{-1} B; 0]`.
///
/// A zero diagonal entry of `L` returns [`Error::Singular`](crate::Error::Singular).
pub fn solve_after<T: Scalar>(
    factored: &DistRef<'_, T>,
    factors: &LqFactors<T>,
    b: &DistRef<'_, T>,
    cfg: &AlgorithmConfig,
) -> Result<DistMatrix<T>> {
    require_mc_mr("solve_after", "B", b.dist());
    let (m, n) = (factored.height(), factored.width());
    assert!(m <= n, "solve_after: A must be wide or square, got {m}x{n}");
    assert_eq!(b.height(), m, "solve_after: A is {m}x{n} but B has {} rows", b.height());
    let k = b.width();
    let _span = debug_span!("lq_solve_after", m, n, k).entered();

    let mut x = DistMatrix::zeros(b.grid(), Distribution::MC_MR, n, k);
    copy(b, &mut x.view_mut(0, 0, m, k))?;
    trsm(
        Side::Left,
        UpperOrLower::Lower,
        Orientation::Normal,
        UnitOrNonUnit::NonUnit,
        T::one(),
        &factored.view(0, 0, m, m),
        &mut x.view_mut(0, 0, m, k),
        cfg,
    )?;
    apply_q(Side::Left, Orientation::Adjoint, factored, factors, &mut x.as_mut())?;
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex;

    fn apply_to_row<T: Scalar>(r: &[T], tau: T, u: &[T]) -> Vec<T> {
        // r H = r - tau (r u^H) u
        let dot = r
            .iter()
            .zip(u)
            .fold(T::zero(), |acc, (&x, &y)| acc + x * y.conjugate());
        r.iter().zip(u).map(|(&x, &y)| x - tau * dot * y).collect()
    }

    #[test]
    fn test_reflector_annihilates_real_row() {
        let r = [3.0f64, 4.0, 0.0];
        let (tau, beta, u) = reflector(&r);
        assert_eq!(beta, -5.0);
        let out = apply_to_row(&r, tau, &u);
        assert!((out[0] + 5.0).abs() < 1e-12);
        assert!(out[1].abs() < 1e-12 && out[2].abs() < 1e-12);
    }

    #[test]
    fn test_reflector_annihilates_complex_row() {
        let r = [Complex::new(1.0f64, 2.0), Complex::new(-0.5, 1.0), Complex::new(2.0, 0.0)];
        let (tau, beta, u) = reflector(&r);
        let out = apply_to_row(&r, tau, &u);
        assert!((out[0] - Complex::new(beta, 0.0)).norm() < 1e-12);
        assert!(out[1].norm() < 1e-12 && out[2].norm() < 1e-12);
    }

    #[test]
    fn test_triangular_factor_accumulates_reflectors() {
        // Three reflector rows of length 5 with the unit-leading pattern.
        let rows = [
            vec![Complex::new(1.0, 0.0), Complex::new(0.3, -0.2), Complex::new(-0.5, 0.1), Complex::new(0.2, 0.4), Complex::new(0.0, 1.0)],
            vec![Complex::new(0.0, 0.0), Complex::new(1.0, 0.0), Complex::new(0.7, 0.7), Complex::new(-0.1, 0.0), Complex::new(0.5, -0.3)],
            vec![Complex::new(0.0, 0.0), Complex::new(0.0, 0.0), Complex::new(1.0, 0.0), Complex::new(0.25, 0.5), Complex::new(-0.6, 0.2)],
        ];
        let tau = [Complex::new(1.2, 0.3), Complex::new(0.9, -0.1), Complex::new(1.5, 0.0)];
        let n = 5;
        let gram = Matrix::from_fn(3, 3, |i, k| {
            (0..n).fold(Complex::new(0.0, 0.0), |acc, j| acc + rows[i][j] * rows[k][j].conj())
        });
        let t = triangular_factor(&gram, &tau);

        // Run a test row through H_0 H_1 H_2 one reflector at a time, and
        // through I - V^H T V at once.
        let x: Vec<Complex<f64>> = (0..n).map(|j| Complex::new(j as f64 - 1.5, 0.5 * j as f64)).collect();
        let mut one_by_one = x.clone();
        for k in 0..3 {
            one_by_one = apply_to_row(&one_by_one, tau[k], &rows[k]);
        }
        let xv: Vec<Complex<f64>> = (0..3)
            .map(|i| (0..n).fold(Complex::new(0.0, 0.0), |acc, j| acc + x[j] * rows[i][j].conj()))
            .collect();
        let xvt: Vec<Complex<f64>> = (0..3)
            .map(|k| (0..3).fold(Complex::new(0.0, 0.0), |acc, i| acc + xv[i] * t.get(i, k)))
            .collect();
        for j in 0..n {
            let blocked = x[j] - (0..3).fold(Complex::new(0.0, 0.0), |acc, k| acc + xvt[k] * rows[k][j]);
            assert!((blocked - one_by_one[j]).norm() < 1e-12, "entry {j}");
        }
        assert_eq!(t.get(1, 0), Complex::new(0.0, 0.0));
    }

    #[test]
    fn test_reflector_identity_on_aligned_row() {
        let (tau, beta, _) = reflector(&[2.0f64, 0.0]);
        assert_eq!(tau, 0.0);
        assert_eq!(beta, 2.0);
    }
}
