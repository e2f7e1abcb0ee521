use crate::blas::{make_hermitian, make_symmetric};
use crate::dist::{Dist, DistMatrix, DistRef, Distribution};
use crate::error::Result;
use gridla_kernels::{Scalar, UpperOrLower};
use num_traits::{Float, One, Zero};

/// `a` itself when it is `[MC,MR]`, otherwise an `[MC,MR]` copy parked in
/// `owned`. Line sums and totals below count each entry exactly once.
fn as_mc_mr<'r, T: Scalar>(a: &'r DistRef<'_, T>, owned: &'r mut Option<DistMatrix<T>>) -> Result<DistRef<'r, T>> {
    if a.dist() == Distribution::MC_MR {
        return Ok(a.clone());
    }
    let copy = DistMatrix::redistributed(a, Distribution::MC_MR)?;
    Ok(owned.insert(copy).as_ref())
}

/// Sum of `f(entry)` over the whole matrix.
fn global_sum<T: Scalar>(a: &DistRef<'_, T>, f: impl Fn(T) -> T::Real) -> Result<T::Real> {
    let mut owned = None;
    let a = as_mc_mr(a, &mut owned)?;
    let local = a.local();
    let mut acc = T::Real::zero();
    for j in 0..local.width() {
        for i in 0..local.height() {
            acc = acc + f(local.get(i, j));
        }
    }
    let total = a.grid().vc_comm().all_reduce_sum(vec![acc])?;
    Ok(total[0])
}

/// Largest of the absolute line sums: columns when `by_cols`, rows otherwise.
fn max_line_sum<T: Scalar>(a: &DistRef<'_, T>, by_cols: bool) -> Result<T::Real> {
    let mut owned = None;
    let a = as_mc_mr(a, &mut owned)?;
    let local = a.local();
    let grid = a.grid();
    let count = if by_cols { local.width() } else { local.height() };
    let mut sums = vec![T::Real::zero(); count];
    for j in 0..local.width() {
        for i in 0..local.height() {
            let line = if by_cols { j } else { i };
            sums[line] = sums[line] + local.get(i, j).magnitude();
        }
    }
    // Column sums are split over the grid column, row sums over the grid row.
    let team = if by_cols { Dist::Mc } else { Dist::Mr };
    let sums = team.comm(grid).all_reduce_sum(sums)?;
    let mine = sums.into_iter().fold(T::Real::zero(), |m, s| if s > m { s } else { m });
    let max = grid.vc_comm().all_reduce_max(vec![mine])?;
    Ok(max[0])
}

/// Maximum absolute column sum.
pub fn one_norm<T: Scalar>(a: &DistRef<'_, T>) -> Result<T::Real> {
    max_line_sum(a, true)
}

/// Maximum absolute row sum.
pub fn infinity_norm<T: Scalar>(a: &DistRef<'_, T>) -> Result<T::Real> {
    max_line_sum(a, false)
}

/// Largest entry magnitude. Works on any distribution as is, since
/// replicated copies do not change a maximum.
pub fn max_norm<T: Scalar>(a: &DistRef<'_, T>) -> Result<T::Real> {
    let local = a.local();
    let mut mine = T::Real::zero();
    for j in 0..local.width() {
        for i in 0..local.height() {
            let v = local.get(i, j).magnitude();
            if v > mine {
                mine = v;
            }
        }
    }
    let max = a.grid().vc_comm().all_reduce_max(vec![mine])?;
    Ok(max[0])
}

pub fn frobenius_norm<T: Scalar>(a: &DistRef<'_, T>) -> Result<T::Real> {
    Ok(global_sum(a, |x| x.magnitude_squared())?.sqrt())
}

/// `(sum |a_ij|^p)^(1/p)`.
pub fn entrywise_norm<T: Scalar>(a: &DistRef<'_, T>, p: T::Real) -> Result<T::Real> {
    assert!(p >= T::Real::one(), "entrywise_norm: p must be at least one");
    Ok(global_sum(a, |x| x.magnitude().powf(p))?.powf(p.recip()))
}

/// The full matrix whose `uplo` triangle `a` stores.
fn completed<T: Scalar>(uplo: UpperOrLower, a: &DistRef<'_, T>, conjugate: bool) -> Result<DistMatrix<T>> {
    let mut full = DistMatrix::redistributed(a, Distribution::MC_MR)?;
    if conjugate {
        make_hermitian(uplo, &mut full.as_mut())?;
    } else {
        make_symmetric(uplo, &mut full.as_mut())?;
    }
    Ok(full)
}

macro_rules! structured_norms {
    ($conjugate:expr, $one:ident, $inf:ident, $max:ident, $frob:ident, $entry:ident) => {
        pub fn $one<T: Scalar>(uplo: UpperOrLower, a: &DistRef<'_, T>) -> Result<T::Real> {
            one_norm(&completed(uplo, a, $conjugate)?.as_ref())
        }

        pub fn $inf<T: Scalar>(uplo: UpperOrLower, a: &DistRef<'_, T>) -> Result<T::Real> {
            infinity_norm(&completed(uplo, a, $conjugate)?.as_ref())
        }

        pub fn $max<T: Scalar>(uplo: UpperOrLower, a: &DistRef<'_, T>) -> Result<T::Real> {
            max_norm(&completed(uplo, a, $conjugate)?.as_ref())
        }

        pub fn $frob<T: Scalar>(uplo: UpperOrLower, a: &DistRef<'_, T>) -> Result<T::Real> {
            frobenius_norm(&completed(uplo, a, $conjugate)?.as_ref())
        }

        pub fn $entry<T: Scalar>(uplo: UpperOrLower, a: &DistRef<'_, T>, p: T::Real) -> Result<T::Real> {
            entrywise_norm(&completed(uplo, a, $conjugate)?.as_ref(), p)
        }
    };
}

structured_norms!(
    false,
    symmetric_one_norm,
    symmetric_infinity_norm,
    symmetric_max_norm,
    symmetric_frobenius_norm,
    symmetric_entrywise_norm
);
structured_norms!(
    true,
    hermitian_one_norm,
    hermitian_infinity_norm,
    hermitian_max_norm,
    hermitian_frobenius_norm,
    hermitian_entrywise_norm
);
