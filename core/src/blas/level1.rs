use crate::dist::{DistMatrix, DistMut, DistRef, copy, transpose_copy};
use crate::error::Result;
use gridla_kernels::{Scalar, UpperOrLower};

/// `A := alpha * A`.
pub fn scale<T: Scalar>(alpha: T, a: &mut DistMut<'_, T>) {
    if alpha == T::one() {
        return;
    }
    a.local_mut().for_each_mut(|_, _, v| {
        *v = if alpha == T::zero() { T::zero() } else { alpha * *v };
    });
}

/// `Y := alpha * X + Y`. `X` is redistributed into `Y`'s layout if needed.
pub fn axpy<T: Scalar>(alpha: T, x: &DistRef<'_, T>, y: &mut DistMut<'_, T>) -> Result<()> {
    assert!(
        x.height() == y.height() && x.width() == y.width(),
        "axpy: X is {}x{} but Y is {}x{}",
        x.height(),
        x.width(),
        y.height(),
        y.width()
    );
    let routed;
    let x_local = if x.meta().conforms(y.meta()) {
        x.local()
    } else {
        let mut tmp = DistMatrix::from_meta(y.meta().clone());
        copy(x, &mut tmp.as_mut())?;
        routed = tmp;
        routed.local().as_ref()
    };
    y.local_mut().for_each_mut(|i, j, v| *v += alpha * x_local.get(i, j));
    Ok(())
}

pub fn set_to_zero<T: Scalar>(a: &mut DistMut<'_, T>) {
    a.local_mut().for_each_mut(|_, _, v| *v = T::zero());
}

/// Ones on the main diagonal, zeros elsewhere. Works for any shape.
pub fn set_identity<T: Scalar>(a: &mut DistMut<'_, T>) {
    let meta = a.meta().clone();
    a.local_mut().for_each_mut(|i, j, v| {
        *v = if meta.global_row(i) == meta.global_col(j) {
            T::one()
        } else {
            T::zero()
        };
    });
}

/// Zeroes everything outside a trapezoid. With `Lower` the entries with
/// `j - i > offset` are cleared; with `Upper` those with `j - i < offset`.
pub fn make_trapezoidal<T: Scalar>(uplo: UpperOrLower, offset: isize, a: &mut DistMut<'_, T>) {
    let meta = a.meta().clone();
    a.local_mut().for_each_mut(|i, j, v| {
        let diff = meta.global_col(j) as isize - meta.global_row(i) as isize;
        let keep = match uplo {
            UpperOrLower::Lower => diff <= offset,
            UpperOrLower::Upper => diff >= offset,
        };
        if !keep {
            *v = T::zero();
        }
    });
}

pub fn make_triangular<T: Scalar>(uplo: UpperOrLower, a: &mut DistMut<'_, T>) {
    make_trapezoidal(uplo, 0, a);
}

/// Fills the triangle opposite `uplo` with the (conjugate) transpose of the
/// stored one.
fn reflect<T: Scalar>(uplo: UpperOrLower, a: &mut DistMut<'_, T>, conjugate: bool) -> Result<()> {
    assert_eq!(
        a.height(),
        a.width(),
        "make_symmetric: matrix must be square, got {}x{}",
        a.height(),
        a.width()
    );
    let mut flipped = DistMatrix::from_meta(a.meta().clone());
    transpose_copy(&a.as_ref(), &mut flipped.as_mut(), conjugate)?;
    let meta = a.meta().clone();
    let flipped = flipped.local();
    a.local_mut().for_each_mut(|i, j, v| {
        let (gi, gj) = (meta.global_row(i), meta.global_col(j));
        if gi == gj {
            if conjugate {
                *v = T::from_real(v.real_part());
            }
        } else if !uplo.contains(gi, gj) {
            *v = flipped.get(i, j);
        }
    });
    Ok(())
}

/// `A := tril(A) + tril(A, -1)^T` for `Lower` (and the upper analogue).
pub fn make_symmetric<T: Scalar>(uplo: UpperOrLower, a: &mut DistMut<'_, T>) -> Result<()> {
    reflect(uplo, a, false)
}

/// Like [`make_symmetric`] with the conjugate transpose; the diagonal keeps
/// only its real part.
pub fn make_hermitian<T: Scalar>(uplo: UpperOrLower, a: &mut DistMut<'_, T>) -> Result<()> {
    reflect(uplo, a, true)
}

/// `B := A^T`.
pub fn transpose<T: Scalar>(a: &DistRef<'_, T>, b: &mut DistMut<'_, T>) -> Result<()> {
    transpose_copy(a, b, false)
}

/// `B := A^H`.
pub fn adjoint<T: Scalar>(a: &DistRef<'_, T>, b: &mut DistMut<'_, T>) -> Result<()> {
    transpose_copy(a, b, true)
}
