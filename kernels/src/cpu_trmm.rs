use crate::cpu_gemm::cpu_gemm;
use crate::cpu_trsm::dense_op_triangle;
use crate::view::{MatrixMut, MatrixRef};
use crate::{Orientation, Scalar, Side, UnitOrNonUnit, UpperOrLower};

/// Triangular matrix-matrix product.
///
/// Overwrites `B` with `alpha * op(A) * B` (`Side::Left`) or
/// `alpha * B * op(A)` (`Side::Right`), reading only the `uplo` triangle of `A`.
pub fn cpu_trmm<T: Scalar>(
    side: Side,
    uplo: UpperOrLower,
    orient: Orientation,
    diag: UnitOrNonUnit,
    alpha: T,
    a: &MatrixRef<'_, T>,
    b: &mut MatrixMut<'_, T>,
) {
    let n = a.height();
    assert_eq!(n, a.width(), "trmm: triangle must be square, got {}x{}", n, a.width());
    let conforms = match side {
        Side::Left => b.height() == n,
        Side::Right => b.width() == n,
    };
    assert!(
        conforms,
        "trmm: {n}x{n} triangle does not conform with {}x{} on the {side:?}",
        b.height(),
        b.width()
    );
    let (m, w) = (b.height(), b.width());
    if m == 0 || w == 0 {
        return;
    }

    let (t, _) = dense_op_triangle(uplo, orient, diag, a);
    let tv = MatrixRef::new(&t, n, n, n.max(1));
    let original = b.as_ref().to_vec();
    let bv = MatrixRef::new(&original, m, w, m);
    match side {
        Side::Left => cpu_gemm(Orientation::Normal, Orientation::Normal, alpha, &tv, &bv, T::zero(), b),
        Side::Right => cpu_gemm(Orientation::Normal, Orientation::Normal, alpha, &bv, &tv, T::zero(), b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trmm_left_upper() {
        // Upper [[1, 2], [junk, 3]] times [[1], [1]].
        let a = vec![1.0f64, 100.0, 2.0, 3.0];
        let mut b = vec![1.0, 1.0];
        cpu_trmm(
            Side::Left,
            UpperOrLower::Upper,
            Orientation::Normal,
            UnitOrNonUnit::NonUnit,
            1.0,
            &MatrixRef::new(&a, 2, 2, 2),
            &mut MatrixMut::new(&mut b, 2, 1, 2),
        );
        assert_eq!(b, vec![3.0, 3.0]);
    }

    #[test]
    fn test_trmm_right_lower_transpose_unit() {
        // op(L) = L^T with L = [[1, 0], [4, 1]] (unit), so B * L^T = [1, 1] * [[1, 4], [0, 1]].
        let a = vec![5.0f64, 4.0, 8.0, 5.0];
        let mut b = vec![1.0, 1.0];
        cpu_trmm(
            Side::Right,
            UpperOrLower::Lower,
            Orientation::Transpose,
            UnitOrNonUnit::Unit,
            2.0,
            &MatrixRef::new(&a, 2, 2, 2),
            &mut MatrixMut::new(&mut b, 1, 2, 1),
        );
        assert_eq!(b, vec![2.0, 10.0]);
    }
}
