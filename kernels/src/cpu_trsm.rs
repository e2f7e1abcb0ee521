use crate::view::{MatrixMut, MatrixRef};
use crate::{KernelError, Orientation, Result, Scalar, Side, UnitOrNonUnit, UpperOrLower};
use rayon::prelude::*;

/// Dense copy of `op(tri(A))` together with the triangle it occupies.
///
/// Entries outside the triangle are zero; unit triangles get an explicit
/// unit diagonal so the solve loops never branch on `diag`.
pub(crate) fn dense_op_triangle<T: Scalar>(
    uplo: UpperOrLower,
    orient: Orientation,
    diag: UnitOrNonUnit,
    a: &MatrixRef<'_, T>,
) -> (Vec<T>, UpperOrLower) {
    let n = a.height();
    let mut t = vec![T::zero(); n * n];
    for j in 0..n {
        for i in 0..n {
            if !uplo.contains(i, j) {
                continue;
            }
            let v = a.get(i, j);
            match orient {
                Orientation::Normal => t[i + j * n] = v,
                Orientation::Transpose => t[j + i * n] = v,
                Orientation::Adjoint => t[j + i * n] = v.conjugate(),
            }
        }
    }
    if diag == UnitOrNonUnit::Unit {
        for i in 0..n {
            t[i + i * n] = T::one();
        }
    }
    let effective = if orient.is_normal() { uplo } else { uplo.flip() };
    (t, effective)
}

/// First zero on the diagonal of a non-unit triangle.
pub(crate) fn check_diagonal<T: Scalar>(diag: UnitOrNonUnit, a: &MatrixRef<'_, T>) -> Result<()> {
    if diag == UnitOrNonUnit::NonUnit {
        if let Some(index) = (0..a.height()).find(|&i| a.get(i, i) == T::zero()) {
            return Err(KernelError::Singular { index });
        }
    }
    Ok(())
}

/// Triangular solve with multiple right-hand sides.
///
/// Overwrites `B` with `X`, where `op(A) X = alpha B` (`Side::Left`) or
/// `X op(A) = alpha B` (`Side::Right`). Only the `uplo` triangle of `A` is read.
///
/// The diagonal is checked before any right-hand side is touched, so every
/// process that holds the same triangle reports the same
/// [`KernelError::Singular`] regardless of how many columns of `B` it owns.
pub fn cpu_trsm<T: Scalar>(
    side: Side,
    uplo: UpperOrLower,
    orient: Orientation,
    diag: UnitOrNonUnit,
    alpha: T,
    a: &MatrixRef<'_, T>,
    b: &mut MatrixMut<'_, T>,
) -> Result<()> {
    let n = a.height();
    assert_eq!(n, a.width(), "trsm: triangle must be square, got {}x{}", n, a.width());
    match side {
        Side::Left => assert_eq!(
            n,
            b.height(),
            "trsm: {n}x{n} triangle cannot solve from the left against {}x{}",
            b.height(),
            b.width()
        ),
        Side::Right => assert_eq!(
            n,
            b.width(),
            "trsm: {n}x{n} triangle cannot solve from the right against {}x{}",
            b.height(),
            b.width()
        ),
    }
    check_diagonal(diag, a)?;

    let (m, w) = (b.height(), b.width());
    if m == 0 || w == 0 {
        return Ok(());
    }
    let (t, effective) = dense_op_triangle(uplo, orient, diag, a);
    if alpha != T::one() {
        b.for_each_mut(|_, _, x| *x *= alpha);
    }

    match side {
        Side::Left => {
            let ldb = b.ldim();
            b.data_mut()
                .par_chunks_mut(ldb)
                .take(w)
                .for_each(|col| solve_left_column(&t, n, effective, &mut col[..m]));
        }
        Side::Right => solve_right(&t, n, effective, b),
    }
    Ok(())
}

fn solve_left_column<T: Scalar>(t: &[T], n: usize, uplo: UpperOrLower, x: &mut [T]) {
    match uplo {
        UpperOrLower::Lower => {
            for k in 0..n {
                x[k] /= t[k + k * n];
                let xk = x[k];
                for i in k + 1..n {
                    x[i] -= t[i + k * n] * xk;
                }
            }
        }
        UpperOrLower::Upper => {
            for k in (0..n).rev() {
                x[k] /= t[k + k * n];
                let xk = x[k];
                for i in 0..k {
                    x[i] -= t[i + k * n] * xk;
                }
            }
        }
    }
}

fn solve_right<T: Scalar>(t: &[T], n: usize, uplo: UpperOrLower, b: &mut MatrixMut<'_, T>) {
    let m = b.height();
    let order: Vec<usize> = match uplo {
        UpperOrLower::Upper => (0..n).collect(),
        UpperOrLower::Lower => (0..n).rev().collect(),
    };
    for &j in &order {
        let solved: Vec<usize> = match uplo {
            UpperOrLower::Upper => (0..j).collect(),
            UpperOrLower::Lower => (j + 1..n).collect(),
        };
        for &k in &solved {
            let tkj = t[k + j * n];
            if tkj == T::zero() {
                continue;
            }
            for i in 0..m {
                let v = b.get(i, j) - b.get(i, k) * tkj;
                b.set(i, j, v);
            }
        }
        let tjj = t[j + j * n];
        for i in 0..m {
            let v = b.get(i, j) / tjj;
            b.set(i, j, v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu_gemm;

    // Lower triangle [[2, 0, 0], [1, 3, 0], [4, -1, 5]] in column-major order,
    // with junk above the diagonal that must never be read.
    fn lower() -> Vec<f64> {
        vec![2.0, 1.0, 4.0, 9.0, 3.0, -1.0, 9.0, 9.0, 5.0]
    }

    fn apply(
        side: Side,
        uplo: UpperOrLower,
        orient: Orientation,
        a: &[f64],
        x: &[f64],
        rows: usize,
        cols: usize,
    ) -> Vec<f64> {
        let (t, _) = dense_op_triangle(uplo, orient, UnitOrNonUnit::NonUnit, &MatrixRef::new(a, 3, 3, 3));
        let mut out = vec![0.0; rows * cols];
        let tv = MatrixRef::new(&t, 3, 3, 3);
        let xv = MatrixRef::new(x, rows, cols, rows);
        let mut ov = MatrixMut::new(&mut out, rows, cols, rows);
        match side {
            Side::Left => cpu_gemm(Orientation::Normal, Orientation::Normal, 1.0, &tv, &xv, 0.0, &mut ov),
            Side::Right => cpu_gemm(Orientation::Normal, Orientation::Normal, 1.0, &xv, &tv, 0.0, &mut ov),
        }
        out
    }

    #[test]
    fn test_trsm_left_and_right_all_orientations() {
        let a = lower();
        let x: Vec<f64> = (0..6).map(|v| v as f64 - 2.5).collect();
        for orient in [Orientation::Normal, Orientation::Transpose, Orientation::Adjoint] {
            // Left: A is 3x3, X is 3x2.
            let mut b = apply(Side::Left, UpperOrLower::Lower, orient, &a, &x, 3, 2);
            cpu_trsm(
                Side::Left,
                UpperOrLower::Lower,
                orient,
                UnitOrNonUnit::NonUnit,
                1.0,
                &MatrixRef::new(&a, 3, 3, 3),
                &mut MatrixMut::new(&mut b, 3, 2, 3),
            )
            .unwrap();
            for (got, want) in b.iter().zip(&x) {
                assert!((got - want).abs() < 1e-12, "{orient:?} left");
            }

            // Right: X is 2x3.
            let mut b = apply(Side::Right, UpperOrLower::Lower, orient, &a, &x, 2, 3);
            cpu_trsm(
                Side::Right,
                UpperOrLower::Lower,
                orient,
                UnitOrNonUnit::NonUnit,
                1.0,
                &MatrixRef::new(&a, 3, 3, 3),
                &mut MatrixMut::new(&mut b, 2, 3, 2),
            )
            .unwrap();
            for (got, want) in b.iter().zip(&x) {
                assert!((got - want).abs() < 1e-12, "{orient:?} right");
            }
        }
    }

    #[test]
    fn test_trsm_unit_diagonal_and_alpha() {
        // Unit lower [[1, 0], [2, 1]] with a zero stored on the diagonal.
        let a = vec![0.0, 2.0, 7.0, 0.0];
        let mut b = vec![1.0, 4.0];
        cpu_trsm(
            Side::Left,
            UpperOrLower::Lower,
            Orientation::Normal,
            UnitOrNonUnit::Unit,
            2.0,
            &MatrixRef::new(&a, 2, 2, 2),
            &mut MatrixMut::new(&mut b, 2, 1, 2),
        )
        .unwrap();
        assert_eq!(b, vec![2.0, 4.0]);
    }

    #[test]
    fn test_trsm_reports_zero_pivot_even_without_columns() {
        let a = vec![1.0, 0.0, 0.0, 0.0];
        let mut b: Vec<f64> = vec![];
        let err = cpu_trsm(
            Side::Left,
            UpperOrLower::Upper,
            Orientation::Normal,
            UnitOrNonUnit::NonUnit,
            1.0,
            &MatrixRef::new(&a, 2, 2, 2),
            &mut MatrixMut::new(&mut b, 2, 0, 2),
        );
        assert_eq!(err, Err(KernelError::Singular { index: 1 }));
    }
}
