use crate::view::{IndexMap, MatrixMut, MatrixRef};
use crate::{Orientation, Scalar, UpperOrLower};
use rayon::prelude::*;

#[inline]
pub(crate) fn check_extent(len: usize, rows: usize, cols: usize, rs: usize, cs: usize) {
    if rows == 0 || cols == 0 {
        return;
    }
    let last = (rows - 1) * rs + (cols - 1) * cs;
    assert!(
        last < len,
        "strided {rows}x{cols} operand (rs={rs}, cs={cs}) overruns buffer of length {len}"
    );
}

/// `C := beta * C` on an `m x n` block; a zero `beta` clears the block.
pub(crate) fn scale_block<T: Scalar>(m: usize, n: usize, beta: T, c: &mut [T], ldc: usize) {
    if m == 0 || n == 0 {
        return;
    }
    for col in c.chunks_mut(ldc).take(n) {
        for x in &mut col[..m] {
            *x = if beta == T::zero() { T::zero() } else { beta * *x };
        }
    }
}

/// Portable fallback for [`Scalar::gemm_strided`].
///
/// Output columns are independent, so they are distributed over the rayon
/// pool. Each entry is a dot product accumulated in `k` order.
#[allow(clippy::too_many_arguments)]
pub(crate) fn gemm_loop<T: Scalar>(
    m: usize,
    n: usize,
    k: usize,
    alpha: T,
    a: &[T],
    (rsa, csa): (usize, usize),
    b: &[T],
    (rsb, csb): (usize, usize),
    beta: T,
    c: &mut [T],
    ldc: usize,
) {
    if m == 0 || n == 0 {
        return;
    }
    check_extent(a.len(), m, k, rsa, csa);
    check_extent(b.len(), k, n, rsb, csb);
    check_extent(c.len(), m, n, 1, ldc);

    c.par_chunks_mut(ldc)
        .take(n)
        .enumerate()
        .for_each(|(j, c_col)| {
            for (i, out) in c_col[..m].iter_mut().enumerate() {
                let mut sum = T::zero();
                for l in 0..k {
                    sum += a[i * rsa + l * csa] * b[l * rsb + j * csb];
                }
                *out = if beta == T::zero() {
                    alpha * sum
                } else {
                    alpha * sum + beta * *out
                };
            }
        });
}

/// Row/column strides under which `op(X)` can be read straight out of the
/// storage of `X`.
fn op_strides<T: Copy>(x: &MatrixRef<'_, T>, orient: Orientation) -> (usize, usize) {
    match orient {
        Orientation::Normal => (1, x.ldim()),
        Orientation::Transpose | Orientation::Adjoint => (x.ldim(), 1),
    }
}

fn op_shape<T: Copy>(x: &MatrixRef<'_, T>, orient: Orientation) -> (usize, usize) {
    match orient {
        Orientation::Normal => (x.height(), x.width()),
        Orientation::Transpose | Orientation::Adjoint => (x.width(), x.height()),
    }
}

/// Dense conjugated copy of `x`, so that an adjoint can be read as a transpose.
fn conjugated<T: Scalar>(x: &MatrixRef<'_, T>) -> Vec<T> {
    let mut out = x.to_vec();
    out.iter_mut().for_each(|v| *v = v.conjugate());
    out
}

/// General matrix-matrix product on local blocks.
///
/// Computes `C := alpha * op(A) * op(B) + beta * C`. For real element types
/// this bottoms out in `matrixmultiply`; complex adjoints are first
/// materialised as conjugated copies.
///
/// # Panics
///
/// If the shapes of `op(A)`, `op(B)` and `C` do not conform.
pub fn cpu_gemm<T: Scalar>(
    orient_a: Orientation,
    orient_b: Orientation,
    alpha: T,
    a: &MatrixRef<'_, T>,
    b: &MatrixRef<'_, T>,
    beta: T,
    c: &mut MatrixMut<'_, T>,
) {
    let (m, k) = op_shape(a, orient_a);
    let (kb, n) = op_shape(b, orient_b);
    assert!(
        k == kb && m == c.height() && n == c.width(),
        "gemm: op(A) is {m}x{k}, op(B) is {kb}x{n}, C is {}x{}",
        c.height(),
        c.width()
    );

    let a_conj;
    let a_view = if T::IS_COMPLEX && orient_a.conjugates() {
        a_conj = conjugated(a);
        MatrixRef::new(&a_conj, a.height(), a.width(), a.height().max(1))
    } else {
        *a
    };
    let b_conj;
    let b_view = if T::IS_COMPLEX && orient_b.conjugates() {
        b_conj = conjugated(b);
        MatrixRef::new(&b_conj, b.height(), b.width(), b.height().max(1))
    } else {
        *b
    };

    let ldc = c.ldim();
    T::gemm_strided(
        m,
        n,
        k,
        alpha,
        a_view.data(),
        op_strides(&a_view, orient_a),
        b_view.data(),
        op_strides(&b_view, orient_b),
        beta,
        c.data_mut(),
        ldc,
    );
}

/// Triangular rank-k update: `C := alpha * op(A) * op(B) + beta * C`, touching
/// only the entries of `C` whose *global* coordinates fall in `uplo`.
///
/// `rows` and `cols` translate local indices of `C` into global ones, which
/// lets the distributed rank-k updates mask a strided sample of a global
/// triangle. Pass [`IndexMap::IDENTITY`] for a purely local update.
#[allow(clippy::too_many_arguments)]
pub fn cpu_trrk<T: Scalar>(
    uplo: UpperOrLower,
    orient_a: Orientation,
    orient_b: Orientation,
    alpha: T,
    a: &MatrixRef<'_, T>,
    b: &MatrixRef<'_, T>,
    beta: T,
    c: &mut MatrixMut<'_, T>,
    rows: IndexMap,
    cols: IndexMap,
) {
    let (m, n) = (c.height(), c.width());
    if m == 0 || n == 0 {
        return;
    }
    let mut product = vec![T::zero(); m * n];
    {
        let mut p = MatrixMut::new(&mut product, m, n, m);
        cpu_gemm(orient_a, orient_b, alpha, a, b, T::zero(), &mut p);
    }
    for j in 0..n {
        let gj = cols.global(j);
        for i in 0..m {
            if uplo.contains(rows.global(i), gj) {
                let old = c.get(i, j);
                let scaled = if beta == T::zero() { T::zero() } else { beta * old };
                c.set(i, j, scaled + product[i + j * m]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex;

    fn naive(a: &[f64], b: &[f64], m: usize, k: usize, n: usize) -> Vec<f64> {
        let mut c = vec![0.0; m * n];
        for j in 0..n {
            for i in 0..m {
                for l in 0..k {
                    c[i + j * m] += a[i + l * m] * b[l + j * k];
                }
            }
        }
        c
    }

    #[test]
    fn test_gemm_simple() {
        // Column-major [[1, 2], [3, 4]] and [[5, 6], [7, 8]].
        let a = vec![1.0, 3.0, 2.0, 4.0];
        let b = vec![5.0, 7.0, 6.0, 8.0];
        let mut c = vec![0.0; 4];
        cpu_gemm(
            Orientation::Normal,
            Orientation::Normal,
            1.0,
            &MatrixRef::new(&a, 2, 2, 2),
            &MatrixRef::new(&b, 2, 2, 2),
            0.0,
            &mut MatrixMut::new(&mut c, 2, 2, 2),
        );
        // [[19, 22], [43, 50]] in column-major order.
        assert_eq!(c, vec![19.0, 43.0, 22.0, 50.0]);
    }

    #[test]
    fn test_gemm_transposed_operands_with_beta() {
        let (m, k, n) = (3, 4, 2);
        let a: Vec<f64> = (0..m * k).map(|x| x as f64 * 0.5 - 1.0).collect();
        let b: Vec<f64> = (0..k * n).map(|x| (x % 3) as f64 + 1.0).collect();
        let expected = naive(&a, &b, m, k, n);

        // Store A^T (k x m) and B^T (n x k), then ask for op = Transpose.
        let mut at = vec![0.0; k * m];
        for i in 0..m {
            for l in 0..k {
                at[l + i * k] = a[i + l * m];
            }
        }
        let mut bt = vec![0.0; n * k];
        for l in 0..k {
            for j in 0..n {
                bt[j + l * n] = b[l + j * k];
            }
        }
        let mut c = vec![1.0; m * n];
        cpu_gemm(
            Orientation::Transpose,
            Orientation::Adjoint,
            2.0,
            &MatrixRef::new(&at, k, m, k),
            &MatrixRef::new(&bt, n, k, n),
            -1.0,
            &mut MatrixMut::new(&mut c, m, n, m),
        );
        for (got, want) in c.iter().zip(expected.iter()) {
            assert!((got - (2.0 * want - 1.0)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_gemm_complex_adjoint() {
        // A = [[i]], so A^H * A = [[1]].
        let a = vec![Complex::new(0.0f64, 1.0)];
        let mut c = vec![Complex::new(5.0, 5.0)];
        let av = MatrixRef::new(&a, 1, 1, 1);
        cpu_gemm(
            Orientation::Adjoint,
            Orientation::Normal,
            Complex::new(1.0, 0.0),
            &av,
            &av,
            Complex::new(0.0, 0.0),
            &mut MatrixMut::new(&mut c, 1, 1, 1),
        );
        assert_eq!(c[0], Complex::new(1.0, 0.0));
    }

    #[test]
    fn test_gemm_empty_inner_dimension_scales() {
        let a: Vec<f64> = vec![];
        let mut c = vec![2.0; 4];
        cpu_gemm(
            Orientation::Normal,
            Orientation::Normal,
            1.0,
            &MatrixRef::new(&a, 2, 0, 2),
            &MatrixRef::new(&a, 0, 2, 1),
            3.0,
            &mut MatrixMut::new(&mut c, 2, 2, 2),
        );
        assert_eq!(c, vec![6.0; 4]);
    }

    #[test]
    #[should_panic(expected = "gemm")]
    fn test_gemm_shape_mismatch() {
        let a = vec![1.0f64; 4];
        let b = vec![1.0f64; 6];
        let mut c = vec![0.0f64; 6];
        cpu_gemm(
            Orientation::Normal,
            Orientation::Normal,
            1.0,
            &MatrixRef::new(&a, 2, 2, 2),
            &MatrixRef::new(&b, 3, 2, 3),
            0.0,
            &mut MatrixMut::new(&mut c, 2, 3, 2),
        );
    }

    #[test]
    fn test_trrk_masks_global_triangle() {
        // Local block holds global rows {1, 3} and columns {0, 2}.
        let a = vec![1.0f64, 1.0];
        let b = vec![1.0f64, 1.0];
        let mut c = vec![0.0f64; 4];
        cpu_trrk(
            UpperOrLower::Lower,
            Orientation::Normal,
            Orientation::Normal,
            1.0,
            &MatrixRef::new(&a, 2, 1, 2),
            &MatrixRef::new(&b, 1, 2, 1),
            0.0,
            &mut MatrixMut::new(&mut c, 2, 2, 2),
            IndexMap::new(1, 2),
            IndexMap::new(0, 2),
        );
        // (1,0) (3,0) (3,2) are on or below the diagonal, (1,2) is not.
        assert_eq!(c, vec![1.0, 1.0, 0.0, 1.0]);
    }
}
