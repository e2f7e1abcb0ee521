use crate::Scalar;
use crate::view::{MatrixMut, MatrixRef};
use rayon::prelude::*;

/// Writes `A^T` (or `A^H` when `conjugate` is set) into `B`.
///
/// We parallelise over the columns of the output: column `j` of `B` is row
/// `j` of `A`, gathered with stride `ldim(A)`.
///
/// # Panics
///
/// If `B` is not `width(A) x height(A)`.
pub fn cpu_transpose<T: Scalar>(a: &MatrixRef<'_, T>, b: &mut MatrixMut<'_, T>, conjugate: bool) {
    let (m, n) = (a.height(), a.width());
    assert!(
        b.height() == n && b.width() == m,
        "transpose: A is {m}x{n} but B is {}x{}",
        b.height(),
        b.width()
    );
    if m == 0 || n == 0 {
        return;
    }
    let lda = a.ldim();
    let ldb = b.ldim();
    let src = a.data();
    b.data_mut()
        .par_chunks_mut(ldb)
        .take(m)
        .enumerate()
        .for_each(|(i, out_col)| {
            // Output column `i` is input row `i`.
            for (j, out) in out_col[..n].iter_mut().enumerate() {
                let v = src[i + j * lda];
                *out = if conjugate { v.conjugate() } else { v };
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex;

    #[test]
    fn test_transpose_simple() {
        // 2x3 column-major: [[1, 2, 3], [4, 5, 6]].
        let data = vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0];
        let mut out = vec![0.0; 6];
        cpu_transpose(
            &MatrixRef::new(&data, 2, 3, 2),
            &mut MatrixMut::new(&mut out, 3, 2, 3),
            false,
        );
        // 3x2: [[1, 4], [2, 5], [3, 6]].
        assert_eq!(out, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_transpose_strided_source() {
        // 2x2 block living inside a 3-row buffer.
        let data = vec![1.0, 2.0, 99.0, 3.0, 4.0, 99.0];
        let mut out = vec![0.0; 4];
        cpu_transpose(
            &MatrixRef::new(&data, 2, 2, 3),
            &mut MatrixMut::new(&mut out, 2, 2, 2),
            false,
        );
        assert_eq!(out, vec![1.0, 3.0, 2.0, 4.0]);
    }

    #[test]
    fn test_adjoint_conjugates() {
        let data = vec![Complex::new(1.0f64, 2.0), Complex::new(3.0, -1.0)];
        let mut out = vec![Complex::new(0.0, 0.0); 2];
        cpu_transpose(
            &MatrixRef::new(&data, 2, 1, 2),
            &mut MatrixMut::new(&mut out, 1, 2, 1),
            true,
        );
        assert_eq!(out, vec![Complex::new(1.0, -2.0), Complex::new(3.0, 1.0)]);
    }
}
