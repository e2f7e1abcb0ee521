use crate::view::MatrixMut;
use crate::{KernelError, RealScalar, Result};

const MAX_SWEEPS: usize = 64;

/// Cyclic Jacobi eigensolver for a real symmetric matrix.
///
/// `a` must hold the full symmetric matrix and is destroyed: on return its
/// diagonal carries the eigenvalues. `z` receives the orthonormal
/// eigenvectors as columns, so that `A = Z diag(w) Z^T`. The returned
/// eigenvalues are in the order the rotations left them; callers sort.
pub fn cpu_jacobi_eig<R: RealScalar>(a: &mut MatrixMut<'_, R>, z: &mut MatrixMut<'_, R>) -> Result<Vec<R>> {
    let n = a.height();
    assert_eq!(n, a.width(), "jacobi: matrix must be square, got {}x{}", n, a.width());
    assert!(
        z.height() == n && z.width() == n,
        "jacobi: eigenvector block must be {n}x{n}, got {}x{}",
        z.height(),
        z.width()
    );
    z.for_each_mut(|i, j, x| *x = if i == j { R::one() } else { R::zero() });

    let two = R::one() + R::one();
    let mut total = R::zero();
    a.for_each_mut(|_, _, x| total = total + *x * *x);
    // Off-diagonal mass below (4 n eps ||A||_F)^2 is rounding noise.
    let scale = R::from_f64_parts(4.0 * n as f64, 0.0) * R::epsilon();
    let tol = scale * scale * total;

    for _ in 0..MAX_SWEEPS {
        let mut off = R::zero();
        for j in 0..n {
            for i in 0..n {
                if i != j {
                    off = off + a.get(i, j) * a.get(i, j);
                }
            }
        }
        if off <= tol {
            return Ok((0..n).map(|i| a.get(i, i)).collect());
        }

        for p in 0..n {
            for q in p + 1..n {
                let apq = a.get(p, q);
                if apq == R::zero() {
                    continue;
                }
                let theta = (a.get(q, q) - a.get(p, p)) / (two * apq);
                let sign = if theta < R::zero() { -R::one() } else { R::one() };
                let t = sign / (theta.abs() + (theta * theta + R::one()).sqrt());
                let c = R::one() / (t * t + R::one()).sqrt();
                let s = t * c;
                rotate(a, z, p, q, c, s);
            }
        }
    }
    Err(KernelError::NoConvergence { sweeps: MAX_SWEEPS })
}

/// `A := J^T A J` and `Z := Z J` for the plane rotation `J` acting on `(p, q)`.
fn rotate<R: RealScalar>(a: &mut MatrixMut<'_, R>, z: &mut MatrixMut<'_, R>, p: usize, q: usize, c: R, s: R) {
    let n = a.height();
    for k in 0..n {
        let (akp, akq) = (a.get(k, p), a.get(k, q));
        a.set(k, p, c * akp - s * akq);
        a.set(k, q, s * akp + c * akq);
    }
    for k in 0..n {
        let (apk, aqk) = (a.get(p, k), a.get(q, k));
        a.set(p, k, c * apk - s * aqk);
        a.set(q, k, s * apk + c * aqk);
    }
    for k in 0..n {
        let (zkp, zkq) = (z.get(k, p), z.get(k, q));
        z.set(k, p, c * zkp - s * zkq);
        z.set(k, q, s * zkp + c * zkq);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jacobi_two_by_two() {
        // [[2, 1], [1, 2]] has eigenvalues 1 and 3.
        let mut a = vec![2.0f64, 1.0, 1.0, 2.0];
        let mut z = vec![0.0f64; 4];
        let mut w = cpu_jacobi_eig(&mut MatrixMut::new(&mut a, 2, 2, 2), &mut MatrixMut::new(&mut z, 2, 2, 2)).unwrap();
        w.sort_by(|x, y| x.partial_cmp(y).unwrap());
        assert!((w[0] - 1.0).abs() < 1e-12);
        assert!((w[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_jacobi_reconstructs() {
        let n = 5;
        let mut a = vec![0.0f64; n * n];
        for j in 0..n {
            for i in 0..n {
                a[i + j * n] = 1.0 / ((i + j + 1) as f64) + if i == j { i as f64 } else { 0.0 };
            }
        }
        let original = a.clone();
        let mut z = vec![0.0f64; n * n];
        let w = cpu_jacobi_eig(&mut MatrixMut::new(&mut a, n, n, n), &mut MatrixMut::new(&mut z, n, n, n)).unwrap();
        for i in 0..n {
            for j in 0..n {
                let s: f64 = (0..n).map(|k| z[i + k * n] * w[k] * z[j + k * n]).sum();
                assert!((s - original[i + j * n]).abs() < 1e-10);
            }
        }
    }
}
