use crate::view::MatrixMut;
use crate::{KernelError, Result, Scalar};

/// Unblocked right-looking LU factorisation without pivoting.
///
/// On success `A` holds `L` strictly below the diagonal (unit diagonal
/// implied) and `U` on and above it. An exactly zero pivot stops the
/// factorisation with [`KernelError::Singular`]; entries at and beyond that
/// pivot are left partially updated.
pub fn cpu_lu<T: Scalar>(a: &mut MatrixMut<'_, T>) -> Result<()> {
    let (m, n) = (a.height(), a.width());
    for k in 0..m.min(n) {
        let pivot = a.get(k, k);
        if pivot == T::zero() {
            return Err(KernelError::Singular { index: k });
        }
        let inv = T::one() / pivot;
        for i in k + 1..m {
            let v = a.get(i, k) * inv;
            a.set(i, k, v);
        }
        for j in k + 1..n {
            let akj = a.get(k, j);
            if akj == T::zero() {
                continue;
            }
            for i in k + 1..m {
                let v = a.get(i, j) - a.get(i, k) * akj;
                a.set(i, j, v);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lu_reconstructs() {
        // [[4, 3], [6, 3]] = [[1, 0], [1.5, 1]] * [[4, 3], [0, -1.5]].
        let mut a = vec![4.0f64, 6.0, 3.0, 3.0];
        cpu_lu(&mut MatrixMut::new(&mut a, 2, 2, 2)).unwrap();
        assert_eq!(a, vec![4.0, 1.5, 3.0, -1.5]);
    }

    #[test]
    fn test_lu_zero_pivot_is_singular() {
        // [[0, 1], [1, 1]] has no unpivoted LU.
        let mut a = vec![0.0f64, 1.0, 1.0, 1.0];
        let err = cpu_lu(&mut MatrixMut::new(&mut a, 2, 2, 2));
        assert_eq!(err, Err(KernelError::Singular { index: 0 }));
    }

    #[test]
    fn test_lu_trailing_zero_pivot() {
        // [[1, 2], [2, 4]] is rank one: the second pivot vanishes exactly.
        let mut a = vec![1.0f64, 2.0, 2.0, 4.0];
        let err = cpu_lu(&mut MatrixMut::new(&mut a, 2, 2, 2));
        assert_eq!(err, Err(KernelError::Singular { index: 1 }));
    }
}
