use crate::cpu_trsm::check_diagonal;
use crate::view::MatrixMut;
use crate::{Result, Scalar, UnitOrNonUnit, UpperOrLower};

/// In-place inversion of the `uplo` triangle of `A`.
///
/// The opposite triangle is neither read nor written. With
/// `UnitOrNonUnit::Unit` the stored diagonal is ignored and left untouched.
pub fn cpu_trinv<T: Scalar>(
    uplo: UpperOrLower,
    diag: UnitOrNonUnit,
    a: &mut MatrixMut<'_, T>,
) -> Result<()> {
    let n = a.height();
    assert_eq!(n, a.width(), "trinv: triangle must be square, got {}x{}", n, a.width());
    check_diagonal(diag, &a.as_ref())?;
    let unit = diag == UnitOrNonUnit::Unit;

    match uplo {
        UpperOrLower::Upper => {
            // Column j of inv(U) above the diagonal is -inv(U00) u01 / u11,
            // where inv(U00) already occupies the leading j x j block.
            for j in 0..n {
                let ajj = if unit {
                    -T::one()
                } else {
                    let inv = T::one() / a.get(j, j);
                    a.set(j, j, inv);
                    -inv
                };
                for i in 0..j {
                    let mut sum = if unit { a.get(i, j) } else { a.get(i, i) * a.get(i, j) };
                    for k in i + 1..j {
                        sum += a.get(i, k) * a.get(k, j);
                    }
                    a.set(i, j, sum);
                }
                for i in 0..j {
                    let v = a.get(i, j) * ajj;
                    a.set(i, j, v);
                }
            }
        }
        UpperOrLower::Lower => {
            for j in (0..n).rev() {
                let ajj = if unit {
                    -T::one()
                } else {
                    let inv = T::one() / a.get(j, j);
                    a.set(j, j, inv);
                    -inv
                };
                for i in (j + 1..n).rev() {
                    let mut sum = if unit { a.get(i, j) } else { a.get(i, i) * a.get(i, j) };
                    for k in j + 1..i {
                        sum += a.get(i, k) * a.get(k, j);
                    }
                    a.set(i, j, sum);
                }
                for i in j + 1..n {
                    let v = a.get(i, j) * ajj;
                    a.set(i, j, v);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KernelError;

    fn product_is_identity(t: &[f64], inv: &[f64], n: usize, uplo: UpperOrLower) {
        for i in 0..n {
            for j in 0..n {
                let mut s = 0.0;
                for k in 0..n {
                    let tik = if uplo.contains(i, k) { t[i + k * n] } else { 0.0 };
                    let ikj = if uplo.contains(k, j) { inv[k + j * n] } else { 0.0 };
                    s += tik * ikj;
                }
                let want = if i == j { 1.0 } else { 0.0 };
                assert!((s - want).abs() < 1e-12, "({i}, {j}) = {s}");
            }
        }
    }

    #[test]
    fn test_trinv_upper_and_lower() {
        let n = 4;
        let base: Vec<f64> = (0..n * n)
            .map(|x| if x % (n + 1) == 0 { 2.0 + x as f64 * 0.1 } else { (x % 5) as f64 - 2.0 })
            .collect();
        for uplo in [UpperOrLower::Upper, UpperOrLower::Lower] {
            let mut inv = base.clone();
            cpu_trinv(uplo, UnitOrNonUnit::NonUnit, &mut MatrixMut::new(&mut inv, n, n, n)).unwrap();
            product_is_identity(&base, &inv, n, uplo);
        }
    }

    #[test]
    fn test_trinv_unit_lower() {
        // [[1, 0], [3, 1]]^-1 = [[1, 0], [-3, 1]]; the stored diagonal is junk.
        let mut a = vec![9.0f64, 3.0, 0.0, 9.0];
        cpu_trinv(UpperOrLower::Lower, UnitOrNonUnit::Unit, &mut MatrixMut::new(&mut a, 2, 2, 2)).unwrap();
        assert_eq!(a, vec![9.0, -3.0, 0.0, 9.0]);
    }

    #[test]
    fn test_trinv_singular() {
        let mut a = vec![1.0f64, 0.0, 0.0, 0.0];
        let err = cpu_trinv(UpperOrLower::Upper, UnitOrNonUnit::NonUnit, &mut MatrixMut::new(&mut a, 2, 2, 2));
        assert_eq!(err, Err(KernelError::Singular { index: 1 }));
    }
}
