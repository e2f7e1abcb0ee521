//! # gridla-kernels
//!
//! Single-process dense kernels over column-major, strided storage.
//!
//! Every routine here works on one process's local block and never
//! communicates. The distributed algorithms in `gridla` partition a global
//! matrix into panels, move those panels into layouts where the work is
//! purely local, and then call into this crate for the flops.
//!
//! ## Conventions
//!
//! * Storage is column-major with a leading dimension (`ldim`), exactly like
//!   BLAS: entry `(i, j)` lives at `data[i + j * ldim]`.
//! * Shape mismatches are programmer errors and panic with the offending
//!   shapes. Only numerical breakdown (a zero pivot, a solver that did not
//!   converge) is reported through [`KernelError`].
//! * Real `gemm` is delegated to `matrixmultiply`; everything else is a plain
//!   loop, parallelised with `rayon` where the columns are independent.

use num_complex::Complex;
use num_traits::{Float, Num, NumAssign};
use std::fmt::Debug;
use std::ops::Neg;
use thiserror::Error;

pub mod cpu_gemm;
pub mod cpu_jacobi;
pub mod cpu_lu;
pub mod cpu_transpose;
pub mod cpu_trinv;
pub mod cpu_trmm;
pub mod cpu_trsm;
pub mod view;

pub use cpu_gemm::{cpu_gemm, cpu_trrk};
pub use cpu_jacobi::cpu_jacobi_eig;
pub use cpu_lu::cpu_lu;
pub use cpu_transpose::cpu_transpose;
pub use cpu_trinv::cpu_trinv;
pub use cpu_trmm::cpu_trmm;
pub use cpu_trsm::cpu_trsm;
pub use view::{IndexMap, MatrixMut, MatrixRef};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// A diagonal entry that must be inverted is exactly zero.
    #[error("Singular matrix: zero pivot at diagonal index {index}")]
    Singular { index: usize },
    /// An iterative kernel ran out of sweeps.
    #[error("No convergence after {sweeps} sweeps")]
    NoConvergence { sweeps: usize },
}

impl KernelError {
    /// Shifts a pivot index reported for a diagonal block into the index
    /// space of the enclosing matrix.
    pub fn offset(self, by: usize) -> Self {
        match self {
            KernelError::Singular { index } => KernelError::Singular { index: index + by },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, KernelError>;

/// How an operand enters a product: as stored, transposed, or conjugate-transposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Normal,
    Transpose,
    Adjoint,
}

impl Orientation {
    pub fn is_normal(self) -> bool {
        self == Orientation::Normal
    }

    pub fn conjugates(self) -> bool {
        self == Orientation::Adjoint
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpperOrLower {
    Lower,
    Upper,
}

impl UpperOrLower {
    pub fn flip(self) -> Self {
        match self {
            UpperOrLower::Lower => UpperOrLower::Upper,
            UpperOrLower::Upper => UpperOrLower::Lower,
        }
    }

    /// Whether global entry `(i, j)` lies in this triangle (diagonal included).
    #[inline]
    pub fn contains(self, i: usize, j: usize) -> bool {
        match self {
            UpperOrLower::Lower => i >= j,
            UpperOrLower::Upper => i <= j,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitOrNonUnit {
    NonUnit,
    Unit,
}

/// Element type accepted by every kernel.
///
/// Implemented for `f32`, `f64`, `Complex<f32>` and `Complex<f64>`. The
/// method names avoid clashing with `Float` so generic code over
/// [`RealScalar`] stays unambiguous.
pub trait Scalar:
    Num + NumAssign + Neg<Output = Self> + Copy + Debug + PartialEq + Send + Sync + 'static
{
    type Real: RealScalar;

    const IS_COMPLEX: bool;

    fn conjugate(self) -> Self;
    fn magnitude(self) -> Self::Real;
    fn real_part(self) -> Self::Real;
    fn imag_part(self) -> Self::Real;
    fn from_real(re: Self::Real) -> Self;
    fn from_f64_parts(re: f64, im: f64) -> Self;

    #[inline]
    fn magnitude_squared(self) -> Self::Real {
        let (re, im) = (self.real_part(), self.imag_part());
        re * re + im * im
    }

    /// `C := alpha * A * B + beta * C` over raw strides, with `A` m x k,
    /// `B` k x n and `C` m x n stored column-major with leading dimension `ldc`.
    ///
    /// When `beta` is zero the previous contents of `C` are ignored.
    #[allow(clippy::too_many_arguments)]
    fn gemm_strided(
        m: usize,
        n: usize,
        k: usize,
        alpha: Self,
        a: &[Self],
        (rsa, csa): (usize, usize),
        b: &[Self],
        (rsb, csb): (usize, usize),
        beta: Self,
        c: &mut [Self],
        ldc: usize,
    ) {
        cpu_gemm::gemm_loop(m, n, k, alpha, a, (rsa, csa), b, (rsb, csb), beta, c, ldc)
    }
}

/// Real field used for norms, eigenvalues and Householder scalars.
pub trait RealScalar: Scalar<Real = Self> + Float {}

impl RealScalar for f32 {}
impl RealScalar for f64 {}

macro_rules! impl_real_scalar {
    ($t:ty, $gemm:path) => {
        impl Scalar for $t {
            type Real = $t;

            const IS_COMPLEX: bool = false;

            #[inline]
            fn conjugate(self) -> Self {
                self
            }
            #[inline]
            fn magnitude(self) -> Self {
                self.abs()
            }
            #[inline]
            fn real_part(self) -> Self {
                self
            }
            #[inline]
            fn imag_part(self) -> Self {
                0.0
            }
            #[inline]
            fn from_real(re: Self) -> Self {
                re
            }
            #[inline]
            fn from_f64_parts(re: f64, _im: f64) -> Self {
                re as $t
            }

            fn gemm_strided(
                m: usize,
                n: usize,
                k: usize,
                alpha: Self,
                a: &[Self],
                (rsa, csa): (usize, usize),
                b: &[Self],
                (rsb, csb): (usize, usize),
                beta: Self,
                c: &mut [Self],
                ldc: usize,
            ) {
                if m == 0 || n == 0 {
                    return;
                }
                if k == 0 {
                    cpu_gemm::scale_block(m, n, beta, c, ldc);
                    return;
                }
                cpu_gemm::check_extent(a.len(), m, k, rsa, csa);
                cpu_gemm::check_extent(b.len(), k, n, rsb, csb);
                cpu_gemm::check_extent(c.len(), m, n, 1, ldc);
                // SAFETY: the extents of all three operands were checked against
                // their slices above, and `c` is uniquely borrowed.
                unsafe {
                    $gemm(
                        m,
                        k,
                        n,
                        alpha,
                        a.as_ptr(),
                        rsa as isize,
                        csa as isize,
                        b.as_ptr(),
                        rsb as isize,
                        csb as isize,
                        beta,
                        c.as_mut_ptr(),
                        1,
                        ldc as isize,
                    );
                }
            }
        }
    };
}

impl_real_scalar!(f32, matrixmultiply::sgemm);
impl_real_scalar!(f64, matrixmultiply::dgemm);

macro_rules! impl_complex_scalar {
    ($r:ty) => {
        impl Scalar for Complex<$r> {
            type Real = $r;

            const IS_COMPLEX: bool = true;

            #[inline]
            fn conjugate(self) -> Self {
                self.conj()
            }
            #[inline]
            fn magnitude(self) -> $r {
                self.norm()
            }
            #[inline]
            fn real_part(self) -> $r {
                self.re
            }
            #[inline]
            fn imag_part(self) -> $r {
                self.im
            }
            #[inline]
            fn from_real(re: $r) -> Self {
                Complex::new(re, 0.0)
            }
            #[inline]
            fn from_f64_parts(re: f64, im: f64) -> Self {
                Complex::new(re as $r, im as $r)
            }
        }
    };
}

impl_complex_scalar!(f32);
impl_complex_scalar!(f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_membership() {
        assert!(UpperOrLower::Lower.contains(3, 1));
        assert!(UpperOrLower::Lower.contains(2, 2));
        assert!(!UpperOrLower::Lower.contains(0, 1));
        assert!(UpperOrLower::Upper.contains(0, 1));
        assert_eq!(UpperOrLower::Upper.flip(), UpperOrLower::Lower);
    }

    #[test]
    fn test_complex_scalar_parts() {
        let z = Complex::new(3.0f64, -4.0);
        assert_eq!(z.magnitude(), 5.0);
        assert_eq!(z.conjugate(), Complex::new(3.0, 4.0));
        assert_eq!(z.magnitude_squared(), 25.0);
        assert_eq!(<Complex<f64> as Scalar>::from_real(2.0), Complex::new(2.0, 0.0));
    }

    #[test]
    fn test_singular_offset() {
        let err = KernelError::Singular { index: 2 }.offset(10);
        assert_eq!(err, KernelError::Singular { index: 12 });
        let err = KernelError::NoConvergence { sweeps: 5 }.offset(10);
        assert_eq!(err, KernelError::NoConvergence { sweeps: 5 });
    }
}
