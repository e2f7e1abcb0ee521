//! # Distributed LAPACK
//!
//! Factorizations and spectral routines on `[MC,MR]` matrices, built from
//! the blocked kernels in [`blas`](crate::blas) and the redistribution
//! algebra.
//!
//! ## 🚀 Routines
//!
//! - [`lu`]: blocked right-looking LU without pivoting.
//! - [`trinv`]: blocked in-place triangular inversion.
//! - [`hetrmm`] / [`trtrmm`]: `L^H L` or `U U^H` of a stored triangle.
//! - [`lq`]: blocked Householder LQ, with [`lq::explicit_q`], [`lq::apply_q`]
//!   and the minimum-norm solver [`lq::solve_after`].
//! - [`symmetric_eig`]: eigenpairs of a real symmetric matrix.
//! - Norms: [`one_norm`], [`infinity_norm`], [`max_norm`],
//!   [`frobenius_norm`], [`entrywise_norm`] and their `symmetric_*` and
//!   `hermitian_*` counterparts.
//!
//! Zero pivots are reported as [`Error::Singular`](crate::Error::Singular)
//! with a global index, identically on every process.

mod eig;
mod hetrmm;
pub mod lq;
mod lu;
mod norm;
mod trinv;

pub use eig::{Sort, sort_eigenpairs, symmetric_eig};
pub use hetrmm::{hetrmm, trtrmm};
pub use lq::{LqFactors, lq};
pub use lu::lu;
pub use norm::{
    entrywise_norm, frobenius_norm, hermitian_entrywise_norm, hermitian_frobenius_norm, hermitian_infinity_norm,
    hermitian_max_norm, hermitian_one_norm, infinity_norm, max_norm, one_norm, symmetric_entrywise_norm,
    symmetric_frobenius_norm, symmetric_infinity_norm, symmetric_max_norm, symmetric_one_norm,
};
pub use trinv::trinv;
