//! # gridla
//!
//! `gridla` is a distributed-memory dense linear algebra library in the
//! style of Elemental: matrices are spread element-wise over a 2D process
//! grid, and blocked algorithms (SUMMA `gemm`, `trsm`, `trmm`, `herk`, LU,
//! LQ, triangular inversion) move panels between distributions so that the
//! heavy lifting is always a local kernel call.
//!
//! Processes are threads of one OS process wired together with channels
//! (see [`distributed`]), so everything runs and tests without an MPI
//! installation.
//!
//! ## Modules
//!
//! - [`distributed`]: transport, communicators and the process [`Grid`].
//! - [`dist`]: distributions, [`DistMatrix`] and the redistribution algebra.
//! - [`blas`]: distributed level-1 and level-3 operations.
//! - [`lapack`]: factorizations, inversion, norms and the symmetric eigensolver.
//! - [`graph`]: sequential and distributed sparse graphs.
//! - [`generators`]: identity, ones, uniform and Hilbert matrices.
//!
//! ## Example
//!
//! ```rust
//! use gridla::{AlgorithmConfig, DistMatrix, Distribution, Grid, Orientation, blas, generators};
//! use gridla::distributed::spmd;
//!
//! let ok = spmd(4, |comm| {
//!     let grid = Grid::new(&comm).unwrap();
//!     let a = generators::hilbert::<f64>(&grid, Distribution::MC_MR, 6);
//!     let i = generators::identity::<f64>(&grid, Distribution::MC_MR, 6);
//!     let mut c = DistMatrix::zeros(&grid, Distribution::MC_MR, 6, 6);
//!     let cfg = AlgorithmConfig::default().with_block_size(2);
//!     blas::gemm(Orientation::Normal, Orientation::Normal, 1.0, &a.as_ref(), &i.as_ref(), 0.0, &mut c.as_mut(), &cfg).unwrap();
//!     c.get(2, 3).unwrap() == 1.0 / 6.0
//! });
//! assert!(ok.iter().all(|&b| b));
//! ```

pub mod blas;
pub mod config;
pub mod dist;
pub mod distributed;
pub mod error;
pub mod generators;
pub mod graph;
pub mod lapack;
pub mod matrix;

pub use config::{AlgorithmConfig, GemmVariant};
pub use dist::{Dist, DistMatrix, DistMut, DistRef, Distribution};
pub use distributed::{Comm, Grid, GridOrder};
pub use error::{CommError, Error, Result};
pub use matrix::Matrix;

pub use gridla_kernels::{Orientation, RealScalar, Scalar, Side, UnitOrNonUnit, UpperOrLower};
