//! Standard test matrices.
//!
//! Every generator builds the matrix entry by entry from its global
//! indices, so the result is the same whatever the distribution and grid.

use crate::dist::{DistMatrix, Distribution};
use crate::distributed::Grid;
use crate::matrix::Matrix;
use gridla_kernels::Scalar;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

/// Fills the locally owned entries with `f(global_row, global_col)`.
fn from_fn<T: Scalar>(
    grid: &Grid,
    dist: Distribution,
    height: usize,
    width: usize,
    f: impl Fn(usize, usize) -> T,
) -> DistMatrix<T> {
    let mut a = DistMatrix::zeros(grid, dist, height, width);
    let meta = a.meta().clone();
    a.local_mut()
        .as_mut()
        .for_each_mut(|i, j, v| *v = f(meta.global_row(i), meta.global_col(j)));
    a
}

pub fn zeros<T: Scalar>(grid: &Grid, dist: Distribution, height: usize, width: usize) -> DistMatrix<T> {
    DistMatrix::zeros(grid, dist, height, width)
}

pub fn ones<T: Scalar>(grid: &Grid, dist: Distribution, height: usize, width: usize) -> DistMatrix<T> {
    from_fn(grid, dist, height, width, |_, _| T::one())
}

/// The `n x n` identity.
pub fn identity<T: Scalar>(grid: &Grid, dist: Distribution, n: usize) -> DistMatrix<T> {
    from_fn(grid, dist, n, n, |i, j| if i == j { T::one() } else { T::zero() })
}

/// The `n x n` Hilbert matrix, `h_ij = 1 / (i + j + 1)`.
pub fn hilbert<T: Scalar>(grid: &Grid, dist: Distribution, n: usize) -> DistMatrix<T> {
    from_fn(grid, dist, n, n, |i, j| T::from_f64_parts(1.0 / (i + j + 1) as f64, 0.0))
}

/// The `n x n` banded Toeplitz matrix with symbol
/// `f(z) = 2 z^-3 - z^-2 + 2i z^-1 - 4 z^2 - 2i z^3`, i.e. the superdiagonals
/// `1..=3` hold `2i, -1, 2` and the subdiagonals `2..=3` hold `-4, -2i`.
/// Its pseudospectra are far from its spectrum, which makes it a standard
/// non-normal test case.
///
/// # Panics
///
/// For real element types, and for `n < 4`.
pub fn trefethen_embree<T: Scalar>(grid: &Grid, dist: Distribution, n: usize) -> DistMatrix<T> {
    assert!(T::IS_COMPLEX, "trefethen_embree: the matrix is complex");
    assert!(n >= 4, "trefethen_embree: a third-order symbol needs n >= 4, got {n}");
    from_fn(grid, dist, n, n, |i, j| match j as isize - i as isize {
        3 => T::from_f64_parts(2.0, 0.0),
        2 => T::from_f64_parts(-1.0, 0.0),
        1 => T::from_f64_parts(0.0, 2.0),
        -2 => T::from_f64_parts(-4.0, 0.0),
        -3 => T::from_f64_parts(0.0, -2.0),
        _ => T::zero(),
    })
}

/// A `height x width` matrix with entries drawn uniformly from the ball of
/// `radius` around zero: the interval `[-radius, radius]` for real types and
/// the disc of that radius for complex ones.
///
/// The entries come from one `StdRng` stream seeded with `seed` and walked
/// in column-major global order, so every process (and every distribution)
/// sees the same matrix.
pub fn uniform<T: Scalar>(
    grid: &Grid,
    dist: Distribution,
    height: usize,
    width: usize,
    seed: u64,
    radius: f64,
) -> DistMatrix<T> {
    assert!(radius >= 0.0, "uniform: radius must be non-negative, got {radius}");
    let mut rng = StdRng::seed_from_u64(seed);
    let global = Matrix::from_fn(height, width, |_, _| {
        if radius == 0.0 {
            T::zero()
        } else if T::IS_COMPLEX {
            let r = radius * rng.random::<f64>().sqrt();
            let theta = 2.0 * PI * rng.random::<f64>();
            T::from_f64_parts(r * theta.cos(), r * theta.sin())
        } else {
            T::from_f64_parts(rng.random_range(-radius..=radius), 0.0)
        }
    });
    DistMatrix::from_global(grid, dist, &global)
}
