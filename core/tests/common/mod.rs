#![allow(dead_code)]

use gridla::distributed::spmd;
use gridla::{Comm, Grid, GridOrder, Matrix, Scalar};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt, prelude::*};

/// Installs a thread-local subscriber that writes through the test harness
/// and honours `RUST_LOG`.
pub fn init_test_subscriber() -> tracing::subscriber::DefaultGuard {
    let fmt_layer = fmt::layer().with_target(true).with_test_writer();

    let filter_layer = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .set_default()
}

/// Runs `f` on every process of a `height x width` column-major grid.
pub fn on_grid<F, R>(height: usize, width: usize, f: F) -> Vec<R>
where
    F: Fn(Grid) -> R + Sync,
    R: Send,
{
    on_grid_ordered(height, width, GridOrder::ColumnMajor, f)
}

pub fn on_grid_ordered<F, R>(height: usize, width: usize, order: GridOrder, f: F) -> Vec<R>
where
    F: Fn(Grid) -> R + Sync,
    R: Send,
{
    spmd(height * width, |comm: Comm| {
        let _guard = init_test_subscriber();
        let grid = Grid::with_shape(&comm, height, width, order).unwrap();
        f(grid)
    })
}

/// The same pseudo-random matrix on every process.
pub fn random_matrix(height: usize, width: usize, seed: u64) -> Matrix<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Matrix::from_fn(height, width, |_, _| rng.random_range(-1.0..1.0))
}

/// A well-conditioned random matrix: random entries plus `n` on the diagonal.
pub fn diagonally_dominant(n: usize, seed: u64) -> Matrix<f64> {
    let mut a = random_matrix(n, n, seed);
    for i in 0..n {
        a.update(i, i, n as f64);
    }
    a
}

/// Sequential reference product `op(A) * op(B)` for real matrices.
pub fn local_product(a: &Matrix<f64>, b: &Matrix<f64>) -> Matrix<f64> {
    assert_eq!(a.width(), b.height());
    Matrix::from_fn(a.height(), b.width(), |i, j| {
        (0..a.width()).map(|k| a.get(i, k) * b.get(k, j)).sum()
    })
}

pub fn assert_close<T: Scalar>(got: &Matrix<T>, want: &Matrix<T>, tol: f64, what: &str)
where
    T::Real: Into<f64>,
{
    assert_eq!((got.height(), got.width()), (want.height(), want.width()), "{what}: shape");
    let diff: f64 = got.max_abs_diff(want).into();
    assert!(diff < tol, "{what}: max abs diff {diff} exceeds {tol}");
}
