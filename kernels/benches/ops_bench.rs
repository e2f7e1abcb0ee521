use criterion::{Criterion, criterion_group, criterion_main};
use gridla_kernels::{
    MatrixMut, MatrixRef, Orientation, Side, UnitOrNonUnit, UpperOrLower, cpu_gemm, cpu_lu,
    cpu_transpose, cpu_trsm,
};
use rand::Rng;
use std::hint::black_box;

fn random_matrix(n: usize) -> Vec<f64> {
    let mut rng = rand::rng();
    (0..n * n).map(|_| rng.random_range(-1.0..1.0)).collect()
}

/// Diagonally dominant so that unpivoted LU and triangular solves stay stable.
fn dominant_matrix(n: usize) -> Vec<f64> {
    let mut a = random_matrix(n);
    for i in 0..n {
        a[i + i * n] += n as f64;
    }
    a
}

fn benchmark_gemm(c: &mut Criterion) {
    let mut group = c.benchmark_group("gemm");
    let sizes = [64, 128, 256, 512];

    for &size in &sizes {
        let a = random_matrix(size);
        let b = random_matrix(size);
        let mut out = vec![0.0f64; size * size];

        group.bench_function(format!("{}x{}", size, size), |bench| {
            bench.iter(|| {
                cpu_gemm(
                    Orientation::Normal,
                    Orientation::Normal,
                    1.0,
                    black_box(&MatrixRef::new(&a, size, size, size)),
                    black_box(&MatrixRef::new(&b, size, size, size)),
                    0.0,
                    &mut MatrixMut::new(&mut out, size, size, size),
                )
            })
        });
    }
    group.finish();
}

fn benchmark_transpose(c: &mut Criterion) {
    let mut group = c.benchmark_group("transpose");
    let sizes = [128, 512, 1024, 2048];

    for &size in &sizes {
        let a = random_matrix(size);
        let mut out = vec![0.0f64; size * size];

        group.bench_function(format!("{}x{}", size, size), |bench| {
            bench.iter(|| {
                cpu_transpose(
                    black_box(&MatrixRef::new(&a, size, size, size)),
                    &mut MatrixMut::new(&mut out, size, size, size),
                    false,
                )
            })
        });
    }
    group.finish();
}

fn benchmark_factorizations(c: &mut Criterion) {
    let mut group = c.benchmark_group("factor");
    let sizes = [64, 128, 256];

    for &size in &sizes {
        let a = dominant_matrix(size);
        let b = random_matrix(size);

        group.bench_function(format!("lu_{}", size), |bench| {
            bench.iter(|| {
                let mut work = a.clone();
                cpu_lu(&mut MatrixMut::new(&mut work, size, size, size)).unwrap();
                black_box(work)
            })
        });

        group.bench_function(format!("trsm_{}", size), |bench| {
            bench.iter(|| {
                let mut rhs = b.clone();
                cpu_trsm(
                    Side::Left,
                    UpperOrLower::Lower,
                    Orientation::Normal,
                    UnitOrNonUnit::NonUnit,
                    1.0,
                    &MatrixRef::new(&a, size, size, size),
                    &mut MatrixMut::new(&mut rhs, size, size, size),
                )
                .unwrap();
                black_box(rhs)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_gemm, benchmark_transpose, benchmark_factorizations);
criterion_main!(benches);
