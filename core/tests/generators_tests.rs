mod common;

use common::on_grid;
use gridla::{Distribution, Matrix, generators};
use num_complex::Complex64;

#[test]
fn test_uniform_is_distribution_independent() {
    let globals = on_grid(2, 3, |grid| {
        let a = generators::uniform::<f64>(&grid, Distribution::MC_MR, 6, 4, 42, 2.0).to_global().unwrap();
        let b = generators::uniform::<f64>(&grid, Distribution::STAR_VR, 6, 4, 42, 2.0).to_global().unwrap();
        let c = generators::uniform::<f64>(&grid, Distribution::MC_MR, 6, 4, 43, 2.0).to_global().unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.data().iter().all(|v| v.abs() <= 2.0));
        a
    });
    assert!(globals.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_uniform_complex_stays_in_disc() {
    on_grid(2, 2, |grid| {
        let a = generators::uniform::<Complex64>(&grid, Distribution::VC_STAR, 5, 5, 7, 0.5).to_global().unwrap();
        assert!(a.data().iter().all(|z| z.norm() <= 0.5 + 1e-15));
        assert!(a.data().iter().any(|z| z.im != 0.0));
    });
}

#[test]
fn test_deterministic_generators() {
    on_grid(3, 2, |grid| {
        let h = generators::hilbert::<f64>(&grid, Distribution::MC_MR, 4).to_global().unwrap();
        assert_eq!(h, Matrix::from_fn(4, 4, |i, j| 1.0 / (i + j + 1) as f64));
        let i = generators::identity::<f64>(&grid, Distribution::MR_MC, 3).to_global().unwrap();
        assert_eq!(i, Matrix::identity(3));
        let o = generators::ones::<f64>(&grid, Distribution::STAR_MD, 2, 5).to_global().unwrap();
        assert_eq!(o, Matrix::from_fn(2, 5, |_, _| 1.0));
        let z = generators::zeros::<f64>(&grid, Distribution::CIRC_CIRC, 3, 3).to_global().unwrap();
        assert_eq!(z, Matrix::zeros(3, 3));
    });
}

#[test]
fn test_trefethen_embree_bands() {
    on_grid(2, 3, |grid| {
        let n = 7;
        let a = generators::trefethen_embree::<Complex64>(&grid, Distribution::MC_MR, n).to_global().unwrap();
        for j in 0..n {
            for i in 0..n {
                let want = match j as isize - i as isize {
                    3 => Complex64::new(2.0, 0.0),
                    2 => Complex64::new(-1.0, 0.0),
                    1 => Complex64::new(0.0, 2.0),
                    -2 => Complex64::new(-4.0, 0.0),
                    -3 => Complex64::new(0.0, -2.0),
                    _ => Complex64::new(0.0, 0.0),
                };
                assert_eq!(a.get(i, j), want, "({i}, {j})");
            }
        }
        // Toeplitz: the layout does not matter.
        let b = generators::trefethen_embree::<Complex64>(&grid, Distribution::VR_STAR, n).to_global().unwrap();
        assert_eq!(a, b);
    });
}

#[test]
#[should_panic(expected = "n >= 4")]
fn test_trefethen_embree_needs_order_four() {
    on_grid(1, 1, |grid| {
        generators::trefethen_embree::<Complex64>(&grid, Distribution::STAR_STAR, 3);
    });
}
