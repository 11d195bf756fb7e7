mod backend_test;
mod roundtrip_test;

use crate::settings::{DctSettings, Finest};
use crate::system::{build_curvelet_system, CurveletSystem};
use crate::wrapping::NativeWrapping;
use ndarray::{Array2, ArrayView2};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rustfft::num_complex::Complex64;

fn system(rows: usize, cols: usize, settings: DctSettings) -> CurveletSystem {
    build_curvelet_system(&NativeWrapping::new(), rows, cols, &settings).unwrap()
}

fn small_system() -> CurveletSystem {
    system(24, 20, DctSettings::new(false, Finest::Curvelets, 3, 8))
}

/// Reproducible real image lifted to complex.
fn random_image(rows: usize, cols: usize, seed: u64) -> Array2<Complex64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::random_using((rows, cols), Uniform::new(-1.0, 1.0), &mut rng).mapv(|v| Complex64::new(v, 0.0))
}

fn max_abs_diff(a: &ArrayView2<Complex64>, b: &ArrayView2<Complex64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).norm())
        .fold(0.0, f64::max)
}
