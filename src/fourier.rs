//! Centered, orthonormal 2D Fourier transforms.
//!
//! Every backend routes its FFTs through [`Fourier2d`], so all of them share
//! the same zero-frequency-centering convention:
//!
//! ```text
//! forward(x) = fftshift(fft2(ifftshift(x))) / sqrt(rows * cols)
//! inverse(X) = fftshift(ifft2(ifftshift(X))) * sqrt(rows * cols)
//! ```
//!
//! where `ifft2` is the `1/N`-normalized inverse DFT. The two are exact
//! inverses and preserve energy.

use crate::error::{CurveletError, Result};
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use rayon::prelude::*;
use rustfft::num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::fmt;
use std::sync::Arc;

/// Circularly shifts both axes by `(dr, dc)`.
fn roll2<T: Clone>(x: &ArrayView2<T>, dr: usize, dc: usize) -> Array2<T> {
    let (rows, cols) = x.dim();
    Array2::from_shape_fn((rows, cols), |(i, j)| {
        x[[(i + rows - dr % rows) % rows, (j + cols - dc % cols) % cols]].clone()
    })
}

/// Moves the zero-frequency sample from index 0 to `floor(n/2)` on both axes.
pub fn fftshift2<T: Clone>(x: &ArrayView2<T>) -> Array2<T> {
    let (rows, cols) = x.dim();
    if rows == 0 || cols == 0 {
        return x.to_owned();
    }
    roll2(x, rows / 2, cols / 2)
}

/// Inverse of [`fftshift2`]; differs from it for odd lengths.
pub fn ifftshift2<T: Clone>(x: &ArrayView2<T>) -> Array2<T> {
    let (rows, cols) = x.dim();
    if rows == 0 || cols == 0 {
        return x.to_owned();
    }
    roll2(x, rows.div_ceil(2), cols.div_ceil(2))
}

/// Planned centered 2D FFT for one image shape.
#[derive(Clone)]
pub struct Fourier2d {
    rows: usize,
    cols: usize,
    row_forward: Arc<dyn Fft<f64>>,
    row_inverse: Arc<dyn Fft<f64>>,
    col_forward: Arc<dyn Fft<f64>>,
    col_inverse: Arc<dyn Fft<f64>>,
}

impl fmt::Debug for Fourier2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fourier2d")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .finish()
    }
}

impl Fourier2d {
    pub fn new(rows: usize, cols: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            rows,
            cols,
            row_forward: planner.plan_fft_forward(cols),
            row_inverse: planner.plan_fft_inverse(cols),
            col_forward: planner.plan_fft_forward(rows),
            col_inverse: planner.plan_fft_inverse(rows),
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Centered orthonormal forward transform.
    pub fn forward(&self, x: &ArrayView2<Complex64>) -> Result<Array2<Complex64>> {
        CurveletError::check_shape("forward FFT input", self.dim(), x.dim())?;
        Ok(self.transform(x, &self.row_forward, &self.col_forward))
    }

    /// Centered orthonormal inverse transform.
    pub fn inverse(&self, x: &ArrayView2<Complex64>) -> Result<Array2<Complex64>> {
        CurveletError::check_shape("inverse FFT input", self.dim(), x.dim())?;
        Ok(self.transform(x, &self.row_inverse, &self.col_inverse))
    }

    fn transform(
        &self,
        x: &ArrayView2<Complex64>,
        along_rows: &Arc<dyn Fft<f64>>,
        along_cols: &Arc<dyn Fft<f64>>,
    ) -> Array2<Complex64> {
        let mut work = ifftshift2(x);
        process_lanes(&mut work, along_rows);
        let mut work_t = work.t().as_standard_layout().into_owned();
        process_lanes(&mut work_t, along_cols);
        let norm = 1.0 / ((self.rows * self.cols) as f64).sqrt();
        work_t.mapv_inplace(|v| v * norm);
        fftshift2(&work_t.t())
    }
}

/// Runs `fft` over every row of `data` in place.
fn process_lanes(data: &mut Array2<Complex64>, fft: &Arc<dyn Fft<f64>>) {
    data.axis_iter_mut(Axis(0))
        .into_par_iter()
        .for_each(|mut lane| match lane.as_slice_mut() {
            Some(slice) => fft.process(slice),
            None => {
                let mut buffer = lane.to_vec();
                fft.process(&mut buffer);
                lane.assign(&ArrayView1::from(&buffer));
            }
        });
}

/// One-shot centered forward FFT; plans on every call.
pub fn fft2c(x: &ArrayView2<Complex64>) -> Array2<Complex64> {
    let (rows, cols) = x.dim();
    let fourier = Fourier2d::new(rows, cols);
    fourier.transform(x, &fourier.row_forward, &fourier.col_forward)
}

/// One-shot centered inverse FFT; plans on every call.
pub fn ifft2c(x: &ArrayView2<Complex64>) -> Array2<Complex64> {
    let (rows, cols) = x.dim();
    let fourier = Fourier2d::new(rows, cols);
    fourier.transform(x, &fourier.row_inverse, &fourier.col_inverse)
}

/// Lifts a real image into the complex domain.
pub fn to_complex(x: &ArrayView2<f64>) -> Array2<Complex64> {
    x.mapv(|v| Complex64::new(v, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{arr2, Array2};
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;

    fn random_complex(rows: usize, cols: usize) -> Array2<Complex64> {
        let re = Array2::random((rows, cols), Uniform::new(-1.0, 1.0));
        let im = Array2::random((rows, cols), Uniform::new(-1.0, 1.0));
        Array2::from_shape_fn((rows, cols), |ix| Complex64::new(re[ix], im[ix]))
    }

    fn max_abs_diff(a: &Array2<Complex64>, b: &Array2<Complex64>) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).norm())
            .fold(0.0, f64::max)
    }

    #[test]
    fn test_shift_matches_numpy_convention() {
        let x = arr2(&[[0, 1, 2], [3, 4, 5]]);
        let shifted = fftshift2(&x.view());
        assert_eq!(shifted, arr2(&[[5, 3, 4], [2, 0, 1]]));
        assert_eq!(ifftshift2(&shifted.view()), x);

        let odd = arr2(&[[0, 1, 2, 3, 4]]);
        assert_eq!(fftshift2(&odd.view()), arr2(&[[3, 4, 0, 1, 2]]));
        assert_eq!(ifftshift2(&odd.view()), arr2(&[[2, 3, 4, 0, 1]]));
    }

    #[test]
    fn test_involution_on_random_arrays() {
        for &(rows, cols) in &[(8, 8), (7, 12), (15, 9), (1, 5)] {
            let fourier = Fourier2d::new(rows, cols);
            let x = random_complex(rows, cols);
            let back = fourier
                .inverse(&fourier.forward(&x.view()).unwrap().view())
                .unwrap();
            assert!(max_abs_diff(&x, &back) < 1e-12, "shape {rows}x{cols}");
        }
    }

    #[test]
    fn test_parseval() {
        let x = random_complex(16, 10);
        let energy: f64 = x.iter().map(|v| v.norm_sqr()).sum();
        let spectrum = fft2c(&x.view());
        let spectral_energy: f64 = spectrum.iter().map(|v| v.norm_sqr()).sum();
        assert_abs_diff_eq!(energy, spectral_energy, epsilon = 1e-9);
    }

    #[test]
    fn test_centered_delta_has_flat_spectrum() {
        for &(rows, cols) in &[(6, 6), (5, 7)] {
            let mut x = Array2::<Complex64>::zeros((rows, cols));
            x[[rows / 2, cols / 2]] = Complex64::new(1.0, 0.0);
            let spectrum = fft2c(&x.view());
            let flat = 1.0 / ((rows * cols) as f64).sqrt();
            for v in spectrum.iter() {
                assert_abs_diff_eq!(v.re, flat, epsilon = 1e-12);
                assert_abs_diff_eq!(v.im, 0.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_constant_image_maps_to_center() {
        let x = Array2::from_elem((4, 6), Complex64::new(1.0, 0.0));
        let spectrum = fft2c(&x.view());
        assert_abs_diff_eq!(spectrum[[2, 3]].re, (24.0f64).sqrt(), epsilon = 1e-12);
        let rest: f64 = spectrum.iter().map(|v| v.norm()).sum::<f64>() - spectrum[[2, 3]].norm();
        assert_abs_diff_eq!(rest, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_shape_is_checked() {
        let fourier = Fourier2d::new(4, 4);
        let x = Array2::<Complex64>::zeros((4, 5));
        assert!(matches!(
            fourier.forward(&x.view()),
            Err(CurveletError::ShapeMismatch { .. })
        ));
    }
}
