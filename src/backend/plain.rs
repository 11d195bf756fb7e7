use super::Backend;
use crate::error::Result;
use crate::fourier::Fourier2d;
use ndarray::{Array2, ArrayView2};
use rustfft::num_complex::Complex64;

/// Plain complex arrays.
#[derive(Debug, Clone, Copy, Default)]
pub struct NdarrayBackend;

impl Backend for NdarrayBackend {
    type Array = Array2<Complex64>;

    fn name(&self) -> &'static str {
        "ndarray"
    }

    fn lift(&self, x: &ArrayView2<Complex64>) -> Self::Array {
        x.to_owned()
    }

    fn dim(&self, x: &Self::Array) -> (usize, usize) {
        x.dim()
    }

    fn fft2(&self, fourier: &Fourier2d, x: &Self::Array) -> Result<Self::Array> {
        fourier.forward(&x.view())
    }

    fn ifft2(&self, fourier: &Fourier2d, x: &Self::Array) -> Result<Self::Array> {
        fourier.inverse(&x.view())
    }

    fn mul(&self, a: &Self::Array, b: &Self::Array) -> Self::Array {
        a * b
    }

    fn conj(&self, x: &Self::Array) -> Self::Array {
        x.mapv(|v| v.conj())
    }

    fn scale(&self, x: &Self::Array, factor: f64) -> Self::Array {
        x * Complex64::new(factor, 0.0)
    }

    fn add(&self, a: &Self::Array, b: &Self::Array) -> Self::Array {
        a + b
    }

    fn primal(&self, x: &Self::Array) -> Array2<Complex64> {
        x.clone()
    }
}
