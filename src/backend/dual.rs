//! Forward-mode differentiation: every array carries a tangent alongside
//! its value, and each primitive pushes the tangent through its
//! linearization.

use super::Backend;
use crate::error::{CurveletError, Result};
use crate::fourier::Fourier2d;
use ndarray::{Array2, ArrayView2};
use rustfft::num_complex::Complex64;

#[derive(Debug, Clone, PartialEq)]
pub struct DualArray {
    pub primal: Array2<Complex64>,
    pub tangent: Array2<Complex64>,
}

impl DualArray {
    pub fn new(primal: Array2<Complex64>, tangent: Array2<Complex64>) -> Result<Self> {
        CurveletError::check_shape("dual tangent", primal.dim(), tangent.dim())?;
        Ok(Self { primal, tangent })
    }

    /// A value with zero tangent.
    pub fn constant(primal: Array2<Complex64>) -> Self {
        let tangent = Array2::zeros(primal.dim());
        Self { primal, tangent }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.primal.dim()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DualBackend;

impl Backend for DualBackend {
    type Array = DualArray;

    fn name(&self) -> &'static str {
        "dual"
    }

    fn lift(&self, x: &ArrayView2<Complex64>) -> DualArray {
        DualArray::constant(x.to_owned())
    }

    fn dim(&self, x: &DualArray) -> (usize, usize) {
        x.dim()
    }

    fn fft2(&self, fourier: &Fourier2d, x: &DualArray) -> Result<DualArray> {
        Ok(DualArray {
            primal: fourier.forward(&x.primal.view())?,
            tangent: fourier.forward(&x.tangent.view())?,
        })
    }

    fn ifft2(&self, fourier: &Fourier2d, x: &DualArray) -> Result<DualArray> {
        Ok(DualArray {
            primal: fourier.inverse(&x.primal.view())?,
            tangent: fourier.inverse(&x.tangent.view())?,
        })
    }

    fn mul(&self, a: &DualArray, b: &DualArray) -> DualArray {
        DualArray {
            primal: &a.primal * &b.primal,
            tangent: &a.primal * &b.tangent + &a.tangent * &b.primal,
        }
    }

    fn conj(&self, x: &DualArray) -> DualArray {
        DualArray {
            primal: x.primal.mapv(|v| v.conj()),
            tangent: x.tangent.mapv(|v| v.conj()),
        }
    }

    fn scale(&self, x: &DualArray, factor: f64) -> DualArray {
        let factor = Complex64::new(factor, 0.0);
        DualArray {
            primal: &x.primal * factor,
            tangent: &x.tangent * factor,
        }
    }

    fn add(&self, a: &DualArray, b: &DualArray) -> DualArray {
        DualArray {
            primal: &a.primal + &b.primal,
            tangent: &a.tangent + &b.tangent,
        }
    }

    fn primal(&self, x: &DualArray) -> Array2<Complex64> {
        x.primal.clone()
    }
}
