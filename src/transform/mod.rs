//! Forward and inverse curvelet transforms over any [`Backend`].
//!
//! ```text
//! forward:  coeffs[j] = ifft2c(fft2c(image) * conj(W_j))
//! inverse:  decomp[j] = ifft2c(fft2c(coeffs[j]) * W_j) * support[j]
//! ```
//!
//! The inverse returns the per-wedge decomposition; [`reconstruct`] sums it.

pub mod dynamic;

#[cfg(test)]
mod tests;

pub use self::dynamic::DynTransform;

use crate::backend::{Backend, NdarrayBackend};
use crate::error::{CurveletError, Result};
use crate::fourier::Fourier2d;
use crate::system::CurveletSystem;
use ndarray::{s, Array2, Array3, ArrayView3, Axis};
use num_traits::Zero;
use rayon::prelude::*;
use rustfft::num_complex::Complex64;
use tracing::debug;

/// A curvelet system lifted onto one backend, ready for repeated use.
pub struct CurveletTransform<B: Backend> {
    backend: B,
    fourier: Fourier2d,
    waveforms: Vec<B::Array>,
    conj_waveforms: Vec<B::Array>,
    support_size: Vec<f64>,
}

impl<B: Backend> CurveletTransform<B> {
    pub fn new(backend: B, system: &CurveletSystem) -> Self {
        let (rows, cols) = system.dim();
        let waveforms: Vec<B::Array> = (0..system.len())
            .map(|j| backend.lift(&system.waveform(j)))
            .collect();
        let conj_waveforms = waveforms.iter().map(|w| backend.conj(w)).collect();
        debug!(backend = backend.name(), wedges = system.len(), rows, cols, "lifted curvelet system");
        Self {
            backend,
            fourier: Fourier2d::new(rows, cols),
            waveforms,
            conj_waveforms,
            support_size: system.support_size().to_vec(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn len(&self) -> usize {
        self.waveforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waveforms.is_empty()
    }

    pub fn dim(&self) -> (usize, usize) {
        self.fourier.dim()
    }

    fn analyse(&self, spectrum: &B::Array, j: usize) -> Result<B::Array> {
        let band = self.backend.mul(spectrum, &self.conj_waveforms[j]);
        self.backend.ifft2(&self.fourier, &band)
    }

    fn synthesise(&self, coeffs: &B::Array, j: usize) -> Result<B::Array> {
        let spectrum = self.backend.fft2(&self.fourier, coeffs)?;
        let band = self.backend.mul(&spectrum, &self.waveforms[j]);
        let decomposed = self.backend.ifft2(&self.fourier, &band)?;
        Ok(self.backend.scale(&decomposed, self.support_size[j]))
    }

    fn check_image(&self, image: &B::Array) -> Result<()> {
        CurveletError::check_shape("image", self.dim(), self.backend.dim(image))
    }

    fn check_coefficients(&self, coeffs: &[B::Array]) -> Result<()> {
        if coeffs.len() != self.len() {
            return Err(CurveletError::WedgeCountMismatch {
                expected: self.len(),
                actual: coeffs.len(),
            });
        }
        coeffs
            .iter()
            .try_for_each(|c| CurveletError::check_shape("coefficient map", self.dim(), self.backend.dim(c)))
    }

    /// One coefficient map per wedge, each of the image shape.
    pub fn forward(&self, image: &B::Array) -> Result<Vec<B::Array>> {
        self.check_image(image)?;
        let spectrum = self.backend.fft2(&self.fourier, image)?;
        (0..self.len()).map(|j| self.analyse(&spectrum, j)).collect()
    }

    /// Per-wedge decomposition; summing it recovers the image.
    pub fn inverse(&self, coeffs: &[B::Array]) -> Result<Vec<B::Array>> {
        self.check_coefficients(coeffs)?;
        coeffs
            .iter()
            .enumerate()
            .map(|(j, c)| self.synthesise(c, j))
            .collect()
    }

    /// Sum of the decomposition, on the backend.
    pub fn reconstruct(&self, decomposition: &[B::Array]) -> Result<B::Array> {
        let (first, rest) = decomposition
            .split_first()
            .ok_or(CurveletError::WedgeCountMismatch {
                expected: self.len(),
                actual: 0,
            })?;
        Ok(rest
            .iter()
            .fold(first.clone(), |acc, d| self.backend.add(&acc, d)))
    }
}

impl<B> CurveletTransform<B>
where
    B: Backend + Sync,
    B::Array: Send + Sync,
{
    /// [`forward`](Self::forward) with wedges spread over rayon workers.
    pub fn forward_par(&self, image: &B::Array) -> Result<Vec<B::Array>> {
        self.check_image(image)?;
        let spectrum = self.backend.fft2(&self.fourier, image)?;
        (0..self.len())
            .into_par_iter()
            .map(|j| self.analyse(&spectrum, j))
            .collect()
    }

    pub fn inverse_par(&self, coeffs: &[B::Array]) -> Result<Vec<B::Array>> {
        self.check_coefficients(coeffs)?;
        coeffs
            .par_iter()
            .enumerate()
            .map(|(j, c)| self.synthesise(c, j))
            .collect()
    }
}

/// Forward transform of `image` on `backend`.
pub fn fdct<B: Backend>(backend: B, image: &B::Array, system: &CurveletSystem) -> Result<Vec<B::Array>> {
    CurveletTransform::new(backend, system).forward(image)
}

/// Inverse transform of `coeffs` on `backend`.
pub fn ifdct<B: Backend>(backend: B, coeffs: &[B::Array], system: &CurveletSystem) -> Result<Vec<B::Array>> {
    CurveletTransform::new(backend, system).inverse(coeffs)
}

pub(crate) fn stack(maps: &[Array2<Complex64>], rows: usize, cols: usize) -> Array3<Complex64> {
    let mut out = Array3::<Complex64>::zeros((maps.len(), rows, cols));
    for (j, map) in maps.iter().enumerate() {
        out.slice_mut(s![j, .., ..]).assign(map);
    }
    out
}

/// Plain-array forward transform; coefficients stacked as `(wedges, rows, cols)`.
pub fn fdct_2d(image: &Array2<Complex64>, system: &CurveletSystem) -> Result<Array3<Complex64>> {
    let (rows, cols) = system.dim();
    let coeffs = CurveletTransform::new(NdarrayBackend, system).forward_par(image)?;
    Ok(stack(&coeffs, rows, cols))
}

/// Plain-array inverse transform of stacked coefficients.
pub fn ifdct_2d(coeffs: &ArrayView3<Complex64>, system: &CurveletSystem) -> Result<Array3<Complex64>> {
    let (rows, cols) = system.dim();
    let maps: Vec<Array2<Complex64>> = coeffs.axis_iter(Axis(0)).map(|c| c.to_owned()).collect();
    let decomposition = CurveletTransform::new(NdarrayBackend, system).inverse_par(&maps)?;
    Ok(stack(&decomposition, rows, cols))
}

/// Sums a stacked decomposition back into one image.
pub fn reconstruct(decomposition: &ArrayView3<Complex64>) -> Array2<Complex64> {
    let (_, rows, cols) = decomposition.dim();
    decomposition
        .axis_iter(Axis(0))
        .fold(Array2::from_elem((rows, cols), Complex64::zero()), |acc, d| acc + &d)
}
