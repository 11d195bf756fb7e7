use super::tiling::{FrequencyTiling, WedgeWindow};
use super::{CurveletEngine, WedgeCoefficients};
use crate::error::{CurveletError, Result};
use crate::fourier::{fft2c, ifft2c};
use crate::settings::{DctSettings, Finest, DEFAULT_NBANGLES_COARSE};
use ndarray::{Array2, ArrayView2, Zip};
use rayon::prelude::*;
use rustfft::num_complex::Complex64;
use std::collections::HashMap;
use std::f64::consts::{FRAC_1_SQRT_2, SQRT_2};
use std::sync::{Arc, Mutex};
use tracing::debug;

type TilingKey = (usize, usize, DctSettings);

/// In-process wrapping curvelet transform.
///
/// Tilings are memoized per (rows, cols, settings); the memo table is the
/// only shared state and sits behind a mutex, so one engine can serve
/// concurrent callers.
#[derive(Debug, Default)]
pub struct NativeWrapping {
    tilings: Mutex<HashMap<TilingKey, Arc<FrequencyTiling>>>,
}

impl NativeWrapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tiling(&self, rows: usize, cols: usize, settings: &DctSettings) -> Result<Arc<FrequencyTiling>> {
        let key = (rows, cols, settings.with_real(false));
        let mut tilings = self.tilings.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(tiling) = tilings.get(&key) {
            return Ok(Arc::clone(tiling));
        }
        let tiling = Arc::new(FrequencyTiling::new(rows, cols, settings)?);
        debug!(
            rows,
            cols,
            nbscales = settings.nbscales,
            wedges = settings.total_wedges(),
            "built wrapping tiling"
        );
        tilings.insert(key, Arc::clone(&tiling));
        Ok(tiling)
    }
}

/// Windows `spectrum` by the wedge, wraps it onto the footprint and returns
/// the footprint's spatial coefficients.
fn analyse(wedge: &WedgeWindow, spectrum: &Array2<Complex64>) -> Array2<Complex64> {
    let mut wrapped = Array2::<Complex64>::zeros(wedge.footprint);
    for tap in &wedge.taps {
        wrapped[tap.cell] += spectrum[tap.grid] * tap.weight;
    }
    ifft2c(&wrapped.view())
}

/// Adjoint of [`analyse`], accumulated into `spectrum` with `gain`.
fn synthesise(wedge: &WedgeWindow, coeffs: &ArrayView2<Complex64>, gain: f64, spectrum: &mut Array2<Complex64>) {
    let wrapped = fft2c(coeffs);
    for tap in &wedge.taps {
        spectrum[tap.grid] += wrapped[tap.cell] * (gain * tap.weight);
    }
}

fn real_part(c: &Array2<Complex64>, scale: f64) -> Array2<Complex64> {
    c.mapv(|v| Complex64::new(scale * v.re, 0.0))
}

fn imag_part(c: &Array2<Complex64>, scale: f64) -> Array2<Complex64> {
    c.mapv(|v| Complex64::new(scale * v.im, 0.0))
}

/// Recovers the settings implied by a coefficient nesting.
fn infer_settings(coeffs: &WedgeCoefficients, is_real: bool) -> Result<DctSettings> {
    let nbscales = coeffs.len();
    if nbscales < 2 {
        return Err(CurveletError::construction(format!(
            "coefficient nesting needs at least two scales, got {nbscales}"
        )));
    }
    let finest = if coeffs[nbscales - 1].len() == 1 {
        Finest::Wavelets
    } else {
        Finest::Curvelets
    };
    let nbangles_coarse = if nbscales > 2 || finest == Finest::Curvelets {
        coeffs[1].len()
    } else {
        DEFAULT_NBANGLES_COARSE
    };
    let settings = DctSettings::new(is_real, finest, nbscales, nbangles_coarse);

    let expected = settings.wedges_per_scale();
    let actual: Vec<usize> = coeffs.iter().map(Vec::len).collect();
    if expected != actual {
        return Err(CurveletError::construction(format!(
            "coefficient nesting {actual:?} matches no wrapping layout (closest is {expected:?})"
        )));
    }
    Ok(settings)
}

impl CurveletEngine for NativeWrapping {
    fn fdct_wrapping(
        &self,
        image: &ArrayView2<Complex64>,
        settings: &DctSettings,
    ) -> Result<WedgeCoefficients> {
        let (rows, cols) = image.dim();
        let tiling = self.tiling(rows, cols, settings)?;
        let spectrum = fft2c(image);

        let mut coeffs = Vec::with_capacity(settings.nbscales);
        for (scale, wedges) in tiling.scales().iter().enumerate() {
            let level = if settings.is_real && settings.is_angular(scale) {
                // Antipodal wedges of a real image carry conjugate data; keep
                // the first half and split it into real and imaginary parts.
                let half = wedges.len() / 2;
                let analysed: Vec<Array2<Complex64>> = wedges[..half]
                    .par_iter()
                    .map(|w| analyse(w, &spectrum))
                    .collect();
                let mut level: Vec<_> = analysed.iter().map(|c| real_part(c, SQRT_2)).collect();
                level.extend(analysed.iter().map(|c| imag_part(c, SQRT_2)));
                level
            } else {
                let analysed: Vec<Array2<Complex64>> =
                    wedges.par_iter().map(|w| analyse(w, &spectrum)).collect();
                if settings.is_real {
                    analysed.iter().map(|c| real_part(c, 1.0)).collect()
                } else {
                    analysed
                }
            };
            coeffs.push(level);
        }
        Ok(coeffs)
    }

    fn ifdct_wrapping(
        &self,
        coeffs: &WedgeCoefficients,
        is_real: bool,
        rows: usize,
        cols: usize,
    ) -> Result<Array2<Complex64>> {
        let settings = infer_settings(coeffs, is_real)?;
        let tiling = self.tiling(rows, cols, &settings)?;
        for (scale, level) in coeffs.iter().enumerate() {
            for (wedge, c) in level.iter().enumerate() {
                CurveletError::check_shape(
                    "wedge coefficients",
                    tiling.coefficient_shape(scale, wedge, is_real),
                    c.dim(),
                )?;
            }
        }

        let mut spectrum = Array2::<Complex64>::zeros((rows, cols));
        for (scale, wedges) in tiling.scales().iter().enumerate() {
            let level = &coeffs[scale];
            if is_real && settings.is_angular(scale) {
                let half = wedges.len() / 2;
                for (m, wedge) in wedges[..half].iter().enumerate() {
                    let c = Zip::from(&level[m])
                        .and(&level[m + half])
                        .map_collect(|re, im| Complex64::new(re.re, im.re) * FRAC_1_SQRT_2);
                    // The antipodal wedge contributes the conjugate image;
                    // taking the real part at the end accounts for it.
                    synthesise(wedge, &c.view(), 2.0, &mut spectrum);
                }
            } else {
                for (wedge, c) in wedges.iter().zip(level) {
                    if is_real {
                        synthesise(wedge, &real_part(c, 1.0).view(), 1.0, &mut spectrum);
                    } else {
                        synthesise(wedge, &c.view(), 1.0, &mut spectrum);
                    }
                }
            }
        }

        let image = ifft2c(&spectrum.view());
        Ok(if is_real { real_part(&image, 1.0) } else { image })
    }
}
