//! The precomputed curvelet system: one frequency-domain waveform per wedge,
//! recovered by probing a wrapping engine with unit impulses.

pub mod builder;
pub mod cache;

#[cfg(test)]
mod tests;

pub use self::builder::{build_curvelet_system, build_curvelet_system_par};
pub use self::cache::SystemCache;

use crate::error::{CurveletError, Result};
use crate::fourier::ifft2c;
use crate::settings::DctSettings;
use ndarray::{s, Array1, Array2, Array3, ArrayView2};
use rustfft::num_complex::Complex64;

/// Waveform bank for one (rows, cols, settings) configuration.
///
/// Entries are ordered scale-major, wedge-minor. Immutable once built.
#[derive(Debug, Clone)]
pub struct CurveletSystem {
    settings: DctSettings,
    waveforms: Array3<Complex64>,
    support_size: Array1<f64>,
    labels: Vec<(usize, usize)>,
    footprints: Vec<(usize, usize)>,
}

impl CurveletSystem {
    /// Assembles a system from per-wedge probe results. `labels`,
    /// `footprints` and `waveforms` must line up entry for entry.
    pub(crate) fn from_probes(
        rows: usize,
        cols: usize,
        settings: DctSettings,
        labels: Vec<(usize, usize)>,
        footprints: Vec<(usize, usize)>,
        waveforms: Vec<Array2<Complex64>>,
    ) -> Result<Self> {
        if labels.len() != waveforms.len() || footprints.len() != waveforms.len() {
            return Err(CurveletError::construction(format!(
                "{} labels and {} footprints for {} waveforms",
                labels.len(),
                footprints.len(),
                waveforms.len()
            )));
        }
        let mut stacked = Array3::<Complex64>::zeros((waveforms.len(), rows, cols));
        for (j, waveform) in waveforms.iter().enumerate() {
            CurveletError::check_shape("waveform", (rows, cols), waveform.dim())?;
            stacked.slice_mut(s![j, .., ..]).assign(waveform);
        }
        let support_size = footprints.iter().map(|&(h, w)| (h * w) as f64).collect();
        Ok(Self {
            settings,
            waveforms: stacked,
            support_size,
            labels,
            footprints,
        })
    }

    /// Number of wedges.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Image shape `(rows, cols)` the system was built for.
    pub fn dim(&self) -> (usize, usize) {
        let (_, rows, cols) = self.waveforms.dim();
        (rows, cols)
    }

    pub fn settings(&self) -> &DctSettings {
        &self.settings
    }

    /// All waveforms, shape `(len, rows, cols)`.
    pub fn waveforms(&self) -> &Array3<Complex64> {
        &self.waveforms
    }

    /// Frequency-domain waveform of wedge `j`.
    pub fn waveform(&self, j: usize) -> ArrayView2<'_, Complex64> {
        self.waveforms.slice(s![j, .., ..])
    }

    /// `height * width` of every wedge's native footprint.
    pub fn support_size(&self) -> &Array1<f64> {
        &self.support_size
    }

    /// `(scale, wedge)` of every entry.
    pub fn labels(&self) -> &[(usize, usize)] {
        &self.labels
    }

    /// Native coefficient footprint `(height, width)` of every entry.
    pub fn footprints(&self) -> &[(usize, usize)] {
        &self.footprints
    }

    pub fn index_of(&self, scale: usize, wedge: usize) -> Option<usize> {
        self.labels.iter().position(|&label| label == (scale, wedge))
    }

    /// Wedge `j` brought back to the image domain.
    pub fn spatial_waveform(&self, j: usize) -> Array2<Complex64> {
        ifft2c(&self.waveform(j))
    }
}
