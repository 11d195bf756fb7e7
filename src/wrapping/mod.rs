//! Boundary to the wrapping-based curvelet construction.
//!
//! The curvelet system builder only needs the two toolbox entry points,
//! `fdct_wrapping` and `ifdct_wrapping`, and treats them as an opaque oracle.
//! [`NativeWrapping`] is the in-process implementation shipped with the crate.

pub mod native;
pub mod tiling;
pub mod window;

pub use self::native::NativeWrapping;
pub use self::tiling::{FrequencyTiling, WedgeWindow};

use crate::error::Result;
use crate::settings::DctSettings;
use ndarray::{Array2, ArrayView2};
use rustfft::num_complex::Complex64;

/// Coefficients nested by scale, then by wedge within the scale. Each leaf
/// has the wedge's native footprint shape.
pub type WedgeCoefficients = Vec<Vec<Array2<Complex64>>>;

pub trait CurveletEngine {
    /// Forward wrapping transform of `image`.
    fn fdct_wrapping(
        &self,
        image: &ArrayView2<Complex64>,
        settings: &DctSettings,
    ) -> Result<WedgeCoefficients>;

    /// Inverse wrapping transform, producing a `rows x cols` image.
    fn ifdct_wrapping(
        &self,
        coeffs: &WedgeCoefficients,
        is_real: bool,
        rows: usize,
        cols: usize,
    ) -> Result<Array2<Complex64>>;
}

/// Footprint `(height, width)` of every leaf, scale-major.
pub fn coefficient_dims(coeffs: &WedgeCoefficients) -> Vec<(usize, usize)> {
    coeffs.iter().flatten().map(|c| c.dim()).collect()
}
