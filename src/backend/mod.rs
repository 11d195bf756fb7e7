//! Array substrates the transforms can run on.
//!
//! The forward and inverse transforms are written once against [`Backend`];
//! each adapter supplies the handful of primitives they need. FFTs always go
//! through [`Fourier2d`], so the centering convention is shared.

pub mod plain;

#[cfg(feature = "dual")]
pub mod dual;
#[cfg(feature = "tape")]
pub mod tape;

pub use self::plain::NdarrayBackend;

#[cfg(feature = "dual")]
pub use self::dual::{DualArray, DualBackend};
#[cfg(feature = "tape")]
pub use self::tape::{GradTensor, TapeBackend};

use crate::error::{CurveletError, Result};
use crate::fourier::Fourier2d;
use ndarray::{Array2, ArrayView2};
use rustfft::num_complex::Complex64;
use std::fmt;
use std::str::FromStr;

/// Complex 2D array primitives used by the curvelet transforms.
pub trait Backend {
    type Array: Clone;

    fn name(&self) -> &'static str;

    /// Wraps plain data as a constant of this backend.
    fn lift(&self, x: &ArrayView2<Complex64>) -> Self::Array;

    fn dim(&self, x: &Self::Array) -> (usize, usize);

    fn fft2(&self, fourier: &Fourier2d, x: &Self::Array) -> Result<Self::Array>;

    fn ifft2(&self, fourier: &Fourier2d, x: &Self::Array) -> Result<Self::Array>;

    /// Elementwise product; operands have equal shapes.
    fn mul(&self, a: &Self::Array, b: &Self::Array) -> Self::Array;

    fn conj(&self, x: &Self::Array) -> Self::Array;

    fn scale(&self, x: &Self::Array, factor: f64) -> Self::Array;

    /// Elementwise sum; operands have equal shapes.
    fn add(&self, a: &Self::Array, b: &Self::Array) -> Self::Array;

    /// Plain values carried by `x`.
    fn primal(&self, x: &Self::Array) -> Array2<Complex64>;
}

/// Runtime backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Ndarray,
    Dual,
    Tape,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [BackendKind::Ndarray, BackendKind::Dual, BackendKind::Tape];

    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Ndarray => "ndarray",
            BackendKind::Dual => "dual",
            BackendKind::Tape => "tape",
        }
    }

    /// Whether the backend was compiled into this build.
    pub fn is_available(self) -> bool {
        match self {
            BackendKind::Ndarray => true,
            BackendKind::Dual => cfg!(feature = "dual"),
            BackendKind::Tape => cfg!(feature = "tape"),
        }
    }

    pub fn ensure_available(self) -> Result<Self> {
        if self.is_available() {
            Ok(self)
        } else {
            Err(CurveletError::BackendUnavailable(self.name().to_string()))
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = CurveletError;

    /// Accepts the crate's own names and the Python-side aliases
    /// (`numpy`, `jax`, `torch`). Unknown names are unavailable backends.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ndarray" | "numpy" => Ok(BackendKind::Ndarray),
            "dual" | "jax" => Ok(BackendKind::Dual),
            "tape" | "torch" => Ok(BackendKind::Tape),
            other => Err(CurveletError::BackendUnavailable(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("numpy".parse::<BackendKind>().unwrap(), BackendKind::Ndarray);
        assert_eq!("NDArray".parse::<BackendKind>().unwrap(), BackendKind::Ndarray);
        assert_eq!(" jax ".parse::<BackendKind>().unwrap(), BackendKind::Dual);
        assert_eq!("torch".parse::<BackendKind>().unwrap(), BackendKind::Tape);
        assert!(matches!(
            "cupy".parse::<BackendKind>(),
            Err(CurveletError::BackendUnavailable(ref name)) if name == "cupy"
        ));
    }

    #[test]
    fn test_availability_tracks_features() {
        assert!(BackendKind::Ndarray.ensure_available().is_ok());
        assert_eq!(BackendKind::Dual.is_available(), cfg!(feature = "dual"));
        assert_eq!(BackendKind::Tape.ensure_available().is_ok(), cfg!(feature = "tape"));
        for kind in BackendKind::ALL {
            assert_eq!(kind.to_string().parse::<BackendKind>().unwrap(), kind);
        }
    }
}
