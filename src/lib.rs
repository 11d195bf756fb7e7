//! Differentiable 2D fast discrete curvelet transforms.
//!
//! A [`CurveletSystem`] is built once per image size and settings by probing
//! a wrapping engine with unit impulses. Forward and inverse transforms then
//! run against it on any [`Backend`]: plain arrays, dual numbers for
//! forward-mode derivatives, or a gradient tape for reverse mode.

pub mod backend;
pub mod error;
pub mod fourier;
pub mod settings;
pub mod system;
pub mod transform;
pub mod wrapping;

#[cfg(feature = "python")]
mod bindings;

pub use backend::{Backend, BackendKind, NdarrayBackend};
pub use error::{CurveletError, Result};
pub use fourier::{fft2c, fftshift2, ifft2c, ifftshift2, Fourier2d};
pub use settings::{DctSettings, Finest};
pub use system::{build_curvelet_system, build_curvelet_system_par, CurveletSystem, SystemCache};
pub use transform::{fdct, fdct_2d, ifdct, ifdct_2d, reconstruct, CurveletTransform, DynTransform};
pub use wrapping::{CurveletEngine, NativeWrapping, WedgeCoefficients};

#[cfg(feature = "dual")]
pub use backend::{DualArray, DualBackend};
#[cfg(feature = "tape")]
pub use backend::{GradTensor, TapeBackend};
