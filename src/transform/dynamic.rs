use super::CurveletTransform;
use crate::backend::{BackendKind, NdarrayBackend};
#[cfg(any(feature = "dual", feature = "tape"))]
use crate::backend::Backend;
use crate::error::{CurveletError, Result};
use crate::system::CurveletSystem;
use ndarray::Array2;
use rustfft::num_complex::Complex64;

#[cfg(feature = "dual")]
use crate::backend::DualBackend;
#[cfg(feature = "tape")]
use crate::backend::TapeBackend;

/// A transform whose backend is picked at runtime. Inputs and outputs are
/// plain arrays; differentiable backends contribute their primal values.
pub enum DynTransform {
    Ndarray(CurveletTransform<NdarrayBackend>),
    #[cfg(feature = "dual")]
    Dual(CurveletTransform<DualBackend>),
    #[cfg(feature = "tape")]
    Tape(CurveletTransform<TapeBackend>),
}

#[cfg(any(feature = "dual", feature = "tape"))]
fn forward_plain<B: Backend>(t: &CurveletTransform<B>, image: &Array2<Complex64>) -> Result<Vec<Array2<Complex64>>> {
    let lifted = t.backend().lift(&image.view());
    let coeffs = t.forward(&lifted)?;
    Ok(coeffs.iter().map(|c| t.backend().primal(c)).collect())
}

#[cfg(any(feature = "dual", feature = "tape"))]
fn inverse_plain<B: Backend>(t: &CurveletTransform<B>, coeffs: &[Array2<Complex64>]) -> Result<Vec<Array2<Complex64>>> {
    let lifted: Vec<B::Array> = coeffs.iter().map(|c| t.backend().lift(&c.view())).collect();
    let decomposition = t.inverse(&lifted)?;
    Ok(decomposition.iter().map(|d| t.backend().primal(d)).collect())
}

impl DynTransform {
    #[allow(unreachable_patterns)]
    pub fn new(kind: BackendKind, system: &CurveletSystem) -> Result<Self> {
        match kind.ensure_available()? {
            BackendKind::Ndarray => Ok(DynTransform::Ndarray(CurveletTransform::new(NdarrayBackend, system))),
            #[cfg(feature = "dual")]
            BackendKind::Dual => Ok(DynTransform::Dual(CurveletTransform::new(DualBackend, system))),
            #[cfg(feature = "tape")]
            BackendKind::Tape => Ok(DynTransform::Tape(CurveletTransform::new(TapeBackend, system))),
            other => Err(CurveletError::BackendUnavailable(other.name().to_string())),
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            DynTransform::Ndarray(_) => BackendKind::Ndarray,
            #[cfg(feature = "dual")]
            DynTransform::Dual(_) => BackendKind::Dual,
            #[cfg(feature = "tape")]
            DynTransform::Tape(_) => BackendKind::Tape,
        }
    }

    pub fn forward(&self, image: &Array2<Complex64>) -> Result<Vec<Array2<Complex64>>> {
        match self {
            DynTransform::Ndarray(t) => t.forward_par(image),
            #[cfg(feature = "dual")]
            DynTransform::Dual(t) => forward_plain(t, image),
            #[cfg(feature = "tape")]
            DynTransform::Tape(t) => forward_plain(t, image),
        }
    }

    pub fn inverse(&self, coeffs: &[Array2<Complex64>]) -> Result<Vec<Array2<Complex64>>> {
        match self {
            DynTransform::Ndarray(t) => t.inverse_par(coeffs),
            #[cfg(feature = "dual")]
            DynTransform::Dual(t) => inverse_plain(t, coeffs),
            #[cfg(feature = "tape")]
            DynTransform::Tape(t) => inverse_plain(t, coeffs),
        }
    }
}
