use numpy::{IntoPyArray, PyArray1, PyArray2, PyArray3, PyReadonlyArray2, PyReadonlyArray3};
use pyo3::exceptions::PyIndexError;
use pyo3::prelude::*;
use ndarray::{Array2, Axis};
use rustfft::num_complex::Complex64;
use std::sync::Arc;

use crate::backend::BackendKind;
use crate::settings::{default_nbscales, DctSettings, Finest};
use crate::system::{build_curvelet_system_par, CurveletSystem};
use crate::transform::{stack, DynTransform};
use crate::wrapping::NativeWrapping;

fn settings_from(
    rows: usize,
    cols: usize,
    is_real: bool,
    finest: u8,
    nbscales: Option<usize>,
    nbangles_coarse: usize,
) -> PyResult<DctSettings> {
    let finest = Finest::try_from(finest).map_err(pyo3::exceptions::PyValueError::new_err)?;
    let nbscales = nbscales.unwrap_or_else(|| default_nbscales(rows, cols));
    Ok(DctSettings::new(is_real, finest, nbscales, nbangles_coarse))
}

fn build(py: Python<'_>, rows: usize, cols: usize, settings: DctSettings) -> PyResult<CurveletSystem> {
    let system = py.allow_threads(|| {
        build_curvelet_system_par(&NativeWrapping::new(), rows, cols, &settings)
    })?;
    Ok(system)
}

/// Accepts real or complex 2D arrays.
fn image_from(img: &PyAny) -> PyResult<Array2<Complex64>> {
    if let Ok(complex) = img.extract::<PyReadonlyArray2<Complex64>>() {
        return Ok(complex.as_array().to_owned());
    }
    let real = img.extract::<PyReadonlyArray2<f64>>()?;
    Ok(real.as_array().mapv(|v| Complex64::new(v, 0.0)))
}

#[pyclass(name = "CurveletSystem", module = "diffcurve")]
pub struct PyCurveletSystem {
    inner: Arc<CurveletSystem>,
}

#[pymethods]
impl PyCurveletSystem {
    #[new]
    #[pyo3(signature = (img_length, img_width, is_real=false, finest=2, nbscales=None, nbangles_coarse=16))]
    fn new(
        py: Python<'_>,
        img_length: usize,
        img_width: usize,
        is_real: bool,
        finest: u8,
        nbscales: Option<usize>,
        nbangles_coarse: usize,
    ) -> PyResult<Self> {
        let settings = settings_from(img_length, img_width, is_real, finest, nbscales, nbangles_coarse)?;
        Ok(PyCurveletSystem {
            inner: Arc::new(build(py, img_length, img_width, settings)?),
        })
    }

    /// Frequency-domain waveforms, shape `(n, img_length, img_width)`.
    #[getter]
    fn waveforms<'py>(&self, py: Python<'py>) -> &'py PyArray3<Complex64> {
        self.inner.waveforms().to_owned().into_pyarray(py)
    }

    #[getter]
    fn support_size<'py>(&self, py: Python<'py>) -> &'py PyArray1<f64> {
        self.inner.support_size().to_owned().into_pyarray(py)
    }

    /// Native coefficient footprint of every wedge.
    #[getter]
    fn dims(&self) -> Vec<(usize, usize)> {
        self.inner.footprints().to_vec()
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    #[pyo3(signature = (img, backend="numpy"))]
    fn fdct<'py>(&self, py: Python<'py>, img: &PyAny, backend: &str) -> PyResult<&'py PyArray3<Complex64>> {
        let kind: BackendKind = backend.parse()?;
        let image = image_from(img)?;
        let (rows, cols) = self.inner.dim();
        let system = Arc::clone(&self.inner);
        let coeffs = py.allow_threads(move || {
            DynTransform::new(kind, &system)?
                .forward(&image)
                .map(|maps| stack(&maps, rows, cols))
        })?;
        Ok(coeffs.into_pyarray(py))
    }

    #[pyo3(signature = (coeffs, backend="numpy"))]
    fn ifdct<'py>(
        &self,
        py: Python<'py>,
        coeffs: PyReadonlyArray3<Complex64>,
        backend: &str,
    ) -> PyResult<&'py PyArray3<Complex64>> {
        let kind: BackendKind = backend.parse()?;
        let maps: Vec<Array2<Complex64>> = coeffs
            .as_array()
            .axis_iter(Axis(0))
            .map(|c| c.to_owned())
            .collect();
        let (rows, cols) = self.inner.dim();
        let system = Arc::clone(&self.inner);
        let decomposition = py.allow_threads(move || {
            DynTransform::new(kind, &system)?
                .inverse(&maps)
                .map(|maps| stack(&maps, rows, cols))
        })?;
        Ok(decomposition.into_pyarray(py))
    }

    /// Waveform `idx` in the image domain.
    fn spatial_waveform<'py>(&self, py: Python<'py>, idx: usize) -> PyResult<&'py PyArray2<Complex64>> {
        if idx >= self.inner.len() {
            return Err(PyIndexError::new_err(format!(
                "wedge index {idx} out of range for {} wedges",
                self.inner.len()
            )));
        }
        Ok(self.inner.spatial_waveform(idx).into_pyarray(py))
    }

    fn __repr__(&self) -> String {
        let (rows, cols) = self.inner.dim();
        format!(
            "CurveletSystem({rows}x{cols}, wedges={}, settings={:?})",
            self.inner.len(),
            self.inner.settings()
        )
    }
}

/// Returns `(waveforms, dims)` for the given image size and settings.
#[pyfunction]
#[pyo3(signature = (img_length, img_width, is_real=false, finest=2, nbscales=None, nbangles_coarse=16))]
pub fn get_curvelet_system<'py>(
    py: Python<'py>,
    img_length: usize,
    img_width: usize,
    is_real: bool,
    finest: u8,
    nbscales: Option<usize>,
    nbangles_coarse: usize,
) -> PyResult<(&'py PyArray3<Complex64>, Vec<(usize, usize)>)> {
    let settings = settings_from(img_length, img_width, is_real, finest, nbscales, nbangles_coarse)?;
    let system = build(py, img_length, img_width, settings)?;
    let dims = system.footprints().to_vec();
    Ok((system.waveforms().to_owned().into_pyarray(py), dims))
}
