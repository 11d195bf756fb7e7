mod curvelet;

pub use curvelet::*;

use crate::error::CurveletError;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyModule;

impl From<CurveletError> for PyErr {
    fn from(err: CurveletError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

/// diffcurve - differentiable 2D curvelet transforms in Rust
#[pymodule]
pub fn diffcurve(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add_class::<PyCurveletSystem>()?;
    m.add_function(wrap_pyfunction!(get_curvelet_system, m)?)?;
    Ok(())
}
