//! ffi/functions.rs
//! One-shot in-memory helpers.

use pyo3::prelude::*;
use pyo3::types::PyBytes;

use zstream_core::compression::stream::{compress_bytes, decompress_bytes};

use super::errors::IntoPyResult;

/// gzip-compress `data`.
#[pyfunction]
#[pyo3(signature = (data, level=None))]
fn compress<'py>(py: Python<'py>, data: &[u8], level: Option<u32>) -> PyResult<Bound<'py, PyBytes>> {
    let out = compress_bytes(data, level).py()?;
    Ok(PyBytes::new_bound(py, &out))
}

/// Decode gzip or zlib `data`.
#[pyfunction]
fn decompress<'py>(py: Python<'py>, data: &[u8]) -> PyResult<Bound<'py, PyBytes>> {
    let out = decompress_bytes(data).py()?;
    Ok(PyBytes::new_bound(py, &out))
}

pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(compress, m)?)?;
    m.add_function(wrap_pyfunction!(decompress, m)?)?;
    Ok(())
}
