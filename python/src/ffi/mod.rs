//! ffi/mod.rs
//! Python-facing classes and functions.

use pyo3::prelude::*;

mod errors;
mod functions;
mod openmode;
mod zstream;

pub use errors::ZstreamCodecError;
pub use openmode::PyOpenMode;
pub use zstream::PyZStream;

pub fn register(py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add("ZstreamCodecError", py.get_type_bound::<ZstreamCodecError>())?;
    m.add_class::<PyOpenMode>()?;
    m.add_class::<PyZStream>()?;
    functions::register(m)?;
    Ok(())
}
