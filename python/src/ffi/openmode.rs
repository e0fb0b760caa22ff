//! ffi/openmode.rs
//! `openmode`: flag set with `&`, `|`, `^`, `~`.

use std::str::FromStr;

use pyo3::prelude::*;

use zstream_core::OpenMode;

use super::errors::IntoPyResult;

#[pyclass(name = "openmode", module = "pyzstream", frozen, eq, hash)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PyOpenMode {
    pub inner: OpenMode,
}

impl From<OpenMode> for PyOpenMode {
    fn from(inner: OpenMode) -> Self {
        Self { inner }
    }
}

#[pymethods]
impl PyOpenMode {
    #[classattr]
    fn none() -> Self {
        OpenMode::NONE.into()
    }

    #[classattr]
    fn input() -> Self {
        OpenMode::INPUT.into()
    }

    #[classattr]
    fn output() -> Self {
        OpenMode::OUTPUT.into()
    }

    #[classattr]
    fn binary() -> Self {
        OpenMode::BINARY.into()
    }

    #[classattr]
    fn all() -> Self {
        OpenMode::ALL.into()
    }

    /// Parse `open()`-style letters: "r", "w", "rb", "wt", ...
    #[staticmethod]
    fn from_string(s: &str) -> PyResult<Self> {
        OpenMode::from_str(s).py().map(Self::from)
    }

    #[getter]
    fn bits(&self) -> u8 {
        self.inner.bits()
    }

    fn is_input(&self) -> bool {
        self.inner.is_input()
    }

    fn is_output(&self) -> bool {
        self.inner.is_output()
    }

    fn is_binary(&self) -> bool {
        self.inner.is_binary()
    }

    fn __and__(&self, other: &Self) -> Self {
        (self.inner & other.inner).into()
    }

    fn __or__(&self, other: &Self) -> Self {
        (self.inner | other.inner).into()
    }

    fn __xor__(&self, other: &Self) -> Self {
        (self.inner ^ other.inner).into()
    }

    fn __invert__(&self) -> Self {
        (!self.inner).into()
    }

    fn __bool__(&self) -> bool {
        !self.inner.is_empty()
    }

    fn __str__(&self) -> String {
        self.inner.to_string()
    }

    fn __repr__(&self) -> String {
        format!("<openmode {}>", self.inner)
    }
}
