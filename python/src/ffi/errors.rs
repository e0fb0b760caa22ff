//! ffi/errors.rs
//! `StreamError` / `CompressionError` -> Python exceptions.
//!
//! | Rust                         | Python                                   |
//! | ---------------------------- | ---------------------------------------- |
//! | `Io`                         | `OSError` (subclass chosen from errno)   |
//! | `Unsupported`                | `io.UnsupportedOperation` (an `OSError`) |
//! | `Compression`                | `ZstreamCodecError` (a `ValueError`)     |
//! | mode / state errors          | `ValueError`                             |
//! | invalid UTF-8 in text mode   | `UnicodeDecodeError`                     |

use std::str::Utf8Error;

use pyo3::exceptions::{PyUnicodeDecodeError, PyValueError};
use pyo3::prelude::*;
use pyo3::{create_exception, import_exception};

use zstream_core::compression::CompressionError;
use zstream_core::StreamError;

create_exception!(pyzstream, ZstreamCodecError, PyValueError, "Corrupt or truncated compressed data.");
import_exception!(io, UnsupportedOperation);

pub fn codec_err(e: CompressionError) -> PyErr {
    ZstreamCodecError::new_err(format!("{} ({})", e, e.category()))
}

pub fn to_py_err(e: StreamError) -> PyErr {
    match e {
        StreamError::Io(inner) => PyErr::from(inner),
        StreamError::Unsupported { .. } => UnsupportedOperation::new_err(e.to_string()),
        StreamError::Compression(inner) => codec_err(inner),
        other => PyValueError::new_err(other.to_string()),
    }
}

/// `UnicodeDecodeError` pointing at the bad bytes of `input`.
pub fn decode_err(py: Python<'_>, input: &[u8], err: Utf8Error) -> PyErr {
    match PyUnicodeDecodeError::new_utf8_bound(py, input, err) {
        Ok(exc) => PyErr::from_value_bound(exc.into_any()),
        Err(e) => e,
    }
}

/// `?`-friendly adapter for stream results.
pub trait IntoPyResult<T> {
    fn py(self) -> PyResult<T>;
}

impl<T> IntoPyResult<T> for Result<T, StreamError> {
    fn py(self) -> PyResult<T> {
        self.map_err(to_py_err)
    }
}

impl<T> IntoPyResult<T> for Result<T, CompressionError> {
    fn py(self) -> PyResult<T> {
        self.map_err(codec_err)
    }
}
