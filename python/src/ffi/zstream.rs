//! ffi/zstream.rs
//! `zstream`: file-like wrapper over `ZStream`.
//!
//! Text-mode reads return `str`; binary-mode reads return `bytes`. Sizes
//! count bytes, so a text read may end inside a multi-byte character: the
//! incomplete tail is held back and prefixed to the next read. Invalid UTF-8,
//! or a tail still incomplete at eof, raises `UnicodeDecodeError`. Writes
//! accept `str`, `bytes` or `bytearray` in either mode.

use std::path::PathBuf;
use std::str::FromStr;

use pyo3::exceptions::{PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyByteArray, PyBytes, PyDict, PyList, PyString};

use zstream_core::constants::DEFAULT_BUFFER_SIZE;
use zstream_core::{OpenMode, ZStream, ZStreamConfig};

use super::errors::{decode_err, to_py_err, IntoPyResult, UnsupportedOperation};
use super::openmode::PyOpenMode;

/// `mode=` accepts an `openmode` or a letter string.
#[derive(FromPyObject)]
enum ModeArg {
    Mode(PyOpenMode),
    Letters(String),
}

impl ModeArg {
    fn resolve(self) -> PyResult<OpenMode> {
        match self {
            ModeArg::Mode(m) => Ok(m.inner),
            ModeArg::Letters(s) => OpenMode::from_str(&s).py(),
        }
    }
}

fn as_bytes(obj: &Bound<'_, PyAny>) -> PyResult<Vec<u8>> {
    if let Ok(b) = obj.downcast::<PyBytes>() {
        Ok(b.as_bytes().to_vec())
    } else if let Ok(s) = obj.downcast::<PyString>() {
        Ok(s.to_cow()?.as_bytes().to_vec())
    } else if let Ok(b) = obj.downcast::<PyByteArray>() {
        Ok(b.to_vec())
    } else {
        Err(PyTypeError::new_err(format!(
            "expected str, bytes or bytearray, got {}",
            obj.get_type().name()?
        )))
    }
}

fn limit(n: i64) -> Option<usize> {
    usize::try_from(n).ok()
}

#[pyclass(name = "zstream", module = "pyzstream", unsendable)]
pub struct PyZStream {
    inner: ZStream,
    /// Leading bytes of a UTF-8 character split by the last text read.
    partial: Vec<u8>,
}

impl PyZStream {
    fn emit(&mut self, py: Python<'_>, data: Vec<u8>) -> PyResult<PyObject> {
        if self.inner.is_binary() {
            return Ok(PyBytes::new_bound(py, &data).into_any().unbind());
        }
        let mut bytes = std::mem::take(&mut self.partial);
        bytes.extend_from_slice(&data);
        let complete = match std::str::from_utf8(&bytes) {
            Ok(_) => bytes.len(),
            Err(e) if e.error_len().is_none() && !self.inner.eof() => e.valid_up_to(),
            Err(e) => return Err(decode_err(py, &bytes, e)),
        };
        self.partial = bytes.split_off(complete);
        let text = std::str::from_utf8(&bytes).map_err(|e| decode_err(py, &bytes, e))?;
        Ok(PyString::new_bound(py, text).into_any().unbind())
    }
}

#[pymethods]
impl PyZStream {
    #[new]
    #[pyo3(signature = (bufsize=DEFAULT_BUFFER_SIZE, filename=None, mode=None))]
    fn new(bufsize: usize, filename: Option<PathBuf>, mode: Option<ModeArg>) -> PyResult<Self> {
        let config = ZStreamConfig::with_buffer_size(bufsize);
        config.validate().py()?;
        let mut inner = ZStream::with_config(config);
        if let Some(path) = filename {
            let mode = match mode {
                Some(m) => m.resolve()?,
                None => OpenMode::INPUT,
            };
            inner.open(path, mode).py()?;
        }
        Ok(Self { inner, partial: Vec::new() })
    }

    #[pyo3(signature = (filename, mode=None))]
    fn open(&mut self, filename: PathBuf, mode: Option<ModeArg>) -> PyResult<()> {
        let mode = match mode {
            Some(m) => m.resolve()?,
            None => OpenMode::INPUT,
        };
        self.partial.clear();
        self.inner.open(filename, mode).py()
    }

    fn close(&mut self) -> PyResult<()> {
        self.partial.clear();
        self.inner.close().py()
    }

    // ---- reads ----

    /// Strict read: fewer than `n` bytes sets eof and fail. `n < 0` reads to the end.
    #[pyo3(signature = (n=-1))]
    fn read(&mut self, py: Python<'_>, n: i64) -> PyResult<PyObject> {
        let data = self.inner.read(limit(n)).py()?;
        self.emit(py, data)
    }

    /// Up to `n` bytes, stopping before `delim`.
    #[pyo3(signature = (n, delim=None))]
    fn get(&mut self, py: Python<'_>, n: usize, delim: Option<Bound<'_, PyAny>>) -> PyResult<PyObject> {
        let delim = match delim {
            None => b'\n',
            Some(obj) => match as_bytes(&obj)?.as_slice() {
                [b] => *b,
                _ => return Err(PyValueError::new_err("delim must be a single byte")),
            },
        };
        let data = self.inner.get(n, delim).py()?;
        self.emit(py, data)
    }

    #[pyo3(signature = (size=-1))]
    fn readline(&mut self, py: Python<'_>, size: i64) -> PyResult<PyObject> {
        let line = self.inner.read_line(limit(size)).py()?;
        self.emit(py, line)
    }

    #[pyo3(signature = (hint=-1))]
    fn readlines<'py>(&mut self, py: Python<'py>, hint: i64) -> PyResult<Bound<'py, PyList>> {
        let lines = self.inner.read_lines(limit(hint)).py()?;
        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            items.push(self.emit(py, line)?);
        }
        Ok(PyList::new_bound(py, items))
    }

    fn __iter__(slf: PyRef<'_, Self>) -> PyRef<'_, Self> {
        slf
    }

    fn __next__(&mut self, py: Python<'_>) -> PyResult<Option<PyObject>> {
        let line = self.inner.read_line(None).py()?;
        if line.is_empty() && self.partial.is_empty() {
            return Ok(None);
        }
        self.emit(py, line).map(Some)
    }

    // ---- writes ----

    fn write(&mut self, data: &Bound<'_, PyAny>) -> PyResult<usize> {
        let bytes = as_bytes(data)?;
        self.inner.write(&bytes).py()
    }

    fn writelines(&mut self, lines: &Bound<'_, PyAny>) -> PyResult<usize> {
        let mut total = 0;
        for item in lines.iter()? {
            total += self.write(&item?)?;
        }
        Ok(total)
    }

    fn sync(&mut self) -> PyResult<()> {
        self.inner.sync().py()
    }

    fn flush(&mut self) -> PyResult<()> {
        self.inner.sync().py()
    }

    fn final_sync(&mut self) -> PyResult<()> {
        self.inner.final_sync().py()
    }

    // ---- unsupported ----

    #[pyo3(signature = (*_args))]
    fn seek(&mut self, _args: &Bound<'_, pyo3::types::PyTuple>) -> PyResult<u64> {
        self.inner.seek(0).py()
    }

    #[pyo3(signature = (size=None))]
    fn truncate(&mut self, size: Option<u64>) -> PyResult<u64> {
        self.inner.truncate(size).py()
    }

    fn seekable(&self) -> bool {
        false
    }

    // ---- queries ----

    fn tellg(&self) -> i64 {
        self.inner.tellg()
    }

    fn tellp(&self) -> i64 {
        self.inner.tellp()
    }

    /// Position of whichever cursor is active.
    fn tell(&self) -> i64 {
        self.inner.tellg().max(self.inner.tellp())
    }

    fn eof(&self) -> bool {
        self.inner.eof()
    }

    fn fail(&self) -> bool {
        self.inner.fail()
    }

    fn good(&self) -> bool {
        self.inner.good()
    }

    fn gcount(&self) -> usize {
        self.inner.gcount()
    }

    fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    #[getter]
    fn closed(&self) -> bool {
        self.inner.is_closed()
    }

    fn is_readable(&self) -> bool {
        self.inner.is_readable()
    }

    fn is_writable(&self) -> bool {
        self.inner.is_writable()
    }

    fn readable(&self) -> bool {
        self.inner.is_readable()
    }

    fn writable(&self) -> bool {
        self.inner.is_writable()
    }

    fn is_binary(&self) -> bool {
        self.inner.is_binary()
    }

    fn native_handle(&self) -> i32 {
        self.inner.native_handle()
    }

    fn fileno(&self) -> PyResult<i32> {
        if self.inner.is_closed() {
            return Err(UnsupportedOperation::new_err("fileno() on a closed zstream"));
        }
        Ok(self.inner.native_handle())
    }

    fn openmode(&self) -> PyOpenMode {
        self.inner.openmode().into()
    }

    #[getter]
    fn name(&self) -> Option<PathBuf> {
        self.inner.path().map(|p| p.to_path_buf())
    }

    #[getter]
    fn bufsize(&self) -> usize {
        self.inner.config().buffer_size
    }

    fn state(&self) -> String {
        self.inner.state().to_string()
    }

    /// Byte and call counters of the current open stream.
    fn counters<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let c = self.inner.counters();
        let d = PyDict::new_bound(py);
        d.set_item("bytes_uncompressed_in", c.bytes_uncompressed_in)?;
        d.set_item("bytes_uncompressed_out", c.bytes_uncompressed_out)?;
        d.set_item("bytes_compressed_in", c.bytes_compressed_in)?;
        d.set_item("bytes_compressed_out", c.bytes_compressed_out)?;
        d.set_item("physical_reads", c.physical_reads)?;
        d.set_item("physical_writes", c.physical_writes)?;
        Ok(d)
    }

    // ---- context manager ----

    fn __enter__(slf: PyRef<'_, Self>) -> PyRef<'_, Self> {
        slf
    }

    #[pyo3(signature = (_exc_type=None, _exc_value=None, _traceback=None))]
    fn __exit__(
        &mut self,
        _exc_type: Option<&Bound<'_, PyAny>>,
        _exc_value: Option<&Bound<'_, PyAny>>,
        _traceback: Option<&Bound<'_, PyAny>>,
    ) -> PyResult<bool> {
        self.partial.clear();
        self.inner.close().map_err(to_py_err)?;
        Ok(false)
    }

    fn __repr__(&self) -> String {
        match self.inner.path() {
            Some(p) => format!("<zstream {} mode={} state={}>", p.display(), self.inner.openmode(), self.inner.state()),
            None => format!("<zstream closed mode={}>", self.inner.openmode()),
        }
    }
}
