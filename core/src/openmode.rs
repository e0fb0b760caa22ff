//! openmode.rs
//! Open-mode flag set: {input, output, binary} with boolean algebra and
//! parsing from `open()`-style letter codes.
use std::fmt;
use std::str::FromStr;

use crate::types::StreamError;

bitflags::bitflags! {
    /// Direction and representation requested when opening a stream.
    ///
    /// `!mode` complements within the three defined bits, so
    /// `!OpenMode::NONE == OpenMode::ALL` and `!OpenMode::ALL == OpenMode::NONE`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpenMode: u8 {
        const INPUT  = 0b0000_0001;
        const OUTPUT = 0b0000_0010;
        const BINARY = 0b0000_0100;
    }
}

/// The one direction an open stream operates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl OpenMode {
    pub const NONE: OpenMode = OpenMode::empty();
    pub const ALL: OpenMode = OpenMode::all();

    pub fn is_input(&self) -> bool {
        self.contains(OpenMode::INPUT)
    }

    pub fn is_output(&self) -> bool {
        self.contains(OpenMode::OUTPUT)
    }

    pub fn is_binary(&self) -> bool {
        self.contains(OpenMode::BINARY)
    }

    /// Direction for opening a stream; exactly one of input/output must be set.
    pub fn direction(&self) -> Result<Direction, StreamError> {
        match (self.is_input(), self.is_output()) {
            (true, false) => Ok(Direction::Input),
            (false, true) => Ok(Direction::Output),
            (true, true) => Err(StreamError::InvalidMode(format!(
                "{self}: mixed read/write streams are not supported"
            ))),
            (false, false) => Err(StreamError::InvalidMode(format!(
                "{self}: one of input or output is required"
            ))),
        }
    }
}

impl Default for OpenMode {
    /// Fresh streams default to input.
    fn default() -> Self {
        OpenMode::INPUT
    }
}

impl FromStr for OpenMode {
    type Err = StreamError;

    /// Letter codes as accepted by `open()`: `r`, `w`, `b`, `t`, `+`.
    /// Append (`a`) and exclusive-create (`x`) are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(StreamError::InvalidMode("empty mode string".into()));
        }

        let mut mode = OpenMode::NONE;
        let mut text = false;
        let mut seen = Vec::with_capacity(s.len());

        for c in s.chars() {
            if seen.contains(&c) {
                return Err(StreamError::InvalidMode(format!("{s:?}: repeated '{c}'")));
            }
            seen.push(c);
            match c {
                'r' => mode |= OpenMode::INPUT,
                'w' => mode |= OpenMode::OUTPUT,
                'b' => mode |= OpenMode::BINARY,
                't' => text = true,
                '+' => mode |= OpenMode::INPUT | OpenMode::OUTPUT,
                'a' | 'x' => {
                    return Err(StreamError::InvalidMode(format!("{s:?}: '{c}' mode is not supported")));
                }
                other => {
                    return Err(StreamError::InvalidMode(format!("{s:?}: unknown mode letter '{other}'")));
                }
            }
        }
        if text && mode.is_binary() {
            return Err(StreamError::InvalidMode(format!("{s:?}: cannot be both text and binary")));
        }
        Ok(mode)
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<&str> = [
            (OpenMode::INPUT, "input"),
            (OpenMode::OUTPUT, "output"),
            (OpenMode::BINARY, "binary"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
        .collect();
        f.write_str(&names.join("|"))
    }
}
