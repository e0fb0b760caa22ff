//! zstream/mod.rs
//! Seekless compressed file stream.
//!
//! - `core`: the `ZStream` engine (open/close, block and line I/O, sync).
//! - `types`: status bits, capability tags, lifecycle state, configuration.

pub mod core;
pub mod types;

pub use self::core::*;
pub use self::types::*;
