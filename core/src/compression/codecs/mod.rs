//! compression/codecs/mod.rs
//! Streaming codecs. gzip is read and written; zlib is read only; auto
//! picks between the two on the read side.

pub mod auto;
pub mod gzip;
pub mod zlib;

pub use auto::*;
pub use gzip::*;
pub use zlib::*;
