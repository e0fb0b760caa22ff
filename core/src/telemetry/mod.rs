//! telemetry/mod.rs
//! Per-stream counters, exposed as a serializable snapshot.

pub mod counters;

pub use counters::*;
