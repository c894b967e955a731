//! Measurement helpers shared by tests, benches and callers profiling builds.

pub mod measurement;

pub use measurement::*;
