//! Collection aliases shared by the hull engine and the diagram layers.
//!
//! The hot loops only hash small integers and slotmap keys, so every map and
//! set uses the `rustc_hash` Fx hasher. Short per-face tuples live in
//! `smallvec` buffers sized for [`MAX_DIMENSION`].

mod aliases;

pub use aliases::*;
