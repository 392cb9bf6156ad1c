//! Sieve Snapshot Format and Loader
//!
//! Compiled engines are stored as a single little-endian buffer: a fixed
//! header, a section directory and one section per filter list or index.
//! The writer lives in the compiler crate.

mod format;
mod loader;

pub use format::*;
pub use loader::*;
