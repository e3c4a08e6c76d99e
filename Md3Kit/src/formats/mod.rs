//! File format handlers
//!
//! Currently only the id Tech 3 MD3 model format.

pub mod md3;

// Re-export main model types
pub use md3::{Md3Model, encode_md3, parse_md3_bytes, read_md3, write_md3};
