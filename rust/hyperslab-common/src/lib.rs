//! Core definitions (error types and result helpers), relied upon by all hyperslab-* crates.

pub mod error;
pub mod macros;
pub mod result;

pub use result::Result;
