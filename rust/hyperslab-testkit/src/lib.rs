//! Test utilities for the hyperslab crates.
//!
//! This crate provides:
//! - [`DenseGrid`], a brute-force bitmap model of a selection over an extent
//! - Random generators of in-extent hyperslab arguments
//!
//! Nothing here depends on the `hyperslab` crate; the models are compared
//! against it from its tests.

pub mod dense_grid;
pub mod random;

pub use dense_grid::DenseGrid;
pub use random::{HyperslabArgs, random_hyperslab, seeded_rng};
