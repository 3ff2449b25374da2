//! Dense containers backing training data and batch predictions.
//!
//! `Array2` is a row-major matrix: one row per example, one column per
//! feature.
pub mod matrix;

pub use matrix::{Array2, ShapeError};
