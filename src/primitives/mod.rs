//! Core compute primitives (Vector, Matrix).
//!
//! These types provide the foundation for the feature matrix and the
//! classifier backends.

mod matrix;
mod vector;

pub use matrix::Matrix;
pub use vector::Vector;
