//! Geometry math: unit conversion, affine transforms, and outline paths.

pub mod matrix;
pub mod path;
pub mod units;

pub use matrix::Matrix;
pub use path::{Geometry, PathCommand, Pt, build_path};
