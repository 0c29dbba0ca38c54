//! Mathematical utilities: least squares and gap-aware interpolation.

pub mod interp;
pub mod ols;

pub use interp::*;
pub use ols::*;
