//! Peak fitting for the MI-vs-lag curve.
//!
//! Responsibilities:
//!
//! - locate the raw MI maximum with a deterministic tie-break
//! - fit a quadratic peak model over a local window (vertex = peak lag)
//! - fit a piecewise-linear model via breakpoint grid search
//! - select the better model, falling back to the raw maximum on degeneracy

pub mod peak;
pub mod piecewise;
pub mod quadratic;
pub mod selection;

pub use peak::*;
pub use piecewise::*;
pub use quadratic::*;
pub use selection::*;
