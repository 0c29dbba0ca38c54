//! Lag scanning orchestration.
//!
//! Responsibilities:
//!
//! - generate the lag grid (validated once, up front)
//! - align the two series on a shared regular grid per lag
//! - evaluate MI per lag (parallel) with NaN records for skipped lags

pub mod align;
pub mod lags;
pub mod scanner;

pub use align::*;
pub use lags::*;
pub use scanner::*;
