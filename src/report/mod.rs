//! Reporting utilities: formatted terminal output for scans and fits.
//!
//! We keep formatting code in one place so:
//! - the scanning/fitting code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

pub mod format;

pub use format::*;
