//! Result export: scan records to CSV, full results to JSON.

pub mod export;

pub use export::*;
