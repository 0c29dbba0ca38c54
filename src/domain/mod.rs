//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input timeseries and scan configuration (`Timeseries`, `ScanConfig`)
//! - estimator and model knobs (`BinStrategy`, `FitModelSpec`)
//! - scan outputs (`LagRecord`, `LagScanResult`, `ScanStats`)
//! - fit outputs (`PeakFit`, `FitOutcome`, `FitSelection`)

pub mod types;

pub use types::*;
