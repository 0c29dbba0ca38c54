//! Model selection for the fitted peak.
//!
//! Both peak models are fit (unless the configuration restricts them) and
//! the reported best is chosen by:
//!
//! 1. successful fits beat raw-maximum fallbacks
//! 2. among successful fits, the smaller peak-location standard error wins
//!    (a missing/NaN uncertainty ranks below a finite one)
//! 3. remaining ties keep the earlier model in configuration order
//!
//! The models are fit on different supports (local window vs full curve), so
//! residual magnitudes are not directly comparable; the peak-location
//! uncertainty is the quantity the caller actually consumes, which makes it
//! the selection criterion.

use crate::domain::{FitModelKind, LagScanResult, PeakFit, ScanConfig};
use crate::error::AppError;
use crate::fit::piecewise::fit_piecewise;
use crate::fit::quadratic::fit_quadratic;

/// Output of fitting + selection.
#[derive(Debug, Clone)]
pub struct FitSelection {
    pub best: PeakFit,
    /// Fits for all attempted models, in configuration order.
    pub fits: Vec<PeakFit>,
}

/// Fit the configured peak model(s) to a scan and select the best.
///
/// Fails (exit code 3) only when the scan contains no finite MI records at
/// all; every per-model pathology is already a structured fallback.
pub fn fit_peak(scan: &LagScanResult, config: &ScanConfig) -> Result<FitSelection, AppError> {
    if scan.finite_points().is_empty() {
        return Err(AppError::insufficient(
            "Every lag was skipped; no MI curve to fit. Widen the lag range or lower min_overlap.",
        ));
    }

    let fits: Vec<PeakFit> = config
        .model_kinds()
        .into_iter()
        .map(|kind| match kind {
            FitModelKind::Quadratic => fit_quadratic(&scan.records, config.peak_window),
            FitModelKind::PiecewiseLinear => fit_piecewise(&scan.records),
        })
        .collect();

    let best = select_best(&fits).clone();
    Ok(FitSelection { best, fits })
}

fn select_best(fits: &[PeakFit]) -> &PeakFit {
    let mut best = &fits[0];
    for f in &fits[1..] {
        if rank(f) < rank(best) {
            best = f;
        }
    }
    best
}

/// Ordering key: (fallback?, NaN uncertainty?, uncertainty).
fn rank(fit: &PeakFit) -> (u8, u8, f64) {
    let fallback = fit.outcome.is_fallback() as u8;
    let se = fit.outcome.peak_lag_se();
    let se_nan = se.is_nan() as u8;
    (fallback, se_nan, if se.is_nan() { 0.0 } else { se })
}
