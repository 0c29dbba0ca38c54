//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during scanning and fitting
//! - exported to JSON/CSV
//! - reloaded later for plotting or comparisons

use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// NaN-tolerant (de)serialization for sentinel-valued floats.
///
/// JSON has no NaN literal: skipped-lag MI values and undefined uncertainties
/// are written as `null` and read back as NaN.
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
        if v.is_finite() {
            s.serialize_f64(*v)
        } else {
            s.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(d)?.unwrap_or(f64::NAN))
    }
}

/// A time-ordered sequence of (timestamp, value) samples.
///
/// Timestamps are fractional seconds on an arbitrary epoch; the two input
/// series of a scan only need a *common* epoch, not a common sampling grid.
/// Values may contain NaN, which the aligner treats as gaps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeseries {
    times: Vec<f64>,
    values: Vec<f64>,
}

impl Timeseries {
    /// Build a series from raw timestamps and values.
    ///
    /// Timestamps must be finite and strictly increasing; values may be NaN
    /// (gaps) but the series must contain at least two samples.
    pub fn new(times: Vec<f64>, values: Vec<f64>) -> Result<Self, AppError> {
        if times.len() != values.len() {
            return Err(AppError::config(format!(
                "Timeseries length mismatch: {} timestamps vs {} values.",
                times.len(),
                values.len()
            )));
        }
        if times.len() < 2 {
            return Err(AppError::config("Timeseries needs at least 2 samples."));
        }
        if times.iter().any(|t| !t.is_finite()) {
            return Err(AppError::config("Timeseries timestamps must be finite."));
        }
        for w in times.windows(2) {
            if w[1] <= w[0] {
                return Err(AppError::config(
                    "Timeseries timestamps must be strictly increasing.",
                ));
            }
        }
        Ok(Self { times, values })
    }

    /// Build a series from datetimes (converted to fractional seconds).
    pub fn from_datetimes(stamps: &[NaiveDateTime], values: Vec<f64>) -> Result<Self, AppError> {
        let times = stamps
            .iter()
            .map(|dt| dt.and_utc().timestamp_micros() as f64 * 1e-6)
            .collect();
        Self::new(times, values)
    }

    /// Build a regularly sampled series starting at t=0 with the given step.
    pub fn from_samples(step: f64, values: Vec<f64>) -> Result<Self, AppError> {
        if !(step.is_finite() && step > 0.0) {
            return Err(AppError::config("Sample step must be finite and > 0."));
        }
        let times = (0..values.len()).map(|i| i as f64 * step).collect();
        Self::new(times, values)
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// First and last timestamp.
    pub fn span(&self) -> (f64, f64) {
        (self.times[0], self.times[self.times.len() - 1])
    }

    /// Median spacing between consecutive samples.
    ///
    /// Used as the default resampling grid step when none is configured.
    pub fn median_spacing(&self) -> Option<f64> {
        let mut gaps: Vec<f64> = self.times.windows(2).map(|w| w[1] - w[0]).collect();
        if gaps.is_empty() {
            return None;
        }
        gaps.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let mid = gaps.len() / 2;
        let m = if gaps.len() % 2 == 1 {
            gaps[mid]
        } else {
            (gaps[mid - 1] + gaps[mid]) / 2.0
        };
        if m.is_finite() && m > 0.0 { Some(m) } else { None }
    }
}

/// How per-axis histogram bin counts are chosen for the MI estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinStrategy {
    /// Freedman–Diaconis rule (`h = 2·IQR·n^(-1/3)`), clamped to a sane range.
    FreedmanDiaconis,
    /// Fixed number of equal-width bins per axis.
    Fixed(usize),
}

/// Which peak model(s) to fit to the MI-vs-lag curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FitModelSpec {
    /// Fit both models and report the one with the tighter peak estimate.
    Auto,
    Quadratic,
    Piecewise,
    /// Fit both models (same as `Auto`; kept for explicitness in scripts).
    Both,
}

/// Concrete fitted peak-model kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitModelKind {
    Quadratic,
    PiecewiseLinear,
}

impl FitModelKind {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            FitModelKind::Quadratic => "quadratic",
            FitModelKind::PiecewiseLinear => "piecewise-linear",
        }
    }

    /// Number of fitted parameters (used for residual degrees of freedom).
    pub fn param_count(self) -> usize {
        match self {
            // c0 + c1·x + c2·x²
            FitModelKind::Quadratic => 3,
            // breakpoint x0, level y0, slopes k1/k2
            FitModelKind::PiecewiseLinear => 4,
        }
    }
}

/// One scanned lag.
///
/// `mi` is NaN for lags skipped due to insufficient overlap; `threshold` is
/// the surrogate-derived significance level when surrogate testing is enabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LagRecord {
    /// Applied lag, in the input series' time units. A record at lag ℓ
    /// measures MI between a(t) and b(t+ℓ).
    pub lag: f64,
    /// Mutual information (bits), NaN when the lag was skipped.
    #[serde(with = "nan_as_null")]
    pub mi: f64,
    /// Surrogate significance threshold (bits), if computed.
    pub threshold: Option<f64>,
}

impl LagRecord {
    /// True when the lag was skipped for insufficient overlap.
    pub fn is_skipped(&self) -> bool {
        self.mi.is_nan()
    }

    /// Whether the MI value exceeds the surrogate threshold.
    ///
    /// `None` when no threshold was computed or the record was skipped.
    pub fn is_significant(&self) -> Option<bool> {
        if self.is_skipped() {
            return None;
        }
        self.threshold.map(|t| self.mi > t)
    }
}

/// Scan-level diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanStats {
    pub n_lags: usize,
    pub n_skipped: usize,
    /// Resampling grid step actually used, in the input series' time units.
    pub grid_step: f64,
    /// Maximum finite MI over the scan (NaN when everything was skipped).
    #[serde(with = "nan_as_null")]
    pub mi_max: f64,
    /// Minimum marginal entropy (bits) across aligned A and lagged B, an
    /// upper bound on achievable MI. Only computed when requested.
    pub min_entropy: Option<f64>,
}

/// MI-vs-lag curve: one record per generated lag, lags strictly increasing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LagScanResult {
    pub records: Vec<LagRecord>,
    pub stats: ScanStats,
}

impl LagScanResult {
    /// Lag values in scan order.
    pub fn lags(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.lag).collect()
    }

    /// MI values in scan order (NaN for skipped lags).
    pub fn mi_values(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.mi).collect()
    }

    /// (lag, mi) pairs for the non-skipped records.
    pub fn finite_points(&self) -> Vec<(f64, f64)> {
        self.records
            .iter()
            .filter(|r| !r.is_skipped())
            .map(|r| (r.lag, r.mi))
            .collect()
    }

    /// The surrogate threshold, if surrogate testing ran.
    pub fn threshold(&self) -> Option<f64> {
        self.records.iter().find_map(|r| r.threshold)
    }
}

/// Outcome of a single peak-model fit.
///
/// A degenerate fit (too few points, inverted parabola, singular system,
/// out-of-range peak) falls back to reporting the raw-maximum lag instead of
/// raising; the fallback carries no uncertainty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FitOutcome {
    Fitted {
        /// Lag at the fitted peak, in the input series' time units.
        peak_lag: f64,
        /// Standard error on the peak location from the fit covariance.
        #[serde(with = "nan_as_null")]
        peak_lag_se: f64,
        /// Fitted model parameters (model-specific ordering).
        params: Vec<f64>,
    },
    RawMaximum {
        /// Lag of the raw MI maximum (smallest-|lag| tie-break).
        #[serde(with = "nan_as_null")]
        peak_lag: f64,
        /// Why the fit fell back.
        reason: String,
    },
}

impl FitOutcome {
    pub fn peak_lag(&self) -> f64 {
        match self {
            FitOutcome::Fitted { peak_lag, .. } | FitOutcome::RawMaximum { peak_lag, .. } => {
                *peak_lag
            }
        }
    }

    /// Standard error on the peak lag; NaN for the fallback path.
    pub fn peak_lag_se(&self) -> f64 {
        match self {
            FitOutcome::Fitted { peak_lag_se, .. } => *peak_lag_se,
            FitOutcome::RawMaximum { .. } => f64::NAN,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, FitOutcome::RawMaximum { .. })
    }
}

/// Fit output for a single peak model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeakFit {
    pub model: FitModelKind,
    pub outcome: FitOutcome,
    /// RMS residual of the fitted curve over the records it was fit to
    /// (NaN on fallback).
    #[serde(with = "nan_as_null")]
    pub rms: f64,
}

/// A full scan's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults). Lag and grid units are the
/// same as the input timestamps (seconds for datetime-backed series).
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub min_lag: f64,
    pub max_lag: f64,
    pub lag_step: f64,

    /// Resampling grid step; `None` infers the median spacing of series A.
    pub grid_step: Option<f64>,
    /// Minimum aligned points required to evaluate a lag (else NaN record).
    pub min_overlap: usize,

    /// Histogram binning for the MI estimator.
    pub bins: BinStrategy,

    /// Number of AAFT surrogates for significance testing (0 disables).
    pub surrogates: usize,
    /// Percentile of the surrogate MI distribution used as the threshold.
    pub surrogate_percentile: f64,
    /// Also evaluate one surrogate's full MI-vs-lag curve for diagnostics.
    pub surrogate_curve: bool,

    /// Seed for surrogate generation (scans are deterministic given this).
    pub seed: u64,

    /// Peak model(s) to fit.
    pub models: FitModelSpec,
    /// Records on each side of the raw peak used for the quadratic fit window.
    pub peak_window: usize,

    /// Report the minimum marginal entropy (an upper bound on MI).
    pub check_entropy: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            min_lag: -60.0,
            max_lag: 60.0,
            lag_step: 1.0,
            grid_step: None,
            min_overlap: 10,
            bins: BinStrategy::FreedmanDiaconis,
            surrogates: 100,
            surrogate_percentile: 95.0,
            surrogate_curve: false,
            seed: 42,
            models: FitModelSpec::Auto,
            peak_window: 5,
            check_entropy: false,
        }
    }
}

impl ScanConfig {
    /// Validate configuration up front; all violations are fatal (exit code 2).
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.min_lag.is_finite() && self.max_lag.is_finite()) {
            return Err(AppError::config("Lag bounds must be finite."));
        }
        if self.min_lag > self.max_lag {
            return Err(AppError::config(format!(
                "Invalid lag range: min_lag={} > max_lag={}.",
                self.min_lag, self.max_lag
            )));
        }
        if !(self.lag_step.is_finite() && self.lag_step > 0.0) {
            return Err(AppError::config(format!(
                "Lag step must be finite and > 0 (got {}).",
                self.lag_step
            )));
        }
        if let Some(step) = self.grid_step {
            if !(step.is_finite() && step > 0.0) {
                return Err(AppError::config("Grid step must be finite and > 0."));
            }
        }
        if self.min_overlap < 4 {
            return Err(AppError::config("min_overlap must be >= 4."));
        }
        if let BinStrategy::Fixed(n) = self.bins {
            if n < 2 {
                return Err(AppError::config("Fixed bin count must be >= 2."));
            }
        }
        if !(self.surrogate_percentile.is_finite()
            && self.surrogate_percentile > 0.0
            && self.surrogate_percentile < 100.0)
        {
            return Err(AppError::config("Surrogate percentile must lie in (0, 100)."));
        }
        if self.peak_window < 1 {
            return Err(AppError::config("peak_window must be >= 1."));
        }
        Ok(())
    }

    /// Model kinds to attempt for this configuration.
    pub fn model_kinds(&self) -> Vec<FitModelKind> {
        match self.models {
            FitModelSpec::Quadratic => vec![FitModelKind::Quadratic],
            FitModelSpec::Piecewise => vec![FitModelKind::PiecewiseLinear],
            FitModelSpec::Auto | FitModelSpec::Both => {
                vec![FitModelKind::Quadratic, FitModelKind::PiecewiseLinear]
            }
        }
    }
}
