//! The core scan pipeline.
//!
//! `mi_lag_finder` is the one externally callable operation: it wires the
//! lag scanner, the surrogate significance tester, and the peak fitters into
//! a single stateless call. Given identical inputs, configuration, and seed
//! the output is bit-for-bit reproducible.

use crate::domain::{LagRecord, LagScanResult, ScanConfig, Timeseries};
use crate::error::AppError;
use crate::fit::selection::{FitSelection, fit_peak};
use crate::math::LinearInterp;
use crate::scan::scanner::scan_lags;
use crate::surrogate::{aaft_surrogate, surrogate_seed};

/// All computed outputs of a single scan.
#[derive(Debug, Clone)]
pub struct MiLagOutput {
    pub scan: LagScanResult,
    pub selection: FitSelection,
    /// MI-vs-lag curve of one surrogate of A against B (diagnostic).
    pub surrogate_curve: Option<Vec<LagRecord>>,
}

impl MiLagOutput {
    /// Best-estimate coupling lag.
    pub fn peak_lag(&self) -> f64 {
        self.selection.best.outcome.peak_lag()
    }

    /// Minimum marginal entropy diagnostic, when requested.
    pub fn min_entropy(&self) -> Option<f64> {
        self.scan.stats.min_entropy
    }
}

/// Scan MI between `a` and `b` across the configured lag grid and fit the
/// peak models to the resulting curve.
///
/// Only configuration errors and empty scans are fatal; per-lag alignment
/// failures become NaN records and degenerate fits become raw-maximum
/// fallbacks inside the returned structure.
pub fn mi_lag_finder(
    a: &Timeseries,
    b: &Timeseries,
    config: &ScanConfig,
) -> Result<MiLagOutput, AppError> {
    config.validate()?;

    let scan = scan_lags(a, b, config)?;
    let selection = fit_peak(&scan, config)?;

    let surrogate_curve = if config.surrogate_curve && config.surrogates > 0 {
        Some(surrogate_scan(a, b, config)?)
    } else {
        None
    };

    Ok(MiLagOutput {
        scan,
        selection,
        surrogate_curve,
    })
}

/// Scan one AAFT surrogate of A against B across the full lag grid.
///
/// Mirrors the main scan with the surrogate substituted for A; the surrogate
/// draw uses a seed index past the threshold draws so the two paths never
/// share a draw.
fn surrogate_scan(
    a: &Timeseries,
    b: &Timeseries,
    config: &ScanConfig,
) -> Result<Vec<LagRecord>, AppError> {
    let interp = LinearInterp::new(a.times(), a.values())
        .ok_or_else(|| AppError::insufficient("Series A has fewer than 2 finite samples."))?;
    let step = match config.grid_step {
        Some(step) => step,
        None => a
            .median_spacing()
            .ok_or_else(|| AppError::insufficient("Cannot infer a resampling step from series A."))?,
    };

    // Regularize A over its own support so the surrogate spectrum is defined.
    let (lo, hi) = interp.domain();
    let count = ((hi - lo) / step).floor() as usize + 1;
    let mut times = Vec::with_capacity(count);
    let mut values = Vec::with_capacity(count);
    for i in 0..count {
        let t = lo + step * i as f64;
        if t > hi {
            break;
        }
        if let Some(v) = interp.eval(t) {
            times.push(t);
            values.push(v);
        }
    }
    if times.len() < 2 {
        return Err(AppError::insufficient("Series A too short to build a surrogate."));
    }

    let surrogate = aaft_surrogate(&values, surrogate_seed(config.seed, config.surrogates));
    let surrogate_a = Timeseries::new(times, surrogate)?;

    let surrogate_config = ScanConfig {
        surrogates: 0,
        surrogate_curve: false,
        check_entropy: false,
        ..config.clone()
    };
    let scan = scan_lags(&surrogate_a, b, &surrogate_config)?;
    Ok(scan.records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{pulse_pair, sine_pair};
    use crate::domain::{BinStrategy, FitModelKind, FitModelSpec, FitOutcome};

    fn demo_config() -> ScanConfig {
        ScanConfig {
            min_lag: -10.0,
            max_lag: 10.0,
            lag_step: 1.0,
            bins: BinStrategy::Fixed(14),
            surrogates: 0,
            ..ScanConfig::default()
        }
    }

    #[test]
    fn sine_offset_is_recovered_by_quadratic_fit() {
        // End-to-end: B delayed by 5 samples, scan [-10, 10] step 1; the
        // quadratic fit must land within ±1 sample of the true lag.
        let pair = sine_pair(600, 5.0, 0.2, 11).unwrap();
        let config = ScanConfig {
            models: FitModelSpec::Quadratic,
            ..demo_config()
        };
        let output = mi_lag_finder(&pair.a, &pair.b, &config).unwrap();

        assert_eq!(output.scan.records.len(), 21);
        let peak = output.peak_lag();
        assert!(
            (peak - 5.0).abs() <= 1.0,
            "recovered peak {peak}, expected 5 +/- 1"
        );
    }

    #[test]
    fn pulse_pair_peaks_near_zero_lag() {
        let pair = pulse_pair(500, 0.5, 3).unwrap();
        let output = mi_lag_finder(&pair.a, &pair.b, &demo_config()).unwrap();
        let peak = output.peak_lag();
        assert!(peak.abs() <= 2.0, "pulse coupling should peak near 0, got {peak}");
    }

    #[test]
    fn identical_runs_are_bit_for_bit_identical() {
        let pair = sine_pair(300, 3.0, 0.3, 17).unwrap();
        let config = ScanConfig {
            surrogates: 30,
            surrogate_curve: true,
            check_entropy: true,
            ..demo_config()
        };

        let o1 = mi_lag_finder(&pair.a, &pair.b, &config).unwrap();
        let o2 = mi_lag_finder(&pair.a, &pair.b, &config).unwrap();

        for (r1, r2) in o1.scan.records.iter().zip(o2.scan.records.iter()) {
            assert_eq!(r1.lag.to_bits(), r2.lag.to_bits());
            assert_eq!(r1.mi.to_bits(), r2.mi.to_bits());
            assert_eq!(r1.threshold.map(f64::to_bits), r2.threshold.map(f64::to_bits));
        }
        assert_eq!(
            o1.peak_lag().to_bits(),
            o2.peak_lag().to_bits()
        );
        let (s1, s2) = (o1.surrogate_curve.unwrap(), o2.surrogate_curve.unwrap());
        for (r1, r2) in s1.iter().zip(s2.iter()) {
            assert_eq!(r1.mi.to_bits(), r2.mi.to_bits());
        }
    }

    #[test]
    fn single_lag_scan_reports_trivial_peak() {
        let pair = sine_pair(200, 0.0, 0.2, 23).unwrap();
        let config = ScanConfig {
            min_lag: 4.0,
            max_lag: 4.0,
            ..demo_config()
        };
        let output = mi_lag_finder(&pair.a, &pair.b, &config).unwrap();
        assert_eq!(output.scan.records.len(), 1);
        assert_eq!(output.peak_lag(), 4.0);
        assert!(output.selection.best.outcome.is_fallback());
        assert!(output.selection.best.outcome.peak_lag_se().is_nan());
    }

    #[test]
    fn constant_series_degrades_to_raw_maximum() {
        let a = Timeseries::from_samples(1.0, vec![7.5; 300]).unwrap();
        let pair = sine_pair(300, 0.0, 0.2, 29).unwrap();
        // Scan from lag 0 so the tie-break answer is the first lag either way.
        let config = ScanConfig {
            min_lag: 0.0,
            max_lag: 10.0,
            ..demo_config()
        };
        let output = mi_lag_finder(&a, &pair.b, &config).unwrap();

        for r in &output.scan.records {
            if !r.is_skipped() {
                assert_eq!(r.mi, 0.0);
            }
        }
        assert!(output.selection.best.outcome.is_fallback());
        assert_eq!(output.peak_lag(), 0.0);
    }

    #[test]
    fn white_noise_stays_below_surrogate_threshold() {
        // Independent noise should stay under the surrogate threshold in the
        // vast majority of trials. The scan maximizes over 11 lags, so the
        // per-lag percentile is raised accordingly (0.995^11 ≈ 0.95).
        let mut below = 0;
        let trials = 10;
        for seed in 0..trials {
            let a = noise_series(512, 1000 + seed);
            let b = noise_series(512, 2000 + seed);
            let config = ScanConfig {
                min_lag: -5.0,
                max_lag: 5.0,
                bins: BinStrategy::Fixed(8),
                surrogates: 300,
                surrogate_percentile: 99.5,
                seed,
                ..demo_config()
            };
            let output = mi_lag_finder(&a, &b, &config).unwrap();
            let threshold = output.scan.threshold().unwrap();
            if output.scan.stats.mi_max <= threshold {
                below += 1;
            }
        }
        assert!(
            below >= trials - 1,
            "noise cleared the surrogate threshold in {}/{trials} trials",
            trials - below
        );
    }

    #[test]
    fn quadratic_and_piecewise_are_both_reported_in_auto() {
        let pair = sine_pair(400, 4.0, 0.2, 31).unwrap();
        let output = mi_lag_finder(&pair.a, &pair.b, &demo_config()).unwrap();
        let kinds: Vec<FitModelKind> =
            output.selection.fits.iter().map(|f| f.model).collect();
        assert_eq!(
            kinds,
            vec![FitModelKind::Quadratic, FitModelKind::PiecewiseLinear]
        );
        for fit in &output.selection.fits {
            if let FitOutcome::Fitted { peak_lag, .. } = fit.outcome {
                assert!(peak_lag >= -10.0 && peak_lag <= 10.0);
            }
        }
    }

    fn noise_series(n: usize, seed: u64) -> Timeseries {
        use rand::prelude::*;
        use rand::rngs::StdRng;
        use rand_distr::Normal;
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0, 1.0).unwrap();
        Timeseries::from_samples(1.0, (0..n).map(|_| normal.sample(&mut rng)).collect()).unwrap()
    }
}
