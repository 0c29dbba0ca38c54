//! The lag scanner: ALIGN → ESTIMATE → RECORD per lag.
//!
//! Each lag is evaluated independently (parallel, no shared mutable state)
//! and reassembled in grid order, so results are deterministic regardless of
//! scheduling. Alignment failures record NaN and never abort the scan; only
//! configuration and empty-input errors are fatal.

use rayon::prelude::*;

use crate::domain::{LagRecord, LagScanResult, ScanConfig, ScanStats, Timeseries};
use crate::error::AppError;
use crate::math::LinearInterp;
use crate::mi::{entropy_bits, histogram_mi};
use crate::scan::align::align_at_lag;
use crate::scan::lags::lag_grid;
use crate::surrogate::{aaft_surrogate, percentile, surrogate_seed};

/// Scan MI over the configured lag grid using AAFT surrogates for the
/// significance threshold.
pub fn scan_lags(
    a: &Timeseries,
    b: &Timeseries,
    config: &ScanConfig,
) -> Result<LagScanResult, AppError> {
    scan_lags_with_surrogate(a, b, config, aaft_surrogate)
}

/// Scan MI over the configured lag grid with a caller-supplied surrogate
/// generator (`(values, seed) -> values`).
pub fn scan_lags_with_surrogate<F>(
    a: &Timeseries,
    b: &Timeseries,
    config: &ScanConfig,
    generate: F,
) -> Result<LagScanResult, AppError>
where
    F: Fn(&[f64], u64) -> Vec<f64> + Sync,
{
    config.validate()?;
    let lags = lag_grid(config.min_lag, config.max_lag, config.lag_step)?;

    let interp_a = LinearInterp::new(a.times(), a.values())
        .ok_or_else(|| AppError::insufficient("Series A has fewer than 2 finite samples."))?;
    let interp_b = LinearInterp::new(b.times(), b.values())
        .ok_or_else(|| AppError::insufficient("Series B has fewer than 2 finite samples."))?;

    let grid_step = match config.grid_step {
        Some(step) => step,
        None => a
            .median_spacing()
            .ok_or_else(|| AppError::insufficient("Cannot infer a resampling step from series A."))?,
    };

    // Evaluate each lag independently (parallel); collect preserves grid order.
    let evaluated: Vec<(f64, Option<f64>)> = lags
        .par_iter()
        .map(|&lag| {
            match align_at_lag(&interp_a, &interp_b, lag, grid_step, config.min_overlap) {
                Some(pair) => {
                    let mi = histogram_mi(&pair.a, &pair.b, config.bins);
                    let h_b = config
                        .check_entropy
                        .then(|| entropy_bits(&pair.b, config.bins));
                    (mi, h_b)
                }
                None => (f64::NAN, None),
            }
        })
        .collect();

    let threshold = if config.surrogates > 0 {
        surrogate_threshold(&interp_a, &interp_b, grid_step, config, &generate)
    } else {
        None
    };

    let min_entropy = if config.check_entropy {
        min_entropy_diagnostic(&interp_a, &interp_b, grid_step, config, &evaluated)
    } else {
        None
    };

    let n_skipped = evaluated.iter().filter(|(mi, _)| mi.is_nan()).count();
    let mi_max = evaluated
        .iter()
        .map(|(mi, _)| *mi)
        .filter(|mi| mi.is_finite())
        .fold(f64::NAN, f64::max);

    let records: Vec<LagRecord> = lags
        .iter()
        .zip(evaluated.iter())
        .map(|(&lag, &(mi, _))| LagRecord {
            lag,
            mi,
            threshold,
        })
        .collect();

    Ok(LagScanResult {
        stats: ScanStats {
            n_lags: records.len(),
            n_skipped,
            grid_step,
            mi_max,
            min_entropy,
        },
        records,
    })
}

/// Significance threshold: a high percentile of the MI distribution between
/// surrogates of A and the lag-0-aligned B.
///
/// Surrogate draws are independent, so they run in parallel; per-draw seeds
/// keep the result reproducible.
fn surrogate_threshold<F>(
    interp_a: &LinearInterp,
    interp_b: &LinearInterp,
    grid_step: f64,
    config: &ScanConfig,
    generate: &F,
) -> Option<f64>
where
    F: Fn(&[f64], u64) -> Vec<f64> + Sync,
{
    let pair = align_at_lag(interp_a, interp_b, 0.0, grid_step, config.min_overlap)?;

    let surrogate_mi: Vec<f64> = (0..config.surrogates)
        .into_par_iter()
        .map(|i| {
            let s = generate(&pair.a, surrogate_seed(config.seed, i));
            histogram_mi(&s, &pair.b, config.bins)
        })
        .collect();

    let threshold = percentile(&surrogate_mi, config.surrogate_percentile);
    threshold.is_finite().then_some(threshold)
}

/// Minimum marginal entropy across aligned A (lag 0) and every lagged B.
///
/// MI is bounded above by the smaller marginal entropy, so this gives the
/// reader a scale for the scanned values.
fn min_entropy_diagnostic(
    interp_a: &LinearInterp,
    interp_b: &LinearInterp,
    grid_step: f64,
    config: &ScanConfig,
    evaluated: &[(f64, Option<f64>)],
) -> Option<f64> {
    let h_a = align_at_lag(interp_a, interp_b, 0.0, grid_step, config.min_overlap)
        .map(|pair| entropy_bits(&pair.a, config.bins));

    evaluated
        .iter()
        .filter_map(|(_, h_b)| *h_b)
        .chain(h_a)
        .filter(|h| h.is_finite())
        .fold(None, |acc: Option<f64>, h| {
            Some(acc.map_or(h, |m| m.min(h)))
        })
}
