//! Built-in synthetic signal pairs.
//!
//! Two generators cover the interesting regimes:
//!
//! - `pulse_pair`: flat plateaus with an inverted cosine pulse in the middle
//!   of each series — a strongly anti-correlated, non-linear coupling at lag
//!   zero that linear correlation underestimates.
//! - `sine_pair`: a sine carrier where series B is a delayed copy of A with
//!   independent noise — the scan should recover the known delay.
//!
//! Both are deterministic given a seed, so the demo doubles as an end-to-end
//! self-test harness.

use clap::ValueEnum;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use crate::domain::Timeseries;
use crate::error::AppError;

/// Which synthetic pair to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DemoKind {
    Pulse,
    Sine,
}

/// A generated pair plus the ground-truth coupling lag, when one exists.
#[derive(Debug, Clone)]
pub struct DemoPair {
    pub a: Timeseries,
    pub b: Timeseries,
    /// The lag (samples) at which the scan should peak, if known.
    pub true_lag: Option<f64>,
}

fn validate(samples: usize, noise_sigma: f64) -> Result<(), AppError> {
    if samples < 20 {
        return Err(AppError::config("Demo needs at least 20 samples."));
    }
    if !(noise_sigma.is_finite() && noise_sigma >= 0.0) {
        return Err(AppError::config("Noise sigma must be finite and >= 0."));
    }
    Ok(())
}

/// Flat plateaus around an inverted cosine pulse, B the negated mirror of A.
///
/// The pulse occupies the middle fifth of the series; both series get
/// independent Gaussian noise. The coupling peaks at lag zero.
pub fn pulse_pair(samples: usize, noise_sigma: f64, seed: u64) -> Result<DemoPair, AppError> {
    validate(samples, noise_sigma)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, noise_sigma.max(1e-12))
        .map_err(|e| AppError::internal(format!("Noise distribution error: {e}")))?;

    let pulse_len = samples / 5;
    let flat_len = (samples - pulse_len) / 2;

    let mut base = Vec::with_capacity(samples);
    base.extend(std::iter::repeat(10.0).take(flat_len));
    for i in 0..pulse_len {
        let phase = i as f64 / (pulse_len.max(2) - 1) as f64 * std::f64::consts::TAU;
        base.push(10.0 * phase.cos());
    }
    base.extend(std::iter::repeat(10.0).take(samples - flat_len - pulse_len));

    let a: Vec<f64> = base.iter().map(|v| v + normal.sample(&mut rng)).collect();
    let b: Vec<f64> = base.iter().map(|v| -v + normal.sample(&mut rng)).collect();

    Ok(DemoPair {
        a: Timeseries::from_samples(1.0, a)?,
        b: Timeseries::from_samples(1.0, b)?,
        true_lag: Some(0.0),
    })
}

/// A sine carrier with B delayed by `offset` samples relative to A.
///
/// With the scanner's convention (a record at lag ℓ pairs `a(t)` with
/// `b(t + ℓ)`), the MI curve peaks at `+offset`.
pub fn sine_pair(
    samples: usize,
    offset: f64,
    noise_sigma: f64,
    seed: u64,
) -> Result<DemoPair, AppError> {
    validate(samples, noise_sigma)?;
    if !offset.is_finite() {
        return Err(AppError::config("Demo offset must be finite."));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, noise_sigma.max(1e-12))
        .map_err(|e| AppError::internal(format!("Noise distribution error: {e}")))?;

    let carrier = |t: f64| (t * 0.35).sin() + 0.4 * (t * 0.11).sin();

    let a: Vec<f64> = (0..samples)
        .map(|i| carrier(i as f64) + normal.sample(&mut rng))
        .collect();
    // b(t) = a(t - offset): B lags A by `offset` samples.
    let b: Vec<f64> = (0..samples)
        .map(|i| carrier(i as f64 - offset) + normal.sample(&mut rng))
        .collect();

    Ok(DemoPair {
        a: Timeseries::from_samples(1.0, a)?,
        b: Timeseries::from_samples(1.0, b)?,
        true_lag: Some(offset),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulse_pair_has_requested_length() {
        let pair = pulse_pair(500, 0.5, 1).unwrap();
        assert_eq!(pair.a.len(), 500);
        assert_eq!(pair.b.len(), 500);
        assert_eq!(pair.true_lag, Some(0.0));
    }

    #[test]
    fn pulse_pair_is_seed_deterministic() {
        let p1 = pulse_pair(200, 0.5, 9).unwrap();
        let p2 = pulse_pair(200, 0.5, 9).unwrap();
        assert_eq!(p1.a.values(), p2.a.values());
        assert_eq!(p1.b.values(), p2.b.values());
    }

    #[test]
    fn sine_pair_delay_shows_in_the_signal() {
        // Noise-free pair: b(t) must equal a(t - offset) exactly.
        let pair = sine_pair(100, 5.0, 0.0, 2).unwrap();
        let a = pair.a.values();
        let b = pair.b.values();
        for i in 5..100 {
            assert!((b[i] - a[i - 5]).abs() < 1e-6, "delay broken at sample {i}");
        }
    }

    #[test]
    fn tiny_sample_counts_are_rejected() {
        assert_eq!(pulse_pair(5, 0.5, 0).unwrap_err().exit_code(), 2);
        assert_eq!(sine_pair(5, 1.0, 0.5, 0).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn negative_noise_is_rejected() {
        assert_eq!(pulse_pair(100, -1.0, 0).unwrap_err().exit_code(), 2);
    }
}
