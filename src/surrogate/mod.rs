//! Amplitude-adjusted Fourier-transform (AAFT) surrogates.
//!
//! A surrogate preserves the amplitude spectrum and the marginal distribution
//! of the input while randomizing Fourier phases, destroying any lagged
//! dependence on other series. Scanning MI against surrogates therefore
//! yields a null distribution: the noise floor below which an observed MI
//! value is statistically indistinguishable from chance.
//!
//! The generator is a free function with a `(values, seed)` signature so the
//! scanner can treat surrogate generation as a pluggable capability and
//! alternative schemes (e.g., IAAFT) can be substituted.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use rustfft::{FftPlanner, num_complex::Complex};

/// Derive a per-surrogate seed from the user seed and the surrogate index.
///
/// Keeps draws independent of each other and of rayon scheduling order.
pub fn surrogate_seed(seed: u64, index: usize) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    index.hash(&mut hasher);
    hasher.finish()
}

/// Indices that sort `values` ascending (NaN-tolerant, stable).
fn argsort(values: &[f64]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..values.len()).collect();
    idx.sort_by(|&i, &j| {
        values[i]
            .partial_cmp(&values[j])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    idx
}

/// Rank of each element within `values` (0 = smallest).
fn ranks(values: &[f64]) -> Vec<usize> {
    let order = argsort(values);
    let mut r = vec![0usize; values.len()];
    for (rank, &i) in order.iter().enumerate() {
        r[i] = rank;
    }
    r
}

/// Randomize the Fourier phases of `data` in place, preserving magnitudes.
///
/// DC and (for even lengths) the Nyquist bin are left untouched so the
/// inverse transform stays real-valued.
fn randomize_phases(data: &mut [Complex<f64>], rng: &mut StdRng) {
    let n = data.len();
    let half = n / 2;
    for k in 1..half {
        let phi = rng.r#gen::<f64>() * std::f64::consts::TAU;
        let mag = data[k].norm();
        data[k] = Complex::from_polar(mag, phi);
        data[n - k] = data[k].conj();
    }
}

/// Generate one AAFT surrogate of `values`.
///
/// Deterministic given `(values, seed)`. Inputs shorter than 4 samples are
/// returned unchanged (no meaningful spectrum to randomize).
pub fn aaft_surrogate(values: &[f64], seed: u64) -> Vec<f64> {
    let n = values.len();
    if n < 4 {
        return values.to_vec();
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).expect("unit normal is well-formed");

    // 1) Rank-remap the input onto a Gaussian sample: the i-th smallest input
    //    value takes the i-th smallest Gaussian draw.
    let input_ranks = ranks(values);
    let mut gauss: Vec<f64> = (0..n).map(|_| normal.sample(&mut rng)).collect();
    gauss.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let gaussianized: Vec<f64> = input_ranks.iter().map(|&r| gauss[r]).collect();

    // 2) Phase-randomize the Gaussianized series, preserving the amplitude
    //    spectrum and Hermitian symmetry.
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    let ifft = planner.plan_fft_inverse(n);

    let mut spectrum: Vec<Complex<f64>> =
        gaussianized.iter().map(|&v| Complex::new(v, 0.0)).collect();
    fft.process(&mut spectrum);
    randomize_phases(&mut spectrum, &mut rng);
    ifft.process(&mut spectrum);

    let norm = 1.0 / n as f64;
    let shuffled: Vec<f64> = spectrum.iter().map(|c| c.re * norm).collect();

    // 3) Amplitude adjustment: impose the original marginal distribution by
    //    rank-remapping the sorted input values onto the randomized ordering.
    let sorted_input: Vec<f64> = {
        let order = argsort(values);
        order.iter().map(|&i| values[i]).collect()
    };
    let shuffled_ranks = ranks(&shuffled);
    shuffled_ranks.iter().map(|&r| sorted_input[r]).collect()
}

/// Linear-interpolated percentile of a sample (p in [0, 100]).
pub fn percentile(values: &[f64], p: f64) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return f64::NAN;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = (p / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}
