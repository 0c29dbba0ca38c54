//! Histogram-based MI and entropy estimation.
//!
//! Estimator contract (all enforced here):
//!
//! - non-negative: tiny negative values from float error are clamped to 0
//! - symmetric: `mi(x, y) == mi(y, x)` up to float tolerance
//! - degenerate inputs (constant series, too few samples) return 0 rather
//!   than dividing by zero or producing NaN

use crate::domain::BinStrategy;

/// Bin counts are clamped to this range regardless of strategy.
///
/// Fewer than 2 bins makes every estimate zero; very large counts leave most
/// bins empty and inflate the MI bias for the sample sizes this tool sees.
const MIN_BINS: usize = 2;
const MAX_BINS: usize = 64;

/// Resolve the per-axis bin count for a sample.
pub fn bin_count(values: &[f64], strategy: BinStrategy) -> usize {
    match strategy {
        BinStrategy::Fixed(n) => n.clamp(MIN_BINS, MAX_BINS),
        BinStrategy::FreedmanDiaconis => freedman_diaconis(values),
    }
}

/// Freedman–Diaconis rule: width `h = 2·IQR·n^(-1/3)`.
///
/// Falls back to Sturges when the IQR degenerates (heavily tied data).
fn freedman_diaconis(values: &[f64]) -> usize {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let n = finite.len();
    if n < 2 {
        return MIN_BINS;
    }

    let mut sorted = finite;
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let range = sorted[n - 1] - sorted[0];
    if !(range.is_finite() && range > 0.0) {
        return MIN_BINS;
    }

    let iqr = quantile_sorted(&sorted, 0.75) - quantile_sorted(&sorted, 0.25);
    let h = 2.0 * iqr * (n as f64).powf(-1.0 / 3.0);

    let bins = if h.is_finite() && h > 0.0 {
        (range / h).ceil() as usize
    } else {
        // Sturges: 1 + log2(n)
        1 + (n as f64).log2().ceil() as usize
    };

    bins.clamp(MIN_BINS, MAX_BINS)
}

/// Linear-interpolated quantile of a sorted slice.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = q * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

/// Assign each value to an equal-width bin index in `[0, bins)`.
///
/// Returns `None` when the sample has no spread (constant input).
fn digitize(values: &[f64], bins: usize) -> Option<Vec<usize>> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &v in values {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !(lo.is_finite() && hi.is_finite() && hi > lo) {
        return None;
    }

    let width = (hi - lo) / bins as f64;
    Some(
        values
            .iter()
            .map(|&v| (((v - lo) / width) as usize).min(bins - 1))
            .collect(),
    )
}

/// Plug-in Shannon entropy (nats) from a count table.
fn entropy_from_counts(counts: &[usize], n: usize) -> f64 {
    let n_f = n as f64;
    let mut h = 0.0_f64;
    for &cnt in counts {
        if cnt > 0 {
            let p = cnt as f64 / n_f;
            h -= p * p.ln();
        }
    }
    h
}

/// Marginal histogram entropy of a sample, in bits.
///
/// Constant or near-empty samples have zero entropy.
pub fn entropy_bits(values: &[f64], strategy: BinStrategy) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let bins = bin_count(values, strategy);
    let Some(codes) = digitize(values, bins) else {
        return 0.0;
    };
    let mut counts = vec![0usize; bins];
    for c in codes {
        counts[c] += 1;
    }
    entropy_from_counts(&counts, n) / std::f64::consts::LN_2
}

/// Mutual information between two equal-length sequences, in bits.
///
/// Uses `I = H(X) + H(Y) - H(X,Y)` over a shared 2-D histogram. Either input
/// being constant yields 0.
pub fn histogram_mi(x: &[f64], y: &[f64], strategy: BinStrategy) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    let n = x.len();
    if n < 2 {
        return 0.0;
    }

    let bins_x = bin_count(x, strategy);
    let bins_y = bin_count(y, strategy);
    let (Some(cx), Some(cy)) = (digitize(x, bins_x), digitize(y, bins_y)) else {
        // Constant input carries no information.
        return 0.0;
    };

    let mut counts_x = vec![0usize; bins_x];
    let mut counts_y = vec![0usize; bins_y];
    let mut counts_xy = vec![0usize; bins_x * bins_y];
    for (&ix, &iy) in cx.iter().zip(cy.iter()) {
        counts_x[ix] += 1;
        counts_y[iy] += 1;
        counts_xy[ix * bins_y + iy] += 1;
    }

    let h_x = entropy_from_counts(&counts_x, n);
    let h_y = entropy_from_counts(&counts_y, n);
    let h_xy = entropy_from_counts(&counts_xy, n);

    let mi_nats = h_x + h_y - h_xy;
    (mi_nats / std::f64::consts::LN_2).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand::rngs::StdRng;
    use rand_distr::Normal;

    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0, 1.0).unwrap();
        (0..n).map(|_| normal.sample(&mut rng)).collect()
    }

    #[test]
    fn mi_is_symmetric() {
        let x = noise(500, 1);
        let y: Vec<f64> = x.iter().zip(noise(500, 2)).map(|(a, e)| a + 0.5 * e).collect();

        let ab = histogram_mi(&x, &y, BinStrategy::Fixed(16));
        let ba = histogram_mi(&y, &x, BinStrategy::Fixed(16));
        assert!((ab - ba).abs() < 1e-12, "MI(A,B)={ab} != MI(B,A)={ba}");
    }

    #[test]
    fn mi_is_non_negative_for_independent_noise() {
        let x = noise(400, 3);
        let y = noise(400, 4);
        let mi = histogram_mi(&x, &y, BinStrategy::FreedmanDiaconis);
        assert!(mi >= 0.0);
        // Independent noise should carry little information.
        assert!(mi < 0.5, "independent-noise MI unexpectedly large: {mi}");
    }

    #[test]
    fn identical_series_reach_marginal_entropy() {
        let x = noise(1000, 5);
        let mi = histogram_mi(&x, &x, BinStrategy::Fixed(8));
        let h = entropy_bits(&x, BinStrategy::Fixed(8));
        assert!((mi - h).abs() < 1e-9, "MI(X,X)={mi} should equal H(X)={h}");
    }

    #[test]
    fn constant_input_yields_zero() {
        let x = vec![3.0; 100];
        let y = noise(100, 6);
        assert_eq!(histogram_mi(&x, &y, BinStrategy::FreedmanDiaconis), 0.0);
        assert_eq!(histogram_mi(&y, &x, BinStrategy::FreedmanDiaconis), 0.0);
        assert_eq!(entropy_bits(&x, BinStrategy::FreedmanDiaconis), 0.0);
    }

    #[test]
    fn dependent_signal_beats_independent_noise() {
        let x = noise(800, 7);
        let dependent: Vec<f64> = x.iter().map(|v| v * v).collect();
        let independent = noise(800, 8);

        let mi_dep = histogram_mi(&x, &dependent, BinStrategy::FreedmanDiaconis);
        let mi_ind = histogram_mi(&x, &independent, BinStrategy::FreedmanDiaconis);
        assert!(
            mi_dep > mi_ind,
            "nonlinear dependence ({mi_dep}) should exceed noise ({mi_ind})"
        );
    }

    #[test]
    fn bin_count_clamps_fixed_strategy() {
        let x = noise(100, 9);
        assert_eq!(bin_count(&x, BinStrategy::Fixed(1)), 2);
        assert_eq!(bin_count(&x, BinStrategy::Fixed(1000)), 64);
    }

    #[test]
    fn freedman_diaconis_scales_with_sample_size() {
        let small = noise(50, 10);
        let large = noise(5000, 10);
        let b_small = bin_count(&small, BinStrategy::FreedmanDiaconis);
        let b_large = bin_count(&large, BinStrategy::FreedmanDiaconis);
        assert!(b_small >= 2);
        assert!(b_large >= b_small);
    }
}
