//! Per-lag resampling and alignment.
//!
//! For a lag ℓ the scanner pairs `a(t)` with `b(t + ℓ)`: positive lags test
//! whether later values of B match current values of A. Both series are
//! sampled by linear interpolation onto a shared regular grid spanning the
//! interval where the (shifted) series overlap. Lags whose overlap is too
//! short are skipped — one bad lag must not abort the scan.

use crate::math::LinearInterp;

/// Two series aligned on a common regular grid for one lag.
#[derive(Debug, Clone)]
pub struct AlignedPair {
    pub a: Vec<f64>,
    pub b: Vec<f64>,
}

impl AlignedPair {
    pub fn len(&self) -> usize {
        self.a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }
}

/// Align two interpolants at the given lag.
///
/// Returns `None` when the shifted overlap holds fewer than `min_overlap`
/// grid points (including the zero-overlap case at extreme lags).
pub fn align_at_lag(
    a: &LinearInterp,
    b: &LinearInterp,
    lag: f64,
    grid_step: f64,
    min_overlap: usize,
) -> Option<AlignedPair> {
    let (a_lo, a_hi) = a.domain();
    let (b_lo, b_hi) = b.domain();

    // t must be inside A's support and t + lag inside B's.
    let lo = a_lo.max(b_lo - lag);
    let hi = a_hi.min(b_hi - lag);
    if hi <= lo {
        return None;
    }

    let eps = grid_step * 1e-9;
    let count = ((hi - lo) / grid_step + eps).floor() as usize + 1;
    if count < min_overlap {
        return None;
    }

    let mut va = Vec::with_capacity(count);
    let mut vb = Vec::with_capacity(count);
    for i in 0..count {
        let t = lo + grid_step * i as f64;
        if t > hi + eps {
            break;
        }
        // Both lookups are inside the computed overlap; treat float-edge
        // misses as skipped grid points.
        let (Some(ya), Some(yb)) = (a.eval(t.min(hi)), b.eval((t + lag).min(b_hi))) else {
            continue;
        };
        va.push(ya);
        vb.push(yb);
    }

    if va.len() < min_overlap {
        return None;
    }
    Some(AlignedPair { a: va, b: vb })
}
