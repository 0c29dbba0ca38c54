//! Piecewise-linear peak model.
//!
//! Two linear segments meeting at one breakpoint:
//!
//! ```text
//! y(x) = y0 + k1·(x - x0)   for x <  x0
//! y(x) = y0 + k2·(x - x0)   for x >= x0
//! ```
//!
//! The model is linear in `(y0, k1, k2)` given a fixed breakpoint, so we run
//! a deterministic grid search over interior lags as breakpoint candidates
//! and solve a small OLS problem for each (parallel). The minimum-SSE
//! candidate wins, with the original grid index as tie-break. A rising-then-
//! falling slope pair is required for the breakpoint to be a peak; anything
//! else falls back to the raw maximum.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::domain::{FitModelKind, FitOutcome, LagRecord, PeakFit};
use crate::fit::peak::raw_peak;
use crate::math::ols_fit;

/// Minimum finite points: 4 parameters (x0, y0, k1, k2) plus a residual dof.
const MIN_POINTS: usize = 5;

/// Points required strictly on each side of a breakpoint candidate.
const MIN_SIDE_POINTS: usize = 2;

#[derive(Debug, Clone)]
struct Candidate {
    idx: usize,
    x0: f64,
    beta: [f64; 3],
    sse: f64,
    dof: usize,
}

/// Fit the piecewise-linear peak model over the finite records.
pub fn fit_piecewise(records: &[LagRecord]) -> PeakFit {
    let Some(peak) = raw_peak(records) else {
        return fallback(f64::NAN, "no finite MI records to fit");
    };

    let points: Vec<(f64, f64)> = records
        .iter()
        .filter(|r| r.mi.is_finite())
        .map(|r| (r.lag, r.mi))
        .collect();
    if points.len() < MIN_POINTS {
        return fallback(
            peak.lag,
            format!("{} finite points, need {MIN_POINTS}", points.len()),
        );
    }

    // Interior lags are the breakpoint candidates; each needs enough points
    // on both sides to pin down its segment slopes.
    let lo = MIN_SIDE_POINTS;
    let hi = points.len() - MIN_SIDE_POINTS;
    let candidates: Vec<Candidate> = (lo..hi)
        .into_par_iter()
        .filter_map(|idx| evaluate_candidate(&points, idx))
        .collect();

    if candidates.is_empty() {
        return fallback(peak.lag, "no solvable breakpoint candidates");
    }

    // Deterministic selection: minimum SSE, ties by original grid index.
    let mut best = &candidates[0];
    for c in &candidates[1..] {
        if c.sse < best.sse || (c.sse == best.sse && c.idx < best.idx) {
            best = c;
        }
    }

    let [y0, k1, k2] = best.beta;
    if !(k1 > 0.0 && k2 < 0.0) {
        return fallback(
            peak.lag,
            format!("breakpoint slopes (k1={k1:.4}, k2={k2:.4}) do not form a peak"),
        );
    }

    let se = breakpoint_se(&candidates, best);
    let rms = (best.sse / points.len() as f64).sqrt();

    PeakFit {
        model: FitModelKind::PiecewiseLinear,
        outcome: FitOutcome::Fitted {
            peak_lag: best.x0,
            peak_lag_se: se,
            params: vec![best.x0, y0, k1, k2],
        },
        rms,
    }
}

/// Solve `(y0, k1, k2)` for the breakpoint at `points[idx]`.
fn evaluate_candidate(points: &[(f64, f64)], idx: usize) -> Option<Candidate> {
    let x0 = points[idx].0;
    let n = points.len();

    let mut x = DMatrix::<f64>::zeros(n, 3);
    let mut y = DVector::<f64>::zeros(n);
    for (i, &(lag, mi)) in points.iter().enumerate() {
        let d = lag - x0;
        x[(i, 0)] = 1.0;
        x[(i, 1)] = d.min(0.0);
        x[(i, 2)] = d.max(0.0);
        y[i] = mi;
    }

    let fit = ols_fit(&x, &y)?;
    if !fit.sse.is_finite() {
        return None;
    }
    Some(Candidate {
        idx,
        x0,
        beta: [fit.beta[0], fit.beta[1], fit.beta[2]],
        sse: fit.sse,
        dof: fit.dof,
    })
}

/// Standard error on the breakpoint from the curvature of the SSE profile.
///
/// Near the minimum, `SSE(x0) ≈ SSE_min + ½·S''·(x0 - x̂0)²`, and the usual
/// least-squares linearization gives `var(x̂0) ≈ 2σ²/S''` with
/// `σ² = SSE_min / dof`. Insufficient neighbours or non-positive curvature
/// yield NaN rather than a fabricated number.
fn breakpoint_se(candidates: &[Candidate], best: &Candidate) -> f64 {
    let pos = candidates.iter().position(|c| c.idx == best.idx);
    let Some(pos) = pos else {
        return f64::NAN;
    };
    if pos == 0 || pos + 1 >= candidates.len() {
        return f64::NAN;
    }

    let (xm, sm) = (candidates[pos - 1].x0, candidates[pos - 1].sse);
    let (x0, s0) = (best.x0, best.sse);
    let (xp, sp) = (candidates[pos + 1].x0, candidates[pos + 1].sse);

    // Second derivative of the Lagrange parabola through the three profile
    // points (handles uneven breakpoint spacing).
    let curvature = 2.0
        * (sm / ((xm - x0) * (xm - xp))
            + s0 / ((x0 - xm) * (x0 - xp))
            + sp / ((xp - xm) * (xp - x0)));
    if !(curvature.is_finite() && curvature > 0.0) || best.dof == 0 {
        return f64::NAN;
    }

    let sigma2 = (s0 / best.dof as f64).max(0.0);
    (2.0 * sigma2 / curvature).sqrt()
}

fn fallback(peak_lag: f64, reason: impl Into<String>) -> PeakFit {
    PeakFit {
        model: FitModelKind::PiecewiseLinear,
        outcome: FitOutcome::RawMaximum {
            peak_lag,
            reason: reason.into(),
        },
        rms: f64::NAN,
    }
}
