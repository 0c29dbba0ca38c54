//! Gap-aware linear interpolation over an irregularly sampled series.
//!
//! NaN-valued samples are dropped at construction so they behave as gaps:
//! queries falling between two finite neighbours interpolate across the gap,
//! queries outside the finite support return `None`.

/// Interpolate linearly between two knots.
pub fn linear_interp(a: (f64, f64), b: (f64, f64), x: f64) -> f64 {
    let (x0, y0) = a;
    let (x1, y1) = b;
    if (x1 - x0).abs() < 1e-12 {
        return y0;
    }
    let u = (x - x0) / (x1 - x0);
    y0 + u * (y1 - y0)
}

/// A linear interpolant over the finite samples of a series.
#[derive(Debug, Clone)]
pub struct LinearInterp {
    times: Vec<f64>,
    values: Vec<f64>,
}

impl LinearInterp {
    /// Build an interpolant, dropping NaN samples.
    ///
    /// Returns `None` when fewer than two finite samples remain.
    pub fn new(times: &[f64], values: &[f64]) -> Option<Self> {
        let mut t = Vec::with_capacity(times.len());
        let mut v = Vec::with_capacity(values.len());
        for (&ti, &vi) in times.iter().zip(values.iter()) {
            if vi.is_finite() {
                t.push(ti);
                v.push(vi);
            }
        }
        if t.len() < 2 {
            return None;
        }
        Some(Self { times: t, values: v })
    }

    /// Finite support of the interpolant.
    pub fn domain(&self) -> (f64, f64) {
        (self.times[0], self.times[self.times.len() - 1])
    }

    /// Evaluate at `t`; `None` outside the finite support.
    pub fn eval(&self, t: f64) -> Option<f64> {
        let (lo, hi) = self.domain();
        if t < lo || t > hi {
            return None;
        }
        // Index of the first knot strictly after t.
        let idx = self.times.partition_point(|&ti| ti <= t);
        if idx == 0 {
            return Some(self.values[0]);
        }
        if idx == self.times.len() {
            return Some(self.values[self.values.len() - 1]);
        }
        let a = (self.times[idx - 1], self.values[idx - 1]);
        let b = (self.times[idx], self.values[idx]);
        Some(linear_interp(a, b, t))
    }
}
