//! Lag grid generation.
//!
//! The scan walks a deterministic linear grid of lag offsets.
//!
//! Why a plain grid?
//! - Lags are interpretable in the data's own time units; researchers reason
//!   about "every 30 s from -10 min to +10 min", not about spacings.
//! - It is deterministic given the same inputs/flags.
//! - The curve fitters only need a dense enough sampling around the peak.

use crate::error::AppError;

/// Generate lags from `min_lag` to `max_lag` (inclusive) in steps of `step`.
///
/// Both endpoints are included when `step` divides the range evenly;
/// otherwise the last value is the largest grid point `<= max_lag`.
/// A degenerate range (`min_lag == max_lag`) yields a single lag.
pub fn lag_grid(min_lag: f64, max_lag: f64, step: f64) -> Result<Vec<f64>, AppError> {
    if !(min_lag.is_finite() && max_lag.is_finite()) {
        return Err(AppError::config(format!(
            "Invalid lag range: min={min_lag}, max={max_lag} (must be finite)."
        )));
    }
    if min_lag > max_lag {
        return Err(AppError::config(format!("Invalid lag range: min={min_lag} > max={max_lag}.")));
    }
    if !(step.is_finite() && step > 0.0) {
        return Err(AppError::config(format!("Lag step must be finite and > 0 (got {step}).")));
    }

    // Tolerance so that ranges evenly divided by `step` keep their endpoint
    // despite accumulated float error.
    let eps = step * 1e-9;
    let count = ((max_lag - min_lag) / step + eps).floor() as usize + 1;

    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let lag = min_lag + step * i as f64;
        if lag > max_lag + eps {
            break;
        }
        out.push(lag.min(max_lag));
    }
    Ok(out)
}
