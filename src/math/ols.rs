//! Least squares solver.
//!
//! In this project we repeatedly solve small linear regression problems of the form:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! The peak models are linear in their coefficients given a fixed breakpoint,
//! so β is solved many times during the breakpoint grid search, and once for
//! the quadratic window fit.
//!
//! Implementation choices:
//! - SVD solves the least-squares problem robustly even when the design
//!   matrix is tall (more rows than columns).
//! - Parameter uncertainties come from the classical covariance estimate
//!   `σ² (XᵀX)⁻¹` with `σ² = SSE / (n - p)`; near-singular normal matrices
//!   make the covariance unavailable rather than fabricated.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// A solved least-squares problem with residual and covariance diagnostics.
#[derive(Debug, Clone)]
pub struct OlsFit {
    pub beta: DVector<f64>,
    /// Parameter covariance `σ² (XᵀX)⁻¹`, when the normal matrix is invertible.
    pub covariance: Option<DMatrix<f64>>,
    pub sse: f64,
    /// Residual degrees of freedom `n - p`.
    pub dof: usize,
}

/// Solve least squares and attach SSE + parameter covariance.
///
/// Returns `None` when the solve itself fails; a missing covariance (singular
/// normal matrix, or `n <= p`) is reported as `covariance: None` so callers
/// can still use the point estimate.
pub fn ols_fit(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<OlsFit> {
    let beta = solve_least_squares(x, y)?;

    let residuals = y - x * &beta;
    let sse: f64 = residuals.iter().map(|r| r * r).sum();
    if !sse.is_finite() {
        return None;
    }

    let n = x.nrows();
    let p = x.ncols();
    let dof = n.saturating_sub(p);

    let covariance = if dof > 0 {
        let sigma2 = sse / dof as f64;
        (x.transpose() * x)
            .try_inverse()
            .map(|xtx_inv| xtx_inv * sigma2)
            .filter(|c| c.iter().all(|v| v.is_finite()))
    } else {
        None
    };

    Some(OlsFit {
        beta,
        covariance,
        sse,
        dof,
    })
}
