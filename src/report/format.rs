//! Terminal report formatting.

use crate::app::pipeline::MiLagOutput;
use crate::domain::{FitOutcome, LagScanResult, ScanConfig};

/// Format the full run summary (scan stats + fit diagnostics + chosen model).
pub fn format_run_summary(
    output: &MiLagOutput,
    config: &ScanConfig,
    true_lag: Option<f64>,
) -> String {
    let mut out = String::new();
    let scan = &output.scan;

    out.push_str("=== milag - MI lag scan ===\n");
    out.push_str(&format!(
        "Lags: [{}, {}] step {} ({} records, {} skipped)\n",
        config.min_lag, config.max_lag, config.lag_step, scan.stats.n_lags, scan.stats.n_skipped
    ));
    out.push_str(&format!("Grid step: {:.6}\n", scan.stats.grid_step));
    out.push_str(&format!("MI max: {:.4} bits\n", scan.stats.mi_max));

    if let Some(threshold) = scan.threshold() {
        let significant = scan
            .records
            .iter()
            .filter(|r| r.is_significant() == Some(true))
            .count();
        out.push_str(&format!(
            "Surrogate threshold (p{}, n={}): {threshold:.4} bits | {significant} significant lags\n",
            config.surrogate_percentile, config.surrogates
        ));
    }
    if let Some(h_min) = output.min_entropy() {
        out.push_str(&format!("Min marginal entropy: {h_min:.4} bits\n"));
    }
    if let Some(lag) = true_lag {
        out.push_str(&format!("True lag (synthetic): {lag}\n"));
    }

    out.push_str("\nModel diagnostics:\n");
    for fit in &output.selection.fits {
        let chosen = if fit.model == output.selection.best.model {
            "*"
        } else {
            " "
        };
        match &fit.outcome {
            FitOutcome::Fitted {
                peak_lag,
                peak_lag_se,
                ..
            } => {
                out.push_str(&format!(
                    "{chosen} {:<17} peak={peak_lag:.3} +/- {peak_lag_se:.3} | rms={:.4}\n",
                    fit.model.display_name(),
                    fit.rms
                ));
            }
            FitOutcome::RawMaximum { peak_lag, reason } => {
                out.push_str(&format!(
                    "{chosen} {:<17} raw maximum at {peak_lag:.3} ({reason})\n",
                    fit.model.display_name()
                ));
            }
        }
    }

    out.push_str("\nBest estimate:\n");
    let best = &output.selection.best;
    match &best.outcome {
        FitOutcome::Fitted {
            peak_lag,
            peak_lag_se,
            params,
        } => {
            out.push_str(&format!(
                "- {}: peak lag {peak_lag:.3} +/- {peak_lag_se:.3}\n",
                best.model.display_name()
            ));
            out.push_str(&format!("- params: {}\n", fmt_vec(params)));
        }
        FitOutcome::RawMaximum { peak_lag, reason } => {
            out.push_str(&format!(
                "- {}: fit failed, reporting raw maximum at {peak_lag:.3}\n",
                best.model.display_name()
            ));
            out.push_str(&format!("- reason: {reason}\n"));
            out.push_str("- uncertainty: undefined\n");
        }
    }
    out.push('\n');

    out
}

/// Format the per-lag records as an aligned table.
pub fn format_scan_table(scan: &LagScanResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:>10}  {:>10}  {:>6}\n", "lag", "mi_bits", "sig"));
    for r in &scan.records {
        let mi = if r.is_skipped() {
            "skipped".to_string()
        } else {
            format!("{:.4}", r.mi)
        };
        let sig = match r.is_significant() {
            Some(true) => "*",
            Some(false) => "",
            None => "-",
        };
        out.push_str(&format!("{:>10.3}  {mi:>10}  {sig:>6}\n", r.lag));
    }
    out
}

fn fmt_vec(values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().map(|v| format!("{v:.5}")).collect();
    format!("[{}]", parts.join(", "))
}
