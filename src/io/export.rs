//! Export scan and fit results for downstream consumers.
//!
//! The CSV export is meant to be easy to consume in spreadsheets or plotting
//! scripts; the JSON export round-trips the full structured result.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::app::pipeline::MiLagOutput;
use crate::domain::{LagRecord, LagScanResult, PeakFit, ScanStats};
use crate::error::AppError;

/// A saved scan result (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanFile {
    pub tool: String,
    pub stats: ScanStats,
    pub records: Vec<LagRecord>,
    pub fits: Vec<PeakFit>,
    pub best: PeakFit,
    pub surrogate_curve: Option<Vec<LagRecord>>,
}

/// Write the per-lag scan records to a CSV file.
pub fn write_scan_csv(path: &Path, scan: &LagScanResult) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::config(format!("Failed to create export CSV '{}': {e}", path.display()))
    })?;

    writeln!(file, "lag,mi_bits,threshold_bits,significant")
        .map_err(|e| AppError::internal(format!("Failed to write export CSV header: {e}")))?;

    for r in &scan.records {
        let threshold = r
            .threshold
            .map(|t| format!("{t:.6}"))
            .unwrap_or_default();
        let significant = r
            .is_significant()
            .map(|s| s.to_string())
            .unwrap_or_default();
        writeln!(file, "{:.6},{:.6},{threshold},{significant}", r.lag, r.mi)
            .map_err(|e| AppError::internal(format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

/// Write the full result (scan + fits) to a JSON file.
pub fn write_result_json(path: &Path, output: &MiLagOutput) -> Result<(), AppError> {
    let scan_file = ScanFile {
        tool: format!("milag v{}", env!("CARGO_PKG_VERSION")),
        stats: output.scan.stats.clone(),
        records: output.scan.records.clone(),
        fits: output.selection.fits.clone(),
        best: output.selection.best.clone(),
        surrogate_curve: output.surrogate_curve.clone(),
    };

    let file = File::create(path).map_err(|e| {
        AppError::config(format!("Failed to create export JSON '{}': {e}", path.display()))
    })?;
    serde_json::to_writer_pretty(file, &scan_file)
        .map_err(|e| AppError::internal(format!("Failed to write export JSON: {e}")))?;
    Ok(())
}

/// Read a previously exported JSON result.
pub fn read_result_json(path: &Path) -> Result<ScanFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::config(format!("Failed to open result JSON '{}': {e}", path.display()))
    })?;
    serde_json::from_reader(file)
        .map_err(|e| AppError::config(format!("Invalid result JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitModelKind, FitOutcome};

    fn sample_scan() -> LagScanResult {
        let records = vec![
            LagRecord {
                lag: -1.0,
                mi: 0.1,
                threshold: Some(0.05),
            },
            LagRecord {
                lag: 0.0,
                mi: f64::NAN,
                threshold: Some(0.05),
            },
            LagRecord {
                lag: 1.0,
                mi: 0.3,
                threshold: Some(0.05),
            },
        ];
        LagScanResult {
            stats: ScanStats {
                n_lags: 3,
                n_skipped: 1,
                grid_step: 1.0,
                mi_max: 0.3,
                min_entropy: None,
            },
            records,
        }
    }

    #[test]
    fn csv_export_writes_one_row_per_record() {
        let dir = std::env::temp_dir();
        let path = dir.join("milag_test_scan.csv");
        write_scan_csv(&path, &sample_scan()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("lag,mi_bits"));
        assert!(lines[3].contains("true"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn json_export_round_trips() {
        use crate::fit::selection::FitSelection;

        let best = PeakFit {
            model: FitModelKind::Quadratic,
            outcome: FitOutcome::Fitted {
                peak_lag: 1.0,
                peak_lag_se: 0.2,
                params: vec![0.1, 0.2, -0.05],
            },
            rms: 0.01,
        };
        let output = MiLagOutput {
            scan: sample_scan(),
            selection: FitSelection {
                best: best.clone(),
                fits: vec![best],
            },
            surrogate_curve: None,
        };

        let dir = std::env::temp_dir();
        let path = dir.join("milag_test_result.json");
        write_result_json(&path, &output).unwrap();
        let loaded = read_result_json(&path).unwrap();

        assert_eq!(loaded.records.len(), 3);
        assert_eq!(loaded.stats.n_skipped, 1);
        assert!((loaded.best.outcome.peak_lag() - 1.0).abs() < 1e-12);
        std::fs::remove_file(&path).ok();
    }
}
