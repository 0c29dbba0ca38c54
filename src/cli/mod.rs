//! Command-line parsing for the MI lag scanner.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the scanning/fitting code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::data::DemoKind;
use crate::domain::{BinStrategy, FitModelSpec, ScanConfig};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "milag",
    version,
    about = "Mutual-information lag scanner and peak fitter"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan a built-in synthetic signal pair, print diagnostics, and
    /// optionally export the results.
    ///
    /// This exercises the same pipeline a library caller gets from
    /// `mi_lag_finder`, so it doubles as an end-to-end self-test.
    Demo(DemoArgs),
}

/// Options for the demo scan.
#[derive(Debug, Parser, Clone)]
pub struct DemoArgs {
    /// Which synthetic pair to generate.
    #[arg(long, value_enum, default_value_t = DemoKind::Sine)]
    pub kind: DemoKind,

    /// Samples per series.
    #[arg(short = 'n', long, default_value_t = 600)]
    pub samples: usize,

    /// True delay (samples) applied to series B in the sine demo.
    #[arg(long, default_value_t = 5.0, allow_negative_numbers = true)]
    pub offset: f64,

    /// Noise standard deviation added to both series.
    #[arg(long, default_value_t = 0.25)]
    pub noise: f64,

    /// Minimum lag to scan.
    #[arg(long, default_value_t = -10.0, allow_negative_numbers = true)]
    pub min_lag: f64,

    /// Maximum lag to scan.
    #[arg(long, default_value_t = 10.0, allow_negative_numbers = true)]
    pub max_lag: f64,

    /// Lag grid step.
    #[arg(long, default_value_t = 1.0)]
    pub lag_step: f64,

    /// Histogram bins per axis (0 = Freedman-Diaconis).
    #[arg(long, default_value_t = 0)]
    pub bins: usize,

    /// Minimum aligned points required to evaluate a lag.
    #[arg(long, default_value_t = 10)]
    pub min_overlap: usize,

    /// Surrogate count for the significance threshold (0 disables).
    #[arg(long, default_value_t = 100)]
    pub surrogates: usize,

    /// Percentile of the surrogate MI distribution used as the threshold.
    #[arg(long, default_value_t = 95.0)]
    pub percentile: f64,

    /// Random seed (surrogate generation and demo noise).
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Peak model(s) to fit.
    #[arg(long, value_enum, default_value_t = FitModelSpec::Auto)]
    pub model: FitModelSpec,

    /// Records per side in the quadratic peak window.
    #[arg(long, default_value_t = 5)]
    pub peak_window: usize,

    /// Report the minimum marginal entropy (an upper bound on MI).
    #[arg(long)]
    pub check_entropy: bool,

    /// Also scan one surrogate of A across all lags for diagnostics.
    #[arg(long)]
    pub check_surrogate: bool,

    /// Export scan records to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the full result (scan + fits) to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,
}

impl DemoArgs {
    /// Translate CLI flags into the pipeline configuration.
    pub fn to_config(&self) -> ScanConfig {
        ScanConfig {
            min_lag: self.min_lag,
            max_lag: self.max_lag,
            lag_step: self.lag_step,
            grid_step: None,
            min_overlap: self.min_overlap,
            bins: if self.bins == 0 {
                BinStrategy::FreedmanDiaconis
            } else {
                BinStrategy::Fixed(self.bins)
            },
            surrogates: self.surrogates,
            surrogate_percentile: self.percentile,
            surrogate_curve: self.check_surrogate,
            seed: self.seed,
            models: self.model,
            peak_window: self.peak_window,
            check_entropy: self.check_entropy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_args_produce_a_valid_config() {
        let cli = Cli::parse_from(["milag", "demo"]);
        let Command::Demo(args) = cli.command;
        args.to_config().validate().unwrap();
    }

    #[test]
    fn zero_bins_means_auto() {
        let cli = Cli::parse_from(["milag", "demo", "--bins", "0"]);
        let Command::Demo(args) = cli.command;
        assert_eq!(args.to_config().bins, BinStrategy::FreedmanDiaconis);
    }

    #[test]
    fn fixed_bins_are_passed_through() {
        let cli = Cli::parse_from(["milag", "demo", "--bins", "16", "--surrogates", "0"]);
        let Command::Demo(args) = cli.command;
        let config = args.to_config();
        assert_eq!(config.bins, BinStrategy::Fixed(16));
        assert_eq!(config.surrogates, 0);
    }
}
