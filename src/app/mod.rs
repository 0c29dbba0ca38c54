//! Application wiring: CLI dispatch around the scan pipeline.

pub mod pipeline;

pub use pipeline::*;

use clap::Parser;

use crate::cli::{Cli, Command, DemoArgs};
use crate::data::{DemoKind, pulse_pair, sine_pair};
use crate::error::AppError;
use crate::io::{write_result_json, write_scan_csv};
use crate::report::format_run_summary;

/// Entry point for the `milag` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    match cli.command {
        Command::Demo(args) => run_demo(&args),
    }
}

fn run_demo(args: &DemoArgs) -> Result<(), AppError> {
    let config = args.to_config();
    let pair = match args.kind {
        DemoKind::Pulse => pulse_pair(args.samples, args.noise, args.seed)?,
        DemoKind::Sine => sine_pair(args.samples, args.offset, args.noise, args.seed)?,
    };

    let output = mi_lag_finder(&pair.a, &pair.b, &config)?;

    print!("{}", format_run_summary(&output, &config, pair.true_lag));

    if let Some(path) = &args.export {
        write_scan_csv(path, &output.scan)?;
        println!("Scan records written to {}", path.display());
    }
    if let Some(path) = &args.export_json {
        write_result_json(path, &output)?;
        println!("Full result written to {}", path.display());
    }

    Ok(())
}
