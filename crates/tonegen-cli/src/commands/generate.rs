//! Generate command implementation
//!
//! Builds a batch from the command line and an optional config file, runs it
//! and writes the summary report.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tonegen_core::batch::{BatchReport, BatchRunner};
use tonegen_core::config::BatchConfig;
use tonegen_core::convert::{ConverterConfig, Ffmpeg};
use tracing::warn;

use super::reporting::{print_result, print_summary, write_report};
use crate::cli_args::GenerateArgs;

/// File name of the summary report inside the output directory.
pub const SUMMARY_FILE: &str = "generation_summary.json";

/// Run the generate command
///
/// # Returns
/// Exit code: 0 if every result succeeded, 1 otherwise
pub fn run(args: &GenerateArgs) -> Result<ExitCode> {
    let (report, _) = execute(args, !args.json)?;

    if args.json {
        println!("{}", report.to_json().context("Failed to serialize report")?);
    } else {
        print_summary(&report);
    }

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

/// Runs the batch and writes the report, returning it with the report path.
pub fn execute(args: &GenerateArgs, print_text: bool) -> Result<(BatchReport, PathBuf)> {
    let config = build_config(args)?;
    config
        .validate_audio()
        .context("Invalid audio settings")?;

    if config.frequencies.is_empty() {
        warn!("no frequencies given; nothing to generate");
    }

    if print_text {
        println!("{}", "======================================".cyan());
        println!("{}", "  Tonegen Batch".cyan());
        println!("{}", "======================================".cyan());
        println!();
        println!(
            "{} {}",
            "Output directory:".blue().bold(),
            config.output_dir.display()
        );
        println!(
            "{} {} Hz, {} s, amplitude {}",
            "Audio:".blue().bold(),
            config.sample_rate,
            config.duration,
            config.amplitude
        );
        let formats: Vec<&str> = config.unique_formats().iter().map(|f| f.as_str()).collect();
        println!("{} {}", "Formats:".blue().bold(), formats.join(", "));
        println!();
    }

    let mut runner = BatchRunner::new(&config);
    if config.unique_formats().iter().any(|f| f.needs_transcoder()) {
        runner = runner.with_located(Ffmpeg::locate(&converter_config(args)));
    }

    let report = runner.run_with(|result| {
        if print_text {
            print_result(result);
        }
    });

    let report_path = args
        .report
        .clone()
        .unwrap_or_else(|| config.output_dir.join(SUMMARY_FILE));
    write_report(&report, &report_path)?;

    Ok((report, report_path))
}

/// Merges the config file (if any) with command-line overrides.
pub fn build_config(args: &GenerateArgs) -> Result<BatchConfig> {
    let mut config = match &args.config {
        Some(path) => BatchConfig::from_file(path)?,
        None => BatchConfig::default(),
    };

    if !args.frequencies.is_empty() {
        config.frequencies = args.frequencies.clone();
    }
    if !args.formats.is_empty() {
        config.formats = args.formats.clone();
    }
    if let Some(sample_rate) = args.sample_rate {
        config.sample_rate = sample_rate;
    }
    if let Some(duration) = args.duration {
        config.duration = duration;
    }
    if let Some(amplitude) = args.amplitude {
        config.amplitude = amplitude;
    }
    if let Some(out_dir) = &args.out_dir {
        config.output_dir = out_dir.clone();
    }
    if args.discard_lossless {
        config.keep_lossless = false;
    }

    if config.formats.is_empty() {
        bail!("No output formats requested");
    }
    Ok(config)
}

fn converter_config(args: &GenerateArgs) -> ConverterConfig {
    let mut config = ConverterConfig::default();
    if let Some(path) = &args.ffmpeg {
        config = config.ffmpeg_path(path);
    }
    if let Some(secs) = args.timeout {
        config = config.timeout_secs(secs);
    }
    config
}
