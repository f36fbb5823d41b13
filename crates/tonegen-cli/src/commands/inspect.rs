//! Inspect command implementation

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use std::process::ExitCode;
use tonegen_core::analysis::{analyze, SignalStats};
use tonegen_core::wav::read_wav_file;

/// Run the inspect command
pub fn run(input: &Path, json: bool) -> Result<ExitCode> {
    let stats = inspect(input)?;

    if json {
        let out = serde_json::to_string_pretty(&stats).context("Failed to serialize stats")?;
        println!("{}", out);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{} {}", "File:".blue().bold(), input.display());
    println!("  {:<20} {} Hz", "Sample rate:", stats.sample_rate);
    println!("  {:<20} {}", "Samples:", stats.sample_count);
    println!("  {:<20} {:.6} s", "Duration:", stats.duration_seconds);
    println!("  {:<20} {}", "Peak:", stats.peak);
    println!("  {:<20} {:.6}", "RMS:", stats.rms);
    match stats.estimated_frequency {
        Some(hz) => println!("  {:<20} {:.4} Hz", "Estimated frequency:", hz),
        None => println!("  {:<20} {}", "Estimated frequency:", "n/a".dimmed()),
    }
    println!("  {:<20} {}", "PCM hash:", stats.pcm_hash);

    Ok(ExitCode::SUCCESS)
}

/// Decodes `input` and measures it.
pub fn inspect(input: &Path) -> Result<SignalStats> {
    let buffer =
        read_wav_file(input).with_context(|| format!("Failed to read {}", input.display()))?;
    Ok(analyze(&buffer))
}
