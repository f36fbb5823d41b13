use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;
use tonegen_core::batch::{BatchReport, GenerationResult, Outcome};

/// Print one progress line for a finished (frequency, format) pair.
pub(crate) fn print_result(result: &GenerationResult) {
    match &result.outcome {
        Outcome::Success { path, .. } => {
            println!("  {} {}", "ok".green(), path.display());
        }
        Outcome::Failure { kind, message, .. } => {
            println!(
                "  {} {} Hz [{}] {}: {}",
                "!!".red(),
                result.frequency,
                result.format,
                kind.as_str(),
                first_line(message)
            );
        }
    }
}

/// Print the end-of-batch summary.
pub(crate) fn print_summary(report: &BatchReport) {
    println!();
    println!("{}", "======================================".cyan());
    println!("{}", "  Generation Summary".cyan());
    println!("{}", "======================================".cyan());
    println!();
    println!("{} {}", "Results:".bold(), report.results.len());
    println!("{} {}", "Successful:".green().bold(), report.succeeded());
    println!("{} {}", "Failed:".red().bold(), report.failed());
    println!(
        "{} {:.2}s",
        "Runtime:".bold(),
        report.elapsed_ms as f64 / 1000.0
    );
    println!();

    let failures: Vec<&GenerationResult> =
        report.results.iter().filter(|r| !r.is_success()).collect();
    if !failures.is_empty() {
        println!("{}", "Failed items:".red().bold());
        for result in failures {
            if let Outcome::Failure {
                stage,
                kind,
                message,
            } = &result.outcome
            {
                println!(
                    "  {} {} Hz [{}] {} ({}) at {:?}",
                    "x".red(),
                    result.frequency,
                    result.format,
                    kind.as_str(),
                    kind.code(),
                    stage
                );
                for line in message.lines() {
                    println!("     {}", line.dimmed());
                }
            }
        }
        println!();
    }

    println!(
        "{} {}",
        "Outputs saved to:".blue().bold(),
        report.output_dir.display()
    );
}

/// Write the report as pretty JSON, creating parent directories.
pub(crate) fn write_report(report: &BatchReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let json = report.to_json().context("Failed to serialize report")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    Ok(())
}

fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or("")
}
