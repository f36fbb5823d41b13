//! Doctor command implementation
//!
//! Checks the external encoder and output directory permissions.

use anyhow::Result;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tonegen_core::config::DEFAULT_OUTPUT_DIR;
use tonegen_core::convert::{ConverterConfig, Ffmpeg, OutputFormat, FFMPEG_ENV};

/// Run the doctor command
///
/// Checks:
/// - ffmpeg installation (a missing ffmpeg is only a warning)
/// - Output directory permissions
///
/// # Returns
/// Exit code: 0 if all hard checks pass, 1 if any fail
pub fn run(ffmpeg: Option<&Path>, out_dir: Option<&Path>) -> Result<ExitCode> {
    println!("{}", "Tonegen Doctor".cyan().bold());
    println!("{}", "==============".cyan());
    println!();

    let mut all_ok = true;

    println!("{}", "Versions:".bold());
    println!(
        "  {} tonegen-cli v{}",
        "->".green(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    println!("{}", "Dependencies:".bold());
    let mut config = ConverterConfig::default();
    if let Some(path) = ffmpeg {
        config = config.ffmpeg_path(path);
    }
    let ffmpeg_found = match Ffmpeg::locate(&config) {
        Ok(ffmpeg) => {
            let version = ffmpeg
                .version()
                .unwrap_or_else(|| "(version unknown)".to_string());
            println!(
                "  {} {} ({})",
                "ok".green(),
                version,
                ffmpeg.path().display()
            );
            true
        }
        Err(e) => {
            println!("  {} {}", "!!".yellow(), e);
            println!(
                "     {}",
                "ffmpeg is required for flac, opus and mp3 output.".dimmed()
            );
            println!(
                "     {}",
                format!("Install it, pass --ffmpeg, or set {}.", FFMPEG_ENV).dimmed()
            );
            false
        }
    };
    println!();

    println!("{}", "Formats:".bold());
    for format in OutputFormat::ALL {
        if !format.needs_transcoder() || ffmpeg_found {
            println!("  {} {} ({:?})", "ok".green(), format, format.kind());
        } else {
            println!("  {} {} (needs ffmpeg)", "!!".yellow(), format);
        }
    }
    println!();

    println!("{}", "Permissions:".bold());
    let out_dir = out_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    match check_writable(&out_dir) {
        Ok(checked) if checked == out_dir => {
            println!(
                "  {} Output directory is writable ({})",
                "ok".green(),
                out_dir.display()
            );
        }
        Ok(checked) => {
            println!(
                "  {} Output directory will be created under {} (writable)",
                "ok".green(),
                checked.display()
            );
        }
        Err(e) => {
            println!(
                "  {} Cannot write to {}: {}",
                "!!".red(),
                out_dir.display(),
                e
            );
            all_ok = false;
        }
    }
    println!();

    if all_ok {
        println!("{} All checks passed!", "SUCCESS".green().bold());
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "{} Some checks failed. See above for details.",
            "FAILURE".red().bold()
        );
        Ok(ExitCode::from(1))
    }
}

/// Checks that `dir`, or its nearest existing ancestor, accepts new files.
///
/// Returns the directory that was checked.
pub fn check_writable(dir: &Path) -> std::io::Result<PathBuf> {
    let mut candidate = dir;
    while !candidate.exists() {
        match candidate.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => candidate = parent,
            _ => {
                candidate = Path::new(".");
                break;
            }
        }
    }

    let test_file = candidate.join(".tonegen_write_test");
    fs::write(&test_file, "test")?;
    let _ = fs::remove_file(&test_file);
    Ok(candidate.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_check_writable_existing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(check_writable(dir.path()).unwrap(), dir.path());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_check_writable_walks_to_existing_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        assert_eq!(check_writable(&nested).unwrap(), dir.path());
        assert!(!nested.exists());
    }

    #[test]
    fn test_check_writable_rejects_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain");
        fs::write(&file, "x").unwrap();
        assert!(check_writable(&file).is_err());
    }
}
