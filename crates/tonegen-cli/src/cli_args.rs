//! CLI argument definitions for the tonegen command-line interface.
//!
//! All `#[derive(Parser)]`, `#[derive(Subcommand)]` and `#[derive(Args)]`
//! types are defined here, keeping `main.rs` focused on dispatch logic.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tonegen_core::convert::OutputFormat;

/// Tonegen - Precise Sine Test Tone Generator
#[derive(Parser, Debug)]
#[command(name = "tonegen")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Show debug logs on stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate tones for a list of frequencies
    Generate(GenerateArgs),

    /// Check ffmpeg and output directory permissions
    Doctor {
        /// Path to the ffmpeg executable
        #[arg(long)]
        ffmpeg: Option<PathBuf>,

        /// Output directory to check (default: audio_output)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },

    /// Decode a generated WAV file and print its measurements
    Inspect {
        /// Path to the WAV file
        #[arg(short, long)]
        input: PathBuf,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },
}

/// Arguments of `tonegen generate`.
#[derive(Args, Debug, Default, Clone)]
pub struct GenerateArgs {
    /// Frequencies in Hz, as decimal text (e.g. 440.0 or 12500.000000000001)
    pub frequencies: Vec<String>,

    /// JSON batch configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format, repeatable or comma separated (wav, flac, opus, mp3)
    #[arg(short, long = "format", value_delimiter = ',')]
    pub formats: Vec<OutputFormat>,

    /// Sample rate in Hz (default: 48000)
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Duration of each tone in seconds (default: 5.0)
    #[arg(long)]
    pub duration: Option<f64>,

    /// Amplitude between 0 and 1 (default: 0.5)
    #[arg(long)]
    pub amplitude: Option<f64>,

    /// Output directory (default: audio_output)
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Delete the intermediate WAV when wav itself was not requested
    #[arg(long)]
    pub discard_lossless: bool,

    /// Path to the ffmpeg executable
    #[arg(long)]
    pub ffmpeg: Option<PathBuf>,

    /// Timeout for a single conversion in seconds (default: 300)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Summary report path (default: <out-dir>/generation_summary.json)
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Print the summary report as JSON on stdout (no colored output)
    #[arg(long)]
    pub json: bool,
}
