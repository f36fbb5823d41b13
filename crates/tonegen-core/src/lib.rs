//! Tonegen Core
//!
//! Batch generation of precise sine test tones:
//!
//! - exact decimal frequencies with arbitrary fractional precision
//! - deterministic 16-bit mono PCM synthesis
//! - lossless WAV encoding, optionally converted to FLAC, Opus or MP3
//!
//! # Determinism
//!
//! Synthesis uses no randomness and no time-dependent state. The same
//! frequency text and audio settings always produce byte-identical WAV files,
//! and every successful result carries a BLAKE3 hash of its PCM payload.
//!
//! # Precision
//!
//! Frequencies are never converted to a binary float as a whole. The integer
//! hertz enter the phase computation through exact integer arithmetic, so a
//! long tone at a high frequency keeps its phase to the last sample. Digits
//! beyond what an `f64` resolves still distinguish output file names.
//!
//! # Example
//!
//! ```no_run
//! use tonegen_core::batch::BatchRunner;
//! use tonegen_core::config::BatchConfig;
//! use tonegen_core::convert::{ConverterConfig, Ffmpeg};
//!
//! let config = BatchConfig {
//!     frequencies: vec!["440.0".into(), "12500.000000000000000001".into()],
//!     ..Default::default()
//! };
//! let report = BatchRunner::new(&config)
//!     .with_located(Ffmpeg::locate(&ConverterConfig::default()))
//!     .run();
//! println!("{} succeeded, {} failed", report.succeeded(), report.failed());
//! ```
//!
//! # Crate Structure
//!
//! - [`frequency`] - Exact decimal frequency parsing and formatting
//! - [`tone`] - Tone validation and synthesis
//! - [`wav`] - Deterministic WAV writer and hound-based reader
//! - [`convert`] - Output formats and the ffmpeg transcoder
//! - [`batch`] - Batch orchestration and reports
//! - [`config`] - JSON batch configuration
//! - [`analysis`] - Signal measurements

pub mod analysis;
pub mod batch;
pub mod config;
pub mod convert;
pub mod error;
pub mod frequency;
pub mod tone;
pub mod wav;

pub use batch::{BatchReport, BatchRunner, GenerationResult, Outcome, Stage};
pub use config::BatchConfig;
pub use convert::{OutputFormat, Transcoder};
pub use error::{ErrorKind, ToneError, ToneResult};
pub use frequency::{parse_frequency, Frequency};
pub use tone::{generate_tone, synthesize, SampleBuffer, ToneSpec};
