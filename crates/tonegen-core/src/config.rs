//! Batch configuration.
//!
//! Frequencies stay strings all the way from the JSON file to the parser so
//! no digit is lost to an intermediate float.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::convert::OutputFormat;
use crate::error::ToneResult;

/// Default sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;
/// Default tone duration in seconds.
pub const DEFAULT_DURATION: f64 = 5.0;
/// Default amplitude.
pub const DEFAULT_AMPLITUDE: f64 = 0.5;
/// Default output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "audio_output";

/// Audio settings shared by every tone in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    pub sample_rate: u32,
    pub duration: f64,
    pub amplitude: f64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            duration: DEFAULT_DURATION,
            amplitude: DEFAULT_AMPLITUDE,
        }
    }
}

/// Everything a batch run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Frequency texts, in processing order.
    pub frequencies: Vec<String>,
    /// Requested output formats.
    pub formats: Vec<OutputFormat>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Duration of each tone in seconds.
    pub duration: f64,
    /// Amplitude in [0, 1].
    pub amplitude: f64,
    /// Directory receiving every output file.
    pub output_dir: PathBuf,
    /// Keep the intermediate WAV when `wav` itself was not requested.
    pub keep_lossless: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        let audio = AudioSettings::default();
        Self {
            frequencies: Vec::new(),
            formats: vec![OutputFormat::Wav],
            sample_rate: audio.sample_rate,
            duration: audio.duration,
            amplitude: audio.amplitude,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            keep_lossless: true,
        }
    }
}

impl BatchConfig {
    /// Parses a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Loads a JSON configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Shared audio settings.
    pub fn audio(&self) -> AudioSettings {
        AudioSettings {
            sample_rate: self.sample_rate,
            duration: self.duration,
            amplitude: self.amplitude,
        }
    }

    /// Requested formats with duplicates removed, first occurrence wins.
    pub fn unique_formats(&self) -> Vec<OutputFormat> {
        let mut seen = Vec::with_capacity(self.formats.len());
        for format in &self.formats {
            if !seen.contains(format) {
                seen.push(*format);
            }
        }
        seen
    }

    /// Checks the shared audio settings without synthesizing anything.
    pub fn validate_audio(&self) -> ToneResult<()> {
        let reference = crate::frequency::parse_frequency("1")?;
        crate::tone::ToneSpec::new(reference, self.sample_rate, self.duration, self.amplitude)
            .map(|_| ())
    }
}

/// Failure to load a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid configuration.
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
