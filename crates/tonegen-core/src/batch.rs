//! Batch orchestration across frequencies and formats.
//!
//! Each frequency moves through `Pending → Synthesizing → Encoding →
//! Converting → Done`. A failure stops that frequency (or, while converting,
//! just that format) and is recorded as a [`GenerationResult`]; the batch
//! always carries on with the next item.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{AudioSettings, BatchConfig};
use crate::convert::{convert, OutputFormat, Transcoder};
use crate::error::{ErrorKind, ToneError, ToneResult};
use crate::frequency::{parse_frequency, Frequency};
use crate::tone::{synthesize, ToneSpec};
use crate::wav::{pcm_hash, remove_if_exists, write_wav_file};

/// Processing stage of one batch item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Pending,
    Synthesizing,
    Encoding,
    Converting,
    Done,
    Failed,
}

/// Outcome of one (frequency, format) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The file was written.
    Success {
        /// Path of the output file.
        path: PathBuf,
        /// BLAKE3 hash of the source PCM.
        pcm_hash: String,
    },
    /// The pair failed.
    Failure {
        /// Stage that failed.
        stage: Stage,
        /// Error classification.
        kind: ErrorKind,
        /// Error message, including any captured transcoder output.
        message: String,
    },
}

/// Result for one (frequency, format) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Canonical frequency text, or the raw input if it did not parse.
    pub frequency: String,
    /// Requested format.
    pub format: OutputFormat,
    /// What happened.
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl GenerationResult {
    fn success(frequency: &str, format: OutputFormat, path: PathBuf, pcm_hash: &str) -> Self {
        Self {
            frequency: frequency.to_string(),
            format,
            outcome: Outcome::Success {
                path,
                pcm_hash: pcm_hash.to_string(),
            },
        }
    }

    fn failure(frequency: &str, format: OutputFormat, stage: Stage, err: &ToneError) -> Self {
        let message = match err {
            ToneError::ConversionFailed { output, .. } if !output.trim().is_empty() => {
                format!("{}\n{}", err, output.trim_end())
            }
            _ => err.to_string(),
        };
        Self {
            frequency: frequency.to_string(),
            format,
            outcome: Outcome::Failure {
                stage,
                kind: err.kind(),
                message,
            },
        }
    }

    /// Whether this pair succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }

    /// Output path on success.
    pub fn path(&self) -> Option<&Path> {
        match &self.outcome {
            Outcome::Success { path, .. } => Some(path),
            Outcome::Failure { .. } => None,
        }
    }

    /// Error kind on failure.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match &self.outcome {
            Outcome::Success { .. } => None,
            Outcome::Failure { kind, .. } => Some(*kind),
        }
    }

    /// Terminal stage: `Done` or `Failed`.
    pub fn stage(&self) -> Stage {
        if self.is_success() {
            Stage::Done
        } else {
            Stage::Failed
        }
    }
}

/// Aggregated results of a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Settings shared by every tone.
    pub audio: AudioSettings,
    /// Output directory.
    pub output_dir: PathBuf,
    /// Name of the transcoder, if one was available.
    pub transcoder: Option<String>,
    /// One entry per (frequency, format) pair in processing order.
    pub results: Vec<GenerationResult>,
    /// Wall-clock time of the run in milliseconds.
    pub elapsed_ms: u64,
}

impl BatchReport {
    /// Number of successful pairs.
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    /// Number of failed pairs.
    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    /// Whether every pair succeeded (vacuously true for an empty batch).
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Serializes the report as pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// File name for `frequency` in `format`: `<frequency>Hz.<ext>`.
///
/// The canonical text carries every supplied digit, so inputs that differ in
/// any digit never share a name.
pub fn output_file_name(frequency: &Frequency, format: OutputFormat) -> String {
    format!("{}Hz.{}", frequency, format.extension())
}

/// Full output path for `frequency` in `format` under `dir`.
pub fn output_path(dir: &Path, frequency: &Frequency, format: OutputFormat) -> PathBuf {
    dir.join(output_file_name(frequency, format))
}

/// Runs a batch against an optional transcoder.
pub struct BatchRunner<'a> {
    config: &'a BatchConfig,
    transcoder: Result<Box<dyn Transcoder + 'a>, String>,
}

impl<'a> BatchRunner<'a> {
    /// Creates a runner with no transcoder; converted formats fail with
    /// `EncoderUnavailable`.
    pub fn new(config: &'a BatchConfig) -> Self {
        Self {
            config,
            transcoder: Err("no transcoder configured".to_string()),
        }
    }

    /// Uses `transcoder` for every conversion.
    pub fn with_transcoder(mut self, transcoder: impl Transcoder + 'a) -> Self {
        self.transcoder = Ok(Box::new(transcoder));
        self
    }

    /// Uses the result of a transcoder lookup; a failed lookup marks the
    /// transcoder unavailable for the whole batch.
    pub fn with_located<T: Transcoder + 'a>(mut self, located: ToneResult<T>) -> Self {
        self.transcoder = match located {
            Ok(transcoder) => Ok(Box::new(transcoder)),
            Err(e) => Err(match e {
                ToneError::EncoderUnavailable { message } => message,
                other => other.to_string(),
            }),
        };
        self
    }

    /// Runs the batch.
    pub fn run(&self) -> BatchReport {
        self.run_with(|_| {})
    }

    /// Runs the batch, calling `observer` as each result is recorded.
    pub fn run_with(&self, mut observer: impl FnMut(&GenerationResult)) -> BatchReport {
        let start = Instant::now();
        let config = self.config;
        let formats = config.unique_formats();
        let mut results = Vec::with_capacity(config.frequencies.len() * formats.len());

        if !config.frequencies.is_empty() && !formats.is_empty() {
            if let Err(e) = fs::create_dir_all(&config.output_dir) {
                warn!(
                    dir = %config.output_dir.display(),
                    error = %e,
                    "could not create output directory"
                );
            }
            if let Err(reason) = &self.transcoder {
                if formats.iter().any(|f| f.needs_transcoder()) {
                    warn!(%reason, "transcoder unavailable; only WAV output will be produced");
                }
            }
        }

        let mut record = |result: GenerationResult| {
            observer(&result);
            results.push(result);
        };

        for text in &config.frequencies {
            if formats.is_empty() {
                break;
            }
            self.process_frequency(text, &formats, &mut record);
        }

        let report = BatchReport {
            audio: config.audio(),
            output_dir: config.output_dir.clone(),
            transcoder: self
                .transcoder
                .as_ref()
                .ok()
                .map(|t| t.name().to_string()),
            results,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "batch complete"
        );
        report
    }

    fn process_frequency(
        &self,
        text: &str,
        formats: &[OutputFormat],
        record: &mut impl FnMut(GenerationResult),
    ) {
        let config = self.config;
        let mut fail_all = |label: &str, stage: Stage, err: &ToneError| {
            warn!(frequency = label, ?stage, error = %err, "item failed");
            for &format in formats {
                record(GenerationResult::failure(label, format, stage, err));
            }
        };

        debug!(frequency = text, stage = ?Stage::Pending, "processing");
        let frequency = match parse_frequency(text) {
            Ok(frequency) => frequency,
            Err(e) => return fail_all(text.trim(), Stage::Pending, &e),
        };
        let label = frequency.to_string();

        debug!(frequency = %label, stage = ?Stage::Synthesizing, "processing");
        let spec = match ToneSpec::new(
            frequency.clone(),
            config.sample_rate,
            config.duration,
            config.amplitude,
        ) {
            Ok(spec) => spec,
            Err(e) => return fail_all(&label, Stage::Synthesizing, &e),
        };
        if spec.exceeds_nyquist() {
            warn!(
                frequency = %label,
                sample_rate = spec.sample_rate(),
                "frequency is at or above Nyquist and will alias"
            );
        }
        let buffer = synthesize(&spec);
        let hash = pcm_hash(&buffer);

        debug!(frequency = %label, stage = ?Stage::Encoding, "processing");
        let wav_path = output_path(&config.output_dir, &frequency, OutputFormat::Wav);
        if let Err(e) = write_wav_file(&wav_path, &buffer) {
            return fail_all(&label, Stage::Encoding, &e);
        }
        drop(buffer);

        let mut all_converted = true;
        for &format in formats {
            let result = if format.needs_transcoder() {
                debug!(frequency = %label, stage = ?Stage::Converting, %format, "processing");
                match &self.transcoder {
                    Ok(transcoder) => match convert(transcoder.as_ref(), &wav_path, format) {
                        Ok(path) => GenerationResult::success(&label, format, path, &hash),
                        Err(e) => {
                            warn!(frequency = %label, %format, error = %e, "conversion failed");
                            GenerationResult::failure(&label, format, Stage::Converting, &e)
                        }
                    },
                    Err(reason) => GenerationResult::failure(
                        &label,
                        format,
                        Stage::Converting,
                        &ToneError::encoder_unavailable(reason.clone()),
                    ),
                }
            } else {
                info!(path = %wav_path.display(), "created");
                GenerationResult::success(&label, format, wav_path.clone(), &hash)
            };
            all_converted &= result.is_success();
            record(result);
        }

        // The WAV is the only output left when a conversion failed.
        let wav_requested = formats.contains(&OutputFormat::Wav);
        if !wav_requested && !config.keep_lossless && !all_converted {
            info!(
                path = %wav_path.display(),
                "keeping intermediate WAV because a conversion failed"
            );
        } else if !wav_requested && !config.keep_lossless {
            match remove_if_exists(&wav_path) {
                Ok(()) => debug!(path = %wav_path.display(), "removed intermediate WAV"),
                Err(e) => warn!(
                    path = %wav_path.display(),
                    error = %e,
                    "could not remove intermediate WAV"
                ),
            }
        }
    }
}
