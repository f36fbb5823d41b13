//! Error types for tone generation.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for tone generation operations.
pub type ToneResult<T> = Result<T, ToneError>;

/// Errors that can occur while parsing, synthesizing, encoding or converting a tone.
#[derive(Debug, Error)]
pub enum ToneError {
    /// Frequency text is not a positive decimal numeral.
    #[error("invalid frequency '{text}': {reason}")]
    InvalidFrequency {
        /// The rejected input text.
        text: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Amplitude outside [0, 1].
    #[error("invalid amplitude {amplitude}: must be between 0.0 and 1.0")]
    InvalidAmplitude {
        /// The rejected amplitude.
        amplitude: f64,
    },

    /// Sample rate, duration or resulting sample count is unusable.
    #[error("invalid tone spec: {message}")]
    InvalidToneSpec {
        /// Error message.
        message: String,
    },

    /// Filesystem failure while writing an output file.
    #[error("failed to write {}: {source}", path.display())]
    IoWrite {
        /// Path that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The external transcoder could not be located.
    #[error("encoder unavailable: {message}")]
    EncoderUnavailable {
        /// Error message.
        message: String,
    },

    /// The external transcoder failed.
    #[error("conversion to {format} failed: {message}")]
    ConversionFailed {
        /// Target format identifier.
        format: String,
        /// Error message (exit status, timeout, spawn failure).
        message: String,
        /// Captured stderr of the failed invocation.
        output: String,
    },

    /// A WAV container could not be decoded.
    #[error("invalid WAV container: {message}")]
    InvalidContainer {
        /// Error message.
        message: String,
    },
}

impl ToneError {
    /// Creates an invalid frequency error.
    pub fn invalid_frequency(text: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFrequency {
            text: text.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid tone spec error.
    pub fn invalid_spec(message: impl Into<String>) -> Self {
        Self::InvalidToneSpec {
            message: message.into(),
        }
    }

    /// Creates an I/O write error for `path`.
    pub fn io_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoWrite {
            path: path.into(),
            source,
        }
    }

    /// Creates an encoder unavailable error.
    pub fn encoder_unavailable(message: impl Into<String>) -> Self {
        Self::EncoderUnavailable {
            message: message.into(),
        }
    }

    /// Creates a conversion failed error.
    pub fn conversion_failed(
        format: impl Into<String>,
        message: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self::ConversionFailed {
            format: format.into(),
            message: message.into(),
            output: output.into(),
        }
    }

    /// Creates an invalid container error.
    pub fn invalid_container(message: impl Into<String>) -> Self {
        Self::InvalidContainer {
            message: message.into(),
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ToneError::InvalidFrequency { .. } => ErrorKind::InvalidFrequency,
            ToneError::InvalidAmplitude { .. } => ErrorKind::InvalidAmplitude,
            ToneError::InvalidToneSpec { .. } => ErrorKind::InvalidToneSpec,
            ToneError::IoWrite { .. } => ErrorKind::IoWrite,
            ToneError::EncoderUnavailable { .. } => ErrorKind::EncoderUnavailable,
            ToneError::ConversionFailed { .. } => ErrorKind::ConversionFailed,
            ToneError::InvalidContainer { .. } => ErrorKind::InvalidContainer,
        }
    }

    /// Returns the stable error code.
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }
}

/// Serializable classification of a [`ToneError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidFrequency,
    InvalidAmplitude,
    InvalidToneSpec,
    IoWrite,
    EncoderUnavailable,
    ConversionFailed,
    InvalidContainer,
}

impl ErrorKind {
    /// Returns the stable error code for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidFrequency => "TONE_001",
            ErrorKind::InvalidAmplitude => "TONE_002",
            ErrorKind::InvalidToneSpec => "TONE_003",
            ErrorKind::IoWrite => "TONE_004",
            ErrorKind::EncoderUnavailable => "TONE_005",
            ErrorKind::ConversionFailed => "TONE_006",
            ErrorKind::InvalidContainer => "TONE_007",
        }
    }

    /// Returns the kind name as shown in summaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidFrequency => "InvalidFrequency",
            ErrorKind::InvalidAmplitude => "InvalidAmplitude",
            ErrorKind::InvalidToneSpec => "InvalidToneSpec",
            ErrorKind::IoWrite => "IOWriteError",
            ErrorKind::EncoderUnavailable => "EncoderUnavailable",
            ErrorKind::ConversionFailed => "ConversionFailed",
            ErrorKind::InvalidContainer => "InvalidContainer",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
