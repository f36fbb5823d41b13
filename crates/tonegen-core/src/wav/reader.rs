//! WAV decoding.

use std::io::Cursor;
use std::path::Path;

use crate::error::{ToneError, ToneResult};
use crate::tone::SampleBuffer;

/// Decodes a 16-bit mono PCM WAV file from memory.
///
/// # Errors
/// [`ToneError::InvalidContainer`] if the bytes are not a WAV file or use a
/// layout other than 16-bit integer mono.
pub fn decode_wav(bytes: &[u8]) -> ToneResult<SampleBuffer> {
    let reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| ToneError::invalid_container(e.to_string()))?;
    decode(reader)
}

/// Reads and decodes a WAV file from disk.
pub fn read_wav_file(path: &Path) -> ToneResult<SampleBuffer> {
    let reader = hound::WavReader::open(path).map_err(|e| {
        ToneError::invalid_container(format!("{}: {}", path.display(), e))
    })?;
    decode(reader)
}

fn decode<R: std::io::Read>(reader: hound::WavReader<R>) -> ToneResult<SampleBuffer> {
    let spec = reader.spec();
    if spec.channels != 1 {
        return Err(ToneError::invalid_container(format!(
            "expected 1 channel, found {}",
            spec.channels
        )));
    }
    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(ToneError::invalid_container(format!(
            "expected 16-bit integer PCM, found {}-bit {:?}",
            spec.bits_per_sample, spec.sample_format
        )));
    }

    let samples = reader
        .into_samples::<i16>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ToneError::invalid_container(e.to_string()))?;

    Ok(SampleBuffer::new(samples, spec.sample_rate))
}
