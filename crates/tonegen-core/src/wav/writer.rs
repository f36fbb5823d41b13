//! WAV writing and PCM conversion.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use super::format::WavFormat;
use super::HEADER_LEN;
use crate::error::{ToneError, ToneResult};
use crate::tone::SampleBuffer;

/// Writes a complete WAV file to a writer.
///
/// # Arguments
/// * `writer` - Output writer
/// * `format` - WAV format parameters
/// * `pcm_data` - Raw little-endian PCM bytes
pub fn write_wav<W: Write>(writer: &mut W, format: &WavFormat, pcm_data: &[u8]) -> io::Result<()> {
    let data_size = u32::try_from(pcm_data.len())
        .ok()
        .filter(|size| *size <= u32::MAX - 36)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "PCM data exceeds WAV limit"))?;
    let byte_rate = format.byte_rate().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "sample rate exceeds WAV limit")
    })?;
    let file_size = 36 + data_size; // Total file size minus 8 bytes for RIFF header

    // RIFF header
    writer.write_all(b"RIFF")?;
    writer.write_all(&file_size.to_le_bytes())?;
    writer.write_all(b"WAVE")?;

    // fmt chunk
    writer.write_all(b"fmt ")?;
    writer.write_all(&16u32.to_le_bytes())?; // Chunk size (16 for PCM)
    writer.write_all(&1u16.to_le_bytes())?; // Audio format (1 = PCM)
    writer.write_all(&format.channels.to_le_bytes())?;
    writer.write_all(&format.sample_rate.to_le_bytes())?;
    writer.write_all(&byte_rate.to_le_bytes())?;
    writer.write_all(&format.block_align().to_le_bytes())?;
    writer.write_all(&format.bits_per_sample.to_le_bytes())?;

    // data chunk
    writer.write_all(b"data")?;
    writer.write_all(&data_size.to_le_bytes())?;
    writer.write_all(pcm_data)?;

    Ok(())
}

/// Converts samples to little-endian 16-bit PCM bytes.
pub fn samples_to_pcm16(samples: &[i16]) -> Vec<u8> {
    let mut pcm = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        pcm.extend_from_slice(&sample.to_le_bytes());
    }
    pcm
}

/// Encodes a buffer as a complete WAV file in memory.
///
/// # Errors
/// `InvalidInput` if the sample rate or payload does not fit the header.
pub fn encode_wav_to_vec(buffer: &SampleBuffer) -> io::Result<Vec<u8>> {
    let pcm = samples_to_pcm16(buffer.samples());
    let mut out = Vec::with_capacity(HEADER_LEN + pcm.len());
    write_wav(&mut out, &WavFormat::mono16(buffer.sample_rate()), &pcm)?;
    Ok(out)
}

/// BLAKE3 hash of the buffer's PCM payload (not the whole file).
pub fn pcm_hash(buffer: &SampleBuffer) -> String {
    blake3::hash(&samples_to_pcm16(buffer.samples()))
        .to_hex()
        .to_string()
}

/// Writes `buffer` to `path`, replacing any existing file.
///
/// The file is written to a temporary sibling first and renamed into place, so
/// `path` either holds the complete new file or is left untouched.
///
/// # Errors
/// [`ToneError::IoWrite`] on any filesystem failure.
pub fn write_wav_file(path: &Path, buffer: &SampleBuffer) -> ToneResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".tonegen-")
        .suffix(".wav.part")
        .tempfile_in(dir)
        .map_err(|e| ToneError::io_write(path, e))?;

    let pcm = samples_to_pcm16(buffer.samples());
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write_wav(&mut writer, &WavFormat::mono16(buffer.sample_rate()), &pcm)
            .and_then(|_| writer.flush())
            .map_err(|e| ToneError::io_write(path, e))?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(|e| ToneError::io_write(path, e))?;

    tmp.persist(path)
        .map_err(|e| ToneError::io_write(path, e.error))?;

    debug!(
        path = %path.display(),
        bytes = HEADER_LEN + pcm.len(),
        "wrote WAV file"
    );
    Ok(())
}

/// Removes a file if present; used for retention cleanup.
pub(crate) fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
