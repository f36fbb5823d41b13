//! Lossless 16-bit mono WAV encoding.
//!
//! Files carry the canonical 44-byte header and nothing else, so the same
//! samples always produce the same bytes. Decoding goes through `hound`.

mod format;
mod reader;
mod writer;

#[cfg(test)]
mod tests;

// Re-export public API
pub use format::WavFormat;
pub use reader::{decode_wav, read_wav_file};
pub use writer::{encode_wav_to_vec, pcm_hash, samples_to_pcm16, write_wav, write_wav_file};
pub(crate) use writer::remove_if_exists;

/// Size of the canonical PCM header in bytes.
pub const HEADER_LEN: usize = 44;
