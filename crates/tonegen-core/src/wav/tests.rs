//! Tests for the WAV module.

use pretty_assertions::assert_eq;

use super::format::WavFormat;
use super::*;
use crate::error::ToneError;
use crate::frequency::parse_frequency;
use crate::tone::{synthesize, SampleBuffer, ToneSpec};

fn tone(freq: &str, rate: u32, duration: f64) -> SampleBuffer {
    let spec = ToneSpec::new(parse_frequency(freq).unwrap(), rate, duration, 0.5).unwrap();
    synthesize(&spec)
}

fn u16_at(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn u32_at(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

#[test]
fn test_format_derived_fields() {
    let format = WavFormat::mono16(48000);
    assert_eq!(format.block_align(), 2);
    assert_eq!(format.byte_rate(), Some(96000));
    assert_eq!(WavFormat::mono16(u32::MAX / 2 + 1).byte_rate(), None);
}

#[test]
fn test_header_layout() {
    let buffer = SampleBuffer::new(vec![0, 1, -1, i16::MAX, i16::MIN], 44100);
    let wav = encode_wav_to_vec(&buffer).unwrap();

    assert_eq!(wav.len(), HEADER_LEN + 10);
    assert_eq!(&wav[0..4], b"RIFF");
    assert_eq!(u32_at(&wav, 4), 36 + 10);
    assert_eq!(&wav[8..12], b"WAVE");
    assert_eq!(&wav[12..16], b"fmt ");
    assert_eq!(u32_at(&wav, 16), 16);
    assert_eq!(u16_at(&wav, 20), 1); // PCM
    assert_eq!(u16_at(&wav, 22), 1); // mono
    assert_eq!(u32_at(&wav, 24), 44100);
    assert_eq!(u32_at(&wav, 28), 88200);
    assert_eq!(u16_at(&wav, 32), 2);
    assert_eq!(u16_at(&wav, 34), 16);
    assert_eq!(&wav[36..40], b"data");
    assert_eq!(u32_at(&wav, 40), 10);
}

#[test]
fn test_samples_are_little_endian() {
    let pcm = samples_to_pcm16(&[0x0102, -2]);
    assert_eq!(pcm, vec![0x02, 0x01, 0xFE, 0xFF]);
}

#[test]
fn test_decode_reproduces_buffer() {
    let buffer = tone("440.0", 44100, 0.25);
    let decoded = decode_wav(&encode_wav_to_vec(&buffer).unwrap()).unwrap();
    assert_eq!(decoded, buffer);
}

#[test]
fn test_encoding_is_deterministic() {
    let buffer = tone("432.123456789012", 48000, 0.1);
    assert_eq!(
        encode_wav_to_vec(&buffer).unwrap(),
        encode_wav_to_vec(&buffer).unwrap()
    );
    assert_eq!(pcm_hash(&buffer), pcm_hash(&buffer.clone()));
    assert_eq!(pcm_hash(&buffer).len(), 64);
}

#[test]
fn test_write_wav_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("440.0Hz.wav");
    let buffer = tone("440.0", 22050, 0.2);

    write_wav_file(&path, &buffer).unwrap();

    let on_disk = std::fs::read(&path).unwrap();
    assert_eq!(on_disk, encode_wav_to_vec(&buffer).unwrap());
    assert_eq!(read_wav_file(&path).unwrap(), buffer);
}

#[test]
fn test_write_wav_file_overwrites_and_leaves_no_temp_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.wav");

    write_wav_file(&path, &tone("100", 8000, 0.5)).unwrap();
    let second = tone("200", 8000, 0.1);
    write_wav_file(&path, &second).unwrap();

    assert_eq!(read_wav_file(&path).unwrap(), second);
    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn test_write_wav_file_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("tone.wav");
    let err = write_wav_file(&path, &tone("100", 8000, 0.01)).unwrap_err();
    assert!(matches!(err, ToneError::IoWrite { .. }));
    assert!(!path.exists());
}

#[test]
fn test_decode_rejects_garbage() {
    let err = decode_wav(b"definitely not a wav file at all, no sir").unwrap_err();
    assert!(matches!(err, ToneError::InvalidContainer { .. }));
}

#[test]
fn test_decode_rejects_stereo() {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 44100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        writer.write_sample(0i16).unwrap();
        writer.write_sample(0i16).unwrap();
        writer.finalize().unwrap();
    }
    let err = decode_wav(cursor.get_ref()).unwrap_err();
    assert!(err.to_string().contains("1 channel"));
}

#[test]
fn test_remove_if_exists_tolerates_missing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gone.wav");
    remove_if_exists(&path).unwrap();
    std::fs::write(&path, b"x").unwrap();
    remove_if_exists(&path).unwrap();
    assert!(!path.exists());
}

#[test]
fn test_oversized_sample_rate_is_an_io_error() {
    let buffer = SampleBuffer::new(vec![0, 1, 2], 3_000_000_000);
    assert!(encode_wav_to_vec(&buffer).is_err());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("huge.wav");
    let err = write_wav_file(&path, &buffer).unwrap_err();
    assert!(matches!(err, ToneError::IoWrite { .. }));
    assert!(!path.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
