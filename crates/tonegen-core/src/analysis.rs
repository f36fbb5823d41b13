//! Signal measurements for generated tones.

use serde::{Deserialize, Serialize};

use crate::tone::{SampleBuffer, FULL_SCALE};
use crate::wav::pcm_hash;

/// Summary of a decoded tone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalStats {
    pub sample_rate: u32,
    pub sample_count: usize,
    pub duration_seconds: f64,
    /// Largest absolute sample value.
    pub peak: u16,
    /// RMS normalized to full scale.
    pub rms: f64,
    /// Frequency estimated from zero crossings, if the signal crosses often enough.
    pub estimated_frequency: Option<f64>,
    /// BLAKE3 hash of the PCM payload.
    pub pcm_hash: String,
}

/// Measures `buffer`.
pub fn analyze(buffer: &SampleBuffer) -> SignalStats {
    let samples = buffer.samples();
    SignalStats {
        sample_rate: buffer.sample_rate(),
        sample_count: samples.len(),
        duration_seconds: buffer.duration_seconds(),
        peak: peak(samples),
        rms: rms(samples),
        estimated_frequency: estimate_frequency(samples, buffer.sample_rate()),
        pcm_hash: pcm_hash(buffer),
    }
}

/// Largest absolute sample value. Returns 0 for empty input.
///
/// # Example
///
/// ```rust
/// use tonegen_core::analysis::peak;
///
/// assert_eq!(peak(&[0, 120, -300, 5]), 300);
/// assert_eq!(peak(&[]), 0);
/// ```
pub fn peak(samples: &[i16]) -> u16 {
    samples.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0)
}

/// Root mean square relative to 16-bit full scale. Returns 0.0 for empty input.
pub fn rms(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples
        .iter()
        .map(|&s| {
            let v = s as f64 / FULL_SCALE;
            v * v
        })
        .sum();
    (sum / samples.len() as f64).sqrt()
}

/// Estimates the frequency of a periodic signal from its upward zero crossings.
///
/// Crossing positions are linearly interpolated between samples, and the
/// frequency is the number of whole periods between the first and last
/// crossing divided by the time between them.
///
/// # Returns
///
/// `None` if the signal has fewer than two upward crossings.
///
/// # Example
///
/// ```rust
/// use tonegen_core::analysis::estimate_frequency;
///
/// // Four samples per period at 4 kHz.
/// let samples = [0i16, 100, 0, -100].repeat(10);
/// let hz = estimate_frequency(&samples, 4000).unwrap();
/// assert!((hz - 1000.0).abs() < 1e-9);
/// ```
pub fn estimate_frequency(samples: &[i16], sample_rate: u32) -> Option<f64> {
    let mut first: Option<f64> = None;
    let mut last = 0.0;
    let mut crossings = 0usize;

    for (i, pair) in samples.windows(2).enumerate() {
        let (a, b) = (pair[0] as f64, pair[1] as f64);
        if a < 0.0 && b >= 0.0 {
            let position = i as f64 + (-a) / (b - a);
            first.get_or_insert(position);
            last = position;
            crossings += 1;
        }
    }

    let first = first?;
    if crossings < 2 || last <= first {
        return None;
    }
    Some((crossings - 1) as f64 * sample_rate as f64 / (last - first))
}
