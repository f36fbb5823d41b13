//! Sine tone synthesis.
//!
//! The phase of sample `i` is `frequency * i / sample_rate` cycles. For long
//! buffers that product grows into the tens of billions, where an `f64` no
//! longer resolves a quantization step. The integer hertz are therefore
//! reduced modulo the sample rate with exact integer arithmetic, and only the
//! sub-hertz part goes through floating point.

use std::f64::consts::TAU;

use crate::error::{ToneError, ToneResult};
use crate::frequency::Frequency;

/// Full-scale magnitude of a 16-bit sample.
pub const FULL_SCALE: f64 = 32767.0;

/// Largest sample count whose 16-bit PCM payload fits a WAV data chunk.
pub const MAX_SAMPLES: u64 = (u32::MAX as u64 - 36) / 2;

/// Highest sample rate whose 16-bit byte rate fits the WAV header.
pub const MAX_SAMPLE_RATE: u32 = u32::MAX / 2;

/// Everything needed to synthesize one tone.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneSpec {
    frequency: Frequency,
    sample_rate: u32,
    duration: f64,
    amplitude: f64,
}

impl ToneSpec {
    /// Creates a validated tone spec.
    ///
    /// # Errors
    /// * [`ToneError::InvalidAmplitude`] if `amplitude` is outside [0, 1] or NaN
    /// * [`ToneError::InvalidToneSpec`] if the sample rate is zero, the duration is
    ///   not a positive finite number, the sample rate or sample count does not fit
    ///   a WAV file, or the tone would have no samples
    pub fn new(
        frequency: Frequency,
        sample_rate: u32,
        duration: f64,
        amplitude: f64,
    ) -> ToneResult<Self> {
        if !(0.0..=1.0).contains(&amplitude) {
            return Err(ToneError::InvalidAmplitude { amplitude });
        }
        if sample_rate == 0 {
            return Err(ToneError::invalid_spec("sample rate must be positive"));
        }
        if sample_rate > MAX_SAMPLE_RATE {
            return Err(ToneError::invalid_spec(format!(
                "sample rate {} Hz exceeds the WAV limit of {} Hz",
                sample_rate, MAX_SAMPLE_RATE
            )));
        }
        if !duration.is_finite() || duration <= 0.0 {
            return Err(ToneError::invalid_spec(format!(
                "duration must be a positive number of seconds, got {}",
                duration
            )));
        }

        let count = (sample_rate as f64 * duration).round();
        if count < 1.0 {
            return Err(ToneError::invalid_spec(format!(
                "{} s at {} Hz produces no samples",
                duration, sample_rate
            )));
        }
        if count > MAX_SAMPLES as f64 {
            return Err(ToneError::invalid_spec(format!(
                "{} samples exceed the WAV size limit of {}",
                count, MAX_SAMPLES
            )));
        }

        Ok(Self {
            frequency,
            sample_rate,
            duration,
            amplitude: amplitude.clamp(0.0, 1.0),
        })
    }

    /// Tone frequency.
    pub fn frequency(&self) -> &Frequency {
        &self.frequency
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Amplitude in [0, 1].
    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    /// Number of samples: `round(sample_rate * duration)`.
    pub fn sample_count(&self) -> usize {
        (self.sample_rate as f64 * self.duration).round() as usize
    }

    /// Whether the frequency is at or above the Nyquist limit.
    pub fn exceeds_nyquist(&self) -> bool {
        self.frequency.to_f64() >= self.sample_rate as f64 / 2.0
    }
}

/// Quantized mono 16-bit samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBuffer {
    samples: Vec<i16>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Wraps existing samples.
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// The samples in generation order.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Consumes the buffer, returning the samples.
    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }
}

/// Synthesizes the tone described by `spec`.
///
/// `sample[i] = round(amplitude * 32767 * sin(2π * frequency * i / sample_rate))`
pub fn synthesize(spec: &ToneSpec) -> SampleBuffer {
    let count = spec.sample_count();
    let rate = spec.sample_rate as u128;
    let rate_f = spec.sample_rate as f64;
    let integer_hz = (spec.frequency.integer_part() as u128) % rate;
    let fraction_hz = spec.frequency.fractional_part_f64();
    let scale = spec.amplitude * FULL_SCALE;

    let mut samples = Vec::with_capacity(count);
    for i in 0..count {
        // i = seconds * rate + offset
        let seconds = i as u128 / rate;
        let offset = i as u128 % rate;
        // Whole hertz contribute (integer_hz * offset / rate) cycles mod 1, exactly.
        let whole = (integer_hz * offset) % rate;
        let sub = fraction_hz * offset as f64 / rate_f + (fraction_hz * seconds as f64).fract();

        let cycles = (whole as f64 / rate_f + sub).fract();
        let value = (scale * (TAU * cycles).sin()).round();
        samples.push(value.clamp(-FULL_SCALE, FULL_SCALE) as i16);
    }

    SampleBuffer::new(samples, spec.sample_rate)
}

/// Validates the inputs and synthesizes the tone in one step.
pub fn generate_tone(
    frequency: Frequency,
    sample_rate: u32,
    duration: f64,
    amplitude: f64,
) -> ToneResult<SampleBuffer> {
    let spec = ToneSpec::new(frequency, sample_rate, duration, amplitude)?;
    Ok(synthesize(&spec))
}
