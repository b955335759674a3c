//! 16-bit PCM sample interpretation
//!
//! Raw payload bytes are consecutive signed 16-bit little-endian samples.
//! Playback engines consume normalized `f32` samples, so each integer is
//! scaled by `1 / 32768` with no clipping, rounding, or offset.

use super::format::{AudioFormat, BYTES_PER_SAMPLE};
use crate::{Result, SpeakwaveError};
use log::debug;
use std::time::Duration;

/// Divisor mapping the full i16 range onto [-1.0, 1.0)
const I16_SCALE: f32 = 32768.0;

/// Decoded samples ready for a playback engine
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    /// Format of the interleaved samples
    pub format: AudioFormat,
    /// Normalized samples, interleaved by channel
    pub samples: Vec<f32>,
}

impl SampleBuffer {
    /// Number of sample frames (one sample per channel)
    pub fn frames(&self) -> usize {
        self.samples
            .len()
            .checked_div(self.format.channels as usize)
            .unwrap_or(0)
    }

    /// Playback length at the buffer's sample rate
    ///
    /// Zero when the sample rate is zero.
    pub fn duration(&self) -> Duration {
        if self.format.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.format.sample_rate as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Scale one 16-bit sample to the engine's float range
#[inline]
pub fn normalize(sample: i16) -> f32 {
    sample as f32 / I16_SCALE
}

/// Interpret raw bytes as signed 16-bit little-endian samples
///
/// Odd-length input is malformed and rejected rather than truncated.
pub fn to_samples(bytes: &[u8]) -> Result<Vec<i16>> {
    if bytes.len() % BYTES_PER_SAMPLE as usize != 0 {
        return Err(SpeakwaveError::Format(format!(
            "PCM byte length {} is not a multiple of {}",
            bytes.len(),
            BYTES_PER_SAMPLE
        )));
    }

    Ok(bytes
        .chunks_exact(BYTES_PER_SAMPLE as usize)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

/// Build a playable sample buffer from raw payload bytes
pub fn to_sample_buffer(bytes: &[u8], format: AudioFormat) -> Result<SampleBuffer> {
    format.validate()?;
    let samples = to_samples(bytes)?;
    from_samples(&samples, format)
}

/// Build a playable sample buffer from already interpreted samples
pub fn from_samples(samples: &[i16], format: AudioFormat) -> Result<SampleBuffer> {
    format.validate()?;

    if samples.len() % format.channels as usize != 0 {
        return Err(SpeakwaveError::Format(format!(
            "{} samples cannot be split evenly across {} channels",
            samples.len(),
            format.channels
        )));
    }

    debug!(
        "Normalizing {} samples ({} Hz, {} ch)",
        samples.len(),
        format.sample_rate,
        format.channels
    );

    Ok(SampleBuffer {
        format,
        samples: samples.iter().copied().map(normalize).collect(),
    })
}
