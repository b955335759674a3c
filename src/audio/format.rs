//! Audio format parameters

use crate::{Result, SpeakwaveError};
use serde::{Deserialize, Serialize};

/// Bytes per 16-bit PCM sample
pub const BYTES_PER_SAMPLE: u16 = 2;

/// Bits per 16-bit PCM sample
pub const BITS_PER_SAMPLE: u16 = 16;

/// Sample rate and channel layout of a 16-bit PCM stream
///
/// Supplied by configuration; the codec never assumes particular values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    /// Samples per second per channel
    pub sample_rate: u32,
    /// Interleaved channel count
    pub channels: u16,
}

impl AudioFormat {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Reject zero sample rates and channel counts, and formats whose
    /// byte rate or block alignment do not fit their header fields
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(SpeakwaveError::Format(
                "sample rate must be positive".to_string(),
            ));
        }
        if self.channels == 0 {
            return Err(SpeakwaveError::Format(
                "channel count must be positive".to_string(),
            ));
        }
        if self.checked_block_align().is_none() {
            return Err(SpeakwaveError::Format(format!(
                "{} channels overflow the block alignment field",
                self.channels
            )));
        }
        if self.checked_byte_rate().is_none() {
            return Err(SpeakwaveError::Format(format!(
                "{} Hz x {} channels overflows the byte rate field",
                self.sample_rate, self.channels
            )));
        }
        Ok(())
    }

    fn checked_byte_rate(&self) -> Option<u32> {
        self.sample_rate
            .checked_mul(self.channels as u32)?
            .checked_mul(BYTES_PER_SAMPLE as u32)
    }

    fn checked_block_align(&self) -> Option<u16> {
        self.channels.checked_mul(BYTES_PER_SAMPLE)
    }

    /// Bytes per second of audio
    ///
    /// Saturates for formats that fail `validate`.
    pub fn byte_rate(&self) -> u32 {
        self.checked_byte_rate().unwrap_or(u32::MAX)
    }

    /// Bytes per sample frame
    ///
    /// Saturates for formats that fail `validate`.
    pub fn block_align(&self) -> u16 {
        self.checked_block_align().unwrap_or(u16::MAX)
    }
}
