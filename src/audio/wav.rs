//! Canonical RIFF/WAVE container encoding
//!
//! Produces the 44-byte header form (`RIFF`, a 16-byte PCM `fmt ` chunk,
//! `data`) followed by the samples as little-endian 16-bit integers,
//! unmodified. Output depends only on the inputs.

use super::format::{AudioFormat, BITS_PER_SAMPLE};
use crate::{Result, SpeakwaveError};
use log::debug;
use serde::Serialize;
use std::io::{self, Write};

/// Size of the canonical header preceding the sample data
pub const HEADER_LEN: usize = 44;

/// Bytes of the RIFF chunk counted in ChunkSize besides the data itself
const RIFF_OVERHEAD: u32 = 36;

/// `fmt ` sub-chunk size for plain PCM
const FMT_CHUNK_LEN: u32 = 16;

/// WAVE format code for integer PCM
const FORMAT_PCM: u16 = 1;

/// File extension used for downloads
pub const EXTENSION: &str = "wav";

/// A complete, self-describing WAV file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavFile {
    bytes: Vec<u8>,
}

impl WavFile {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Raw PCM bytes of the data sub-chunk
    pub fn data(&self) -> &[u8] {
        &self.bytes[HEADER_LEN..]
    }

    /// Header fields as written
    pub fn header(&self) -> WavHeader {
        // Always present: the file was built with a canonical header
        WavHeader::read(&self.bytes[..HEADER_LEN])
    }
}

/// Fields of a canonical 44-byte WAV header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WavHeader {
    pub chunk_size: u32,
    pub audio_format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_size: u32,
}

impl WavHeader {
    /// Parse a canonical header from the start of `bytes`
    ///
    /// Returns `None` unless the chunk ids sit at their canonical offsets.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < HEADER_LEN {
            return None;
        }
        if &bytes[0..4] != b"RIFF"
            || &bytes[8..12] != b"WAVE"
            || &bytes[12..16] != b"fmt "
            || &bytes[36..40] != b"data"
        {
            return None;
        }
        Some(Self::read(bytes))
    }

    fn read(bytes: &[u8]) -> Self {
        let u16_at = |pos: usize| u16::from_le_bytes([bytes[pos], bytes[pos + 1]]);
        let u32_at = |pos: usize| {
            u32::from_le_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]])
        };

        Self {
            chunk_size: u32_at(4),
            audio_format: u16_at(20),
            channels: u16_at(22),
            sample_rate: u32_at(24),
            byte_rate: u32_at(28),
            block_align: u16_at(32),
            bits_per_sample: u16_at(34),
            data_size: u32_at(40),
        }
    }
}

/// Write a canonical WAV file around already-encoded PCM bytes
fn write_wav<W: Write>(writer: &mut W, format: &AudioFormat, pcm_data: &[u8]) -> io::Result<()> {
    let data_size = pcm_data.len() as u32;

    // RIFF header
    writer.write_all(b"RIFF")?;
    writer.write_all(&(RIFF_OVERHEAD + data_size).to_le_bytes())?;
    writer.write_all(b"WAVE")?;

    // fmt chunk
    writer.write_all(b"fmt ")?;
    writer.write_all(&FMT_CHUNK_LEN.to_le_bytes())?;
    writer.write_all(&FORMAT_PCM.to_le_bytes())?;
    writer.write_all(&format.channels.to_le_bytes())?;
    writer.write_all(&format.sample_rate.to_le_bytes())?;
    writer.write_all(&format.byte_rate().to_le_bytes())?;
    writer.write_all(&format.block_align().to_le_bytes())?;
    writer.write_all(&BITS_PER_SAMPLE.to_le_bytes())?;

    // data chunk
    writer.write_all(b"data")?;
    writer.write_all(&data_size.to_le_bytes())?;
    writer.write_all(pcm_data)?;

    Ok(())
}

/// Wrap 16-bit samples in a WAV container
pub fn to_wav(samples: &[i16], format: AudioFormat) -> Result<WavFile> {
    format.validate()?;

    if samples.len() % format.channels as usize != 0 {
        return Err(SpeakwaveError::Format(format!(
            "{} samples cannot be split evenly across {} channels",
            samples.len(),
            format.channels
        )));
    }

    let data_len = samples.len() * 2;
    if data_len > (u32::MAX - RIFF_OVERHEAD) as usize {
        return Err(SpeakwaveError::Format(format!(
            "{} bytes of PCM exceed the WAV size limit",
            data_len
        )));
    }

    let mut pcm = Vec::with_capacity(data_len);
    for sample in samples {
        pcm.extend_from_slice(&sample.to_le_bytes());
    }

    let mut bytes = Vec::with_capacity(HEADER_LEN + data_len);
    write_wav(&mut bytes, &format, &pcm)?;

    debug!("Encoded WAV: {} samples, {} bytes", samples.len(), bytes.len());
    Ok(WavFile { bytes })
}

/// Download name for a WAV file, adding the extension when missing
pub fn file_name(name: &str) -> String {
    let has_extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.eq_ignore_ascii_case(EXTENSION))
        .unwrap_or(false);

    if has_extension {
        name.to_string()
    } else {
        format!("{}.{}", name, EXTENSION)
    }
}
