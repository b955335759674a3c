//! Audio codec: base64 payloads to PCM samples and WAV files

pub mod base64;
pub mod format;
pub mod pcm;
pub mod wav;

pub use format::AudioFormat;
pub use pcm::{from_samples, to_sample_buffer, to_samples, SampleBuffer};
pub use wav::{to_wav, WavFile, WavHeader};
