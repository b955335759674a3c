//! Speech pipeline
//!
//! One generated payload is decoded once; the same samples feed both the
//! downloadable WAV file and the playable sample buffer. Nothing is
//! returned unless every stage succeeded. The WAV of the last successful
//! decode stays available even when playing it fails.

use super::source::SpeechSource;
use crate::audio::{self, AudioFormat, SampleBuffer, WavFile};
use crate::playback::{PlaybackController, SessionId};
use crate::state::Config;
use crate::{Result, SpeakwaveError};
use log::{debug, info};
use std::time::Duration;

/// Sentence spoken when previewing the selected voice and tone
pub const PREVIEW_TEXT: &str = "こんにちは。こちらはAOC音声合成スタジオです。";

/// Both renditions of one decoded payload
#[derive(Debug, Clone)]
pub struct ProcessedAudio {
    /// Downloadable container
    pub wav: WavFile,
    /// Samples for the playback engine
    pub buffer: SampleBuffer,
}

/// Requests speech, decodes it, and plays it through a single-stream controller
pub struct Speaker<S: SpeechSource> {
    source: S,
    controller: PlaybackController,
    format: AudioFormat,
    voice: String,
    tone: String,

    /// Download from the most recent successful generation
    last_wav: Option<WavFile>,
}

impl<S: SpeechSource> Speaker<S> {
    pub fn new(source: S, controller: PlaybackController, format: AudioFormat) -> Self {
        Self {
            source,
            controller,
            format,
            voice: crate::state::config::DEFAULT_VOICE.to_string(),
            tone: String::new(),
            last_wav: None,
        }
    }

    /// Build a speaker with format, voice and tone taken from `config`
    pub fn from_config(source: S, controller: PlaybackController, config: &Config) -> Self {
        let mut speaker = Self::new(source, controller, config.audio_format());
        speaker.set_voice(&config.voice(), &config.tone());
        speaker
    }

    pub fn set_voice(&mut self, voice: &str, tone: &str) {
        debug!("Voice set to {} (tone {:?})", voice, tone);
        self.voice = voice.to_string();
        self.tone = tone.to_string();
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut PlaybackController {
        &mut self.controller
    }

    /// WAV file of the last successful generation, if any
    ///
    /// Cleared when a new request starts, so it never belongs to an
    /// earlier text than the one last requested.
    pub fn last_wav(&self) -> Option<&WavFile> {
        self.last_wav.as_ref()
    }

    /// Decode a base64 payload into a WAV file and a sample buffer
    pub fn process_payload(&self, payload: &str) -> Result<ProcessedAudio> {
        let bytes = audio::base64::decode(payload)?;
        let samples = audio::to_samples(&bytes)?;

        let buffer = audio::from_samples(&samples, self.format)?;
        let wav = audio::to_wav(&samples, self.format)?;

        debug!(
            "Processed payload: {} bytes, {} frames",
            bytes.len(),
            buffer.frames()
        );
        Ok(ProcessedAudio { wav, buffer })
    }

    /// Request speech for `text` and decode it without playing
    pub fn generate(&mut self, text: &str) -> Result<ProcessedAudio> {
        self.last_wav = None;

        let payload = self
            .source
            .request_speech(text, &self.voice, &self.tone)
            .map_err(SpeakwaveError::Generation)?;

        let audio = self.process_payload(&payload)?;
        self.last_wav = Some(audio.wav.clone());
        Ok(audio)
    }

    /// Request, decode and play speech for `text`
    ///
    /// Returns the WAV file for download once playback has started. If
    /// decoding succeeded but playback failed, the WAV is still available
    /// from `last_wav`.
    pub fn speak(&mut self, text: &str) -> Result<WavFile> {
        let audio = self.generate(text)?;
        let id = self.play(audio.buffer)?;
        info!("Speaking {} chars as {}", text.chars().count(), id);
        Ok(audio.wav)
    }

    /// Speak a fixed sentence with the current voice and tone
    pub fn preview(&mut self) -> Result<WavFile> {
        debug!("Previewing voice {}", self.voice);
        self.speak(PREVIEW_TEXT)
    }

    /// Play an already decoded buffer, superseding current playback
    pub fn play(&mut self, buffer: SampleBuffer) -> Result<SessionId> {
        self.controller.play(buffer)
    }

    pub fn stop(&mut self) {
        self.controller.stop();
    }

    pub fn is_playing(&mut self) -> bool {
        self.controller.poll_events();
        self.controller.is_playing()
    }

    /// Block until playback completes or `timeout` elapses
    pub fn wait_until_idle(&mut self, timeout: Duration) -> bool {
        self.controller.wait_until_idle(timeout)
    }
}
