//! Error types for speakwave

use std::io;
use thiserror::Error;

/// Main error type for speakwave
#[derive(Error, Debug)]
pub enum SpeakwaveError {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Playback unavailable: {0}")]
    PlaybackUnavailable(String),

    /// Upstream speech generation failed; the cause is carried but never inspected.
    #[error("Speech generation failed")]
    Generation(#[source] anyhow::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("INI parse error: {0}")]
    IniParse(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for speakwave operations
pub type Result<T> = std::result::Result<T, SpeakwaveError>;

impl From<String> for SpeakwaveError {
    fn from(s: String) -> Self {
        SpeakwaveError::Other(s)
    }
}

impl From<&str> for SpeakwaveError {
    fn from(s: &str) -> Self {
        SpeakwaveError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for SpeakwaveError {
    fn from(e: serde_json::Error) -> Self {
        SpeakwaveError::Other(format!("JSON error: {}", e))
    }
}
