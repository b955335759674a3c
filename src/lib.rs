//! speakwave - synthesized speech decoding and playback
//!
//! Turns base64-encoded 16-bit PCM payloads from a speech generator into
//! a playable sample buffer and a standalone WAV file, and keeps at most
//! one stream audible at a time.

pub mod audio;
pub mod error;
pub mod playback;
pub mod speech;
pub mod state;

pub use error::{Result, SpeakwaveError};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "speakwave";
