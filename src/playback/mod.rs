//! Playback session control

pub mod backends;
pub mod engine;
pub mod session;

pub use engine::{AudioEngine, CompletionNotifier, PlayableStream, PlaybackEvent, SessionId};
pub use session::{PlaybackController, PlaybackState};

use log::info;

/// Create the output engine for this host
///
/// The device itself is acquired lazily on the first `play`, so this
/// never fails; an unusable device surfaces as `PlaybackUnavailable`.
pub fn create_engine(device_name: &str) -> Box<dyn AudioEngine> {
    info!("Using cpal output engine (device: {})", device_name);
    Box::new(backends::cpal::CpalEngine::new(device_name))
}
