//! Playback engine backends

// Host audio output via cpal
pub mod cpal;

// Headless engine for dry runs and tests
pub mod manual;
