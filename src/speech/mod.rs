//! Speech generation boundary and the decode/playback pipeline

pub mod source;
pub mod speaker;

pub use source::{PayloadFile, SpeechSource};
pub use speaker::{ProcessedAudio, Speaker, PREVIEW_TEXT};
