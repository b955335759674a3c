//! Speech generator boundary
//!
//! The network client that turns text into audio lives outside this
//! crate. It hands back either a base64 payload of 16-bit PCM or an
//! opaque failure.

use anyhow::Context;
use log::debug;
use std::io::Read;
use std::path::PathBuf;

/// Producer of base64-encoded speech audio
pub trait SpeechSource {
    /// Synthesize `text` with `voice`, prefixed by the tone instruction
    fn request_speech(&mut self, text: &str, voice: &str, tone_prefix: &str)
        -> anyhow::Result<String>;
}

impl<F> SpeechSource for F
where
    F: FnMut(&str, &str, &str) -> anyhow::Result<String>,
{
    fn request_speech(
        &mut self,
        text: &str,
        voice: &str,
        tone_prefix: &str,
    ) -> anyhow::Result<String> {
        self(text, voice, tone_prefix)
    }
}

/// Payload produced earlier and saved to a file, or piped on stdin
///
/// Text, voice and tone are ignored; every request returns the saved payload.
#[derive(Debug, Clone)]
pub enum PayloadFile {
    Stdin,
    Path(PathBuf),
}

impl PayloadFile {
    /// `-` selects stdin
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            PayloadFile::Stdin
        } else {
            PayloadFile::Path(PathBuf::from(arg))
        }
    }
}

impl SpeechSource for PayloadFile {
    fn request_speech(
        &mut self,
        _text: &str,
        _voice: &str,
        _tone_prefix: &str,
    ) -> anyhow::Result<String> {
        let payload = match self {
            PayloadFile::Stdin => {
                let mut payload = String::new();
                std::io::stdin()
                    .read_to_string(&mut payload)
                    .context("reading payload from stdin")?;
                payload
            }
            PayloadFile::Path(path) => std::fs::read_to_string(&*path)
                .with_context(|| format!("reading payload from {}", path.display()))?,
        };

        debug!("Loaded payload of {} chars", payload.len());
        Ok(payload)
    }
}
