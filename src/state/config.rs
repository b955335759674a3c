//! Configuration management

use crate::audio::AudioFormat;
use crate::playback::backends::cpal::DEFAULT_DEVICE;
use crate::{Result, SpeakwaveError};
use ini::Ini;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// Sample rate of generated speech
pub const DEFAULT_SAMPLE_RATE: u32 = 24000;

/// Generated speech is mono
pub const DEFAULT_CHANNELS: u16 = 1;

/// Base name of the downloadable WAV file
pub const DEFAULT_FILE_NAME: &str = "speech";

/// Voice requested from the speech generator
pub const DEFAULT_VOICE: &str = "Kore";

/// Application configuration
///
/// Audio format, output naming, speech request parameters, and the
/// playback device, persisted as INI.
pub struct Config {
    /// INI configuration storage
    ini: Ini,

    /// Config file path (~/.speakwave.cfg)
    path: PathBuf,
}

impl Config {
    /// Load configuration from ~/.speakwave.cfg or create the default
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from `path`, writing defaults if it does not exist
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        debug!("Loading config from {:?}", path);

        let ini = if path.exists() {
            Ini::load_from_file(&path)
                .map_err(|e| SpeakwaveError::IniParse(format!("Failed to load config: {}", e)))?
        } else {
            info!("Config file not found, creating default");
            let default = Self::default_config();
            default
                .write_to_file(&path)
                .map_err(|e| SpeakwaveError::IniParse(format!("Failed to write config: {}", e)))?;
            default
        };

        Ok(Self { ini, path })
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        debug!("Saving config to {:?}", self.path);
        self.ini
            .write_to_file(&self.path)
            .map_err(|e| SpeakwaveError::Config(format!("Failed to save config: {}", e)))
    }

    /// Get config file path (~/.speakwave.cfg)
    fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".speakwave.cfg")
    }

    /// Expose the config file path for display
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Create default configuration
    fn default_config() -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some("audio"))
            .set("sample_rate", DEFAULT_SAMPLE_RATE.to_string())
            .set("channels", DEFAULT_CHANNELS.to_string());

        ini.with_section(Some("output"))
            .set("file_name", DEFAULT_FILE_NAME)
            .set("directory", ".");

        ini.with_section(Some("speech"))
            .set("voice", DEFAULT_VOICE)
            .set("tone", "");

        ini.with_section(Some("playback"))
            .set("enabled", "true")
            .set("device", DEFAULT_DEVICE);

        ini
    }

    /// Get a boolean value from config
    pub fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get a string value from config
    pub fn get_string(&self, section: &str, key: &str, default: &str) -> String {
        self.ini
            .get_from(Some(section), key)
            .unwrap_or(default)
            .to_string()
    }

    /// Get an integer value from config
    pub fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Set a value in config
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.ini.with_section(Some(section)).set(key, value);
    }

    /// PCM format of generated speech
    ///
    /// Non-positive or out-of-range values fall back to 24000 Hz mono.
    pub fn audio_format(&self) -> AudioFormat {
        let sample_rate = u32::try_from(self.get_int("audio", "sample_rate", -1))
            .ok()
            .filter(|&r| r > 0)
            .unwrap_or_else(|| {
                warn!("Invalid audio.sample_rate, using {}", DEFAULT_SAMPLE_RATE);
                DEFAULT_SAMPLE_RATE
            });

        let channels = u16::try_from(self.get_int("audio", "channels", -1))
            .ok()
            .filter(|&c| c > 0)
            .unwrap_or_else(|| {
                warn!("Invalid audio.channels, using {}", DEFAULT_CHANNELS);
                DEFAULT_CHANNELS
            });

        let format = AudioFormat::new(sample_rate, channels);
        match format.validate() {
            Ok(()) => format,
            Err(e) => {
                warn!("Unusable audio format ({}), using defaults", e);
                AudioFormat::new(DEFAULT_SAMPLE_RATE, DEFAULT_CHANNELS)
            }
        }
    }

    /// Base name for the WAV download
    pub fn file_name(&self) -> String {
        let name = self.get_string("output", "file_name", DEFAULT_FILE_NAME);
        if name.trim().is_empty() {
            DEFAULT_FILE_NAME.to_string()
        } else {
            name
        }
    }

    /// Directory WAV files are written to
    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(self.get_string("output", "directory", "."))
    }

    /// Voice name passed to the speech generator
    pub fn voice(&self) -> String {
        self.get_string("speech", "voice", DEFAULT_VOICE)
    }

    /// Instruction prefixed to the text, e.g. "Say calmly: "
    ///
    /// INI values lose surrounding whitespace on load, so a non-empty
    /// prefix always ends with a single space separating it from the text.
    pub fn tone(&self) -> String {
        let tone = self.get_string("speech", "tone", "");
        let tone = tone.trim();
        if tone.is_empty() {
            String::new()
        } else {
            format!("{} ", tone)
        }
    }

    /// Should generated audio be played?
    pub fn playback_enabled(&self) -> bool {
        self.get_bool("playback", "enabled", true)
    }

    /// Output device name, or `Default`
    pub fn device(&self) -> String {
        self.get_string("playback", "device", DEFAULT_DEVICE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config() -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(dir.path().join("speakwave.cfg")).unwrap();
        (dir, config)
    }

    #[test]
    fn test_defaults() {
        let (_dir, config) = temp_config();
        assert_eq!(config.audio_format(), AudioFormat::new(24000, 1));
        assert_eq!(config.file_name(), "speech");
        assert_eq!(config.voice(), "Kore");
        assert_eq!(config.tone(), "");
        assert!(config.playback_enabled());
        assert_eq!(config.device(), "Default");
    }

    #[test]
    fn test_invalid_format_falls_back() {
        let (_dir, mut config) = temp_config();
        config.set("audio", "sample_rate", "0");
        config.set("audio", "channels", "70000");
        assert_eq!(config.audio_format(), AudioFormat::new(24000, 1));

        config.set("audio", "sample_rate", "fast");
        assert_eq!(config.audio_format().sample_rate, 24000);
    }

    #[test]
    fn test_oversized_format_falls_back() {
        let (_dir, mut config) = temp_config();
        config.set("audio", "sample_rate", "4294967295");
        assert_eq!(config.audio_format(), AudioFormat::new(24000, 1));

        config.set("audio", "sample_rate", "24000");
        config.set("audio", "channels", "40000");
        assert_eq!(config.audio_format(), AudioFormat::new(24000, 1));
    }

    #[test]
    fn test_tone_keeps_separator() {
        let (_dir, mut config) = temp_config();
        config.set("speech", "tone", "Say cheerfully:");
        assert_eq!(config.tone(), "Say cheerfully: ");

        config.set("speech", "tone", "  Whisper:   ");
        assert_eq!(config.tone(), "Whisper: ");

        config.set("speech", "tone", "   ");
        assert_eq!(config.tone(), "");
    }

    #[test]
    fn test_blank_file_name() {
        let (_dir, mut config) = temp_config();
        config.set("output", "file_name", "  ");
        assert_eq!(config.file_name(), "speech");
    }
}
