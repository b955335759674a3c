//! Base64 payload decoding
//!
//! Speech generators return audio as standard-alphabet base64 text.
//! Padding is optional and ASCII whitespace from wrapped payloads is
//! ignored; any other character outside the alphabet is rejected.

use crate::{Result, SpeakwaveError};
use ::base64::alphabet;
use ::base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use ::base64::engine::DecodePaddingMode;
use ::base64::Engine as _;
use log::debug;
use std::borrow::Cow;

/// Standard alphabet, padding accepted but not required
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode a base64 payload into raw audio bytes
pub fn decode(text: &str) -> Result<Vec<u8>> {
    let compact = strip_whitespace(text);

    let bytes = PAYLOAD_ENGINE
        .decode(compact.as_bytes())
        .map_err(|e| SpeakwaveError::Decode(format!("Invalid base64 payload: {}", e)))?;

    debug!(
        "Decoded {} base64 chars into {} bytes",
        compact.len(),
        bytes.len()
    );
    Ok(bytes)
}

fn strip_whitespace(text: &str) -> Cow<'_, str> {
    if text.bytes().any(|b| b.is_ascii_whitespace()) {
        Cow::Owned(text.chars().filter(|c| !c.is_ascii_whitespace()).collect())
    } else {
        Cow::Borrowed(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_padded() {
        assert_eq!(decode("AQI=").unwrap(), vec![0x01, 0x02]);
        assert_eq!(
            decode("AID/fwAAAQA=").unwrap(),
            vec![0x00, 0x80, 0xFF, 0x7F, 0x00, 0x00, 0x01, 0x00]
        );
    }

    #[test]
    fn test_decode_unpadded() {
        assert_eq!(decode("AQI").unwrap(), vec![0x01, 0x02]);
        assert_eq!(decode("AQID").unwrap(), vec![0x01, 0x02, 0x03]);
    }

    #[test]
    fn test_decode_empty() {
        assert!(decode("").unwrap().is_empty());
    }

    #[test]
    fn test_decode_ignores_line_breaks() {
        assert_eq!(
            decode("AID/\nfwAA\r\nAQA=").unwrap(),
            vec![0x00, 0x80, 0xFF, 0x7F, 0x00, 0x00, 0x01, 0x00]
        );
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(matches!(decode("AQ*D"), Err(SpeakwaveError::Decode(_))));
        // URL-safe alphabet is not accepted
        assert!(matches!(decode("AID_fwAAAQA="), Err(SpeakwaveError::Decode(_))));
        // A single trailing symbol cannot encode a whole byte
        assert!(matches!(decode("AQIDB"), Err(SpeakwaveError::Decode(_))));
    }
}
