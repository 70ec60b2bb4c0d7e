//! Voice output settings for an agent.
//!
//! `VoiceSettings` is the only part of an agent record the voice session
//! core reads: it is forwarded to the media room when a session starts so
//! the agent worker speaks with the configured voice and rate.

use crate::ValidationError;
use serde::{Deserialize, Serialize};

/// Slowest accepted speaking rate multiplier.
pub const MIN_SPEAKING_RATE: f32 = 0.5;

/// Fastest accepted speaking rate multiplier.
pub const MAX_SPEAKING_RATE: f32 = 2.0;

fn default_tts_voice() -> String {
    "aura-asteria-en".to_string()
}

fn default_speaking_rate() -> f32 {
    1.0
}

/// TTS configuration attached to an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    /// Provider-specific voice identifier (e.g. `aura-asteria-en`, `alloy`).
    #[serde(default = "default_tts_voice")]
    pub tts_voice: String,
    /// Speech speed multiplier (1.0 is normal).
    #[serde(default = "default_speaking_rate")]
    pub speaking_rate: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            tts_voice: default_tts_voice(),
            speaking_rate: default_speaking_rate(),
        }
    }
}

impl VoiceSettings {
    /// Checks the voice identifier and the speaking rate bounds.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.tts_voice.trim().is_empty() {
            return Err(ValidationError::Empty("tts_voice"));
        }
        if !(MIN_SPEAKING_RATE..=MAX_SPEAKING_RATE).contains(&self.speaking_rate) {
            return Err(ValidationError::OutOfRange {
                field: "speaking_rate",
                value: self.speaking_rate.to_string(),
                min: MIN_SPEAKING_RATE.to_string(),
                max: MAX_SPEAKING_RATE.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = VoiceSettings::default();
        assert_eq!(settings.tts_voice, "aura-asteria-en");
        assert_eq!(settings.speaking_rate, 1.0);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: VoiceSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, VoiceSettings::default());
    }

    #[test]
    fn speaking_rate_bounds_are_inclusive() {
        let mut settings = VoiceSettings::default();
        settings.speaking_rate = 0.5;
        assert!(settings.validate().is_ok());
        settings.speaking_rate = 2.0;
        assert!(settings.validate().is_ok());
        settings.speaking_rate = 2.1;
        assert!(matches!(
            settings.validate(),
            Err(ValidationError::OutOfRange { field: "speaking_rate", .. })
        ));
    }

    #[test]
    fn blank_voice_is_rejected() {
        let settings = VoiceSettings {
            tts_voice: "  ".to_string(),
            speaking_rate: 1.0,
        };
        assert_eq!(settings.validate(), Err(ValidationError::Empty("tts_voice")));
    }
}
