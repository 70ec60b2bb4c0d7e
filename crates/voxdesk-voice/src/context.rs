//! Explicit per-user session context.
//!
//! A [`SessionContext`] is created when the user submits their display name
//! and is passed by reference to every operation that needs the identity.
//! There is no process-wide store: dropping or [`SessionContext::logout`]-ing
//! the context is the end of that user's session boundary.

use crate::error::VoiceError;
use chrono::Utc;
use std::fmt;
use tracing::info;
use uuid::Uuid;
use voxdesk_types::VoiceSettings;

/// Maximum length of a display identity, in characters.
pub const MAX_IDENTITY_CHARS: usize = 128;

/// A validated, user-supplied display identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    /// Trims and validates a raw identity string.
    pub fn parse(raw: &str) -> Result<Self, VoiceError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(VoiceError::Validation("Please enter your name".to_string()));
        }
        if trimmed.chars().count() > MAX_IDENTITY_CHARS {
            return Err(VoiceError::Validation(format!(
                "Name must be at most {} characters",
                MAX_IDENTITY_CHARS
            )));
        }
        if trimmed.chars().any(char::is_control) {
            return Err(VoiceError::Validation(
                "Name must not contain control characters".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of a single live voice room.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomName(String);

impl RoomName {
    /// Generates a fresh room name: `voice-<unix millis>-<8 hex chars>`.
    ///
    /// The random suffix keeps two attempts started in the same millisecond
    /// apart.
    pub fn generate() -> Self {
        let millis = Utc::now().timestamp_millis();
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("voice-{}-{}", millis, &suffix[..8]))
    }

    /// Wraps an existing room name.
    pub fn new(name: impl Into<String>) -> Result<Self, VoiceError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(VoiceError::Validation("room name must not be empty".to_string()));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The signed-in user's context for starting voice sessions.
#[derive(Debug, Clone)]
pub struct SessionContext {
    identity: Identity,
    voice: Option<VoiceSettings>,
}

impl SessionContext {
    /// Opens a context for `identity`, validating it locally.
    pub fn login(identity: &str) -> Result<Self, VoiceError> {
        let identity = Identity::parse(identity)?;
        info!(identity = %identity, "session context opened");
        Ok(Self {
            identity,
            voice: None,
        })
    }

    /// Attaches the selected agent's voice settings.
    pub fn with_voice(mut self, voice: VoiceSettings) -> Self {
        self.voice = Some(voice);
        self
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn voice(&self) -> Option<&VoiceSettings> {
        self.voice.as_ref()
    }

    /// Closes the context.
    pub fn logout(self) {
        info!(identity = %self.identity, "session context closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_trimmed() {
        let identity = Identity::parse("  Ada  ").unwrap();
        assert_eq!(identity.as_str(), "Ada");
    }

    #[test]
    fn empty_identity_is_a_validation_error() {
        assert!(matches!(Identity::parse("   "), Err(VoiceError::Validation(_))));
        assert!(matches!(
            SessionContext::login(""),
            Err(VoiceError::Validation(_))
        ));
    }

    #[test]
    fn overlong_identity_is_rejected() {
        let raw = "a".repeat(MAX_IDENTITY_CHARS + 1);
        assert!(matches!(Identity::parse(&raw), Err(VoiceError::Validation(_))));
        assert!(Identity::parse(&"a".repeat(MAX_IDENTITY_CHARS)).is_ok());
    }

    #[test]
    fn control_characters_are_rejected() {
        assert!(Identity::parse("Ada\nLovelace").is_err());
    }

    #[test]
    fn generated_room_names_are_unique() {
        let a = RoomName::generate();
        let b = RoomName::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("voice-"));
        assert_eq!(a.as_str().rsplit('-').next().unwrap().len(), 8);
    }

    #[test]
    fn context_carries_voice_settings() {
        let voice = VoiceSettings {
            tts_voice: "alloy".to_string(),
            speaking_rate: 1.25,
        };
        let ctx = SessionContext::login("Ada").unwrap().with_voice(voice.clone());
        assert_eq!(ctx.identity().as_str(), "Ada");
        assert_eq!(ctx.voice(), Some(&voice));
        ctx.logout();
    }
}
