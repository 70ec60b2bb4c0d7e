//! Shared types for the voxdesk platform.
//!
//! This crate holds the serde-serialisable shapes exchanged between the admin
//! console, the backend API and the voice session core: agent configuration
//! records, voice settings, session transcripts and the provider settings
//! catalogue.
//!
//! Nothing here performs I/O. Validation is explicit via the `validate`
//! methods and reports a [`ValidationError`].

pub mod agent;
pub mod session;
pub mod settings;
pub mod voice;

pub use agent::{
    AgentConfig, Capabilities, ModelParams, ModelSettings, RagConfig, WeatherConfig, WeatherUnits,
    WebSearchConfig,
};
pub use session::{MessageRole, SessionPage, SessionRecord, SessionStatus, TranscriptMessage};
pub use settings::{
    LlmProvider, Provider, ProviderCategory, ProviderInfo, ProviderSelection, SearchProvider,
    SettingsCatalog, SttProvider, TtsProvider,
};
pub use voice::VoiceSettings;

use thiserror::Error;

/// A record field failed validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} is too long (max {max} characters)")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: String,
        min: String,
        max: String,
    },

    #[error("invalid {kind} '{value}', must be one of: {}", .expected.join(", "))]
    Unknown {
        kind: &'static str,
        value: String,
        expected: Vec<&'static str>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_value_lists_expected_choices() {
        let err = ValidationError::Unknown {
            kind: "STT provider",
            value: "acme".to_string(),
            expected: vec!["openai", "deepgram"],
        };
        assert_eq!(
            err.to_string(),
            "invalid STT provider 'acme', must be one of: openai, deepgram"
        );
    }

    #[test]
    fn out_of_range_message() {
        let err = ValidationError::OutOfRange {
            field: "top_k",
            value: "0".to_string(),
            min: "1".to_string(),
            max: "20".to_string(),
        };
        assert_eq!(err.to_string(), "top_k must be between 1 and 20, got 0");
    }
}
