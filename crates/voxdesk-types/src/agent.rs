//! Agent configuration record.
//!
//! An agent is the backend-configured persona a user talks to. The record is
//! produced and consumed by the admin console; the voice session core only
//! reads [`AgentConfig::voice_settings`] when a session starts.

use crate::settings::{LlmProvider, SearchProvider};
use crate::voice::VoiceSettings;
use crate::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use uuid::Uuid;

/// Maximum length of an agent name.
pub const MAX_AGENT_NAME_CHARS: usize = 100;

/// Maximum length of an agent description.
pub const MAX_AGENT_DESCRIPTION_CHARS: usize = 500;

const TEMPERATURE_RANGE: RangeInclusive<f32> = 0.0..=2.0;
const MAX_TOKENS_RANGE: RangeInclusive<u32> = 1..=8192;
const SEARCH_RESULTS_RANGE: RangeInclusive<u32> = 1..=20;
const CHUNK_SIZE_RANGE: RangeInclusive<u32> = 100..=4000;
const CHUNK_OVERLAP_RANGE: RangeInclusive<u32> = 0..=1000;
const TOP_K_RANGE: RangeInclusive<u32> = 1..=20;

fn check_range<T>(
    field: &'static str,
    value: T,
    range: RangeInclusive<T>,
) -> Result<(), ValidationError>
where
    T: PartialOrd + ToString,
{
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value: value.to_string(),
            min: range.start().to_string(),
            max: range.end().to_string(),
        })
    }
}

/// Generation parameters shared by every LLM provider family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    pub model_name: String,
    /// Sampling temperature in `[0, 2]`.
    pub temperature: f32,
    /// Upper bound on generated tokens per reply.
    pub max_tokens: u32,
}

/// LLM selection, tagged by provider family.
///
/// Serialised as `{"provider": "openai", "model_name": ..., ...}` so that a
/// model can never be paired with a provider that does not exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ModelSettings {
    OpenAi(ModelParams),
    OpenRouter(ModelParams),
    Groq(ModelParams),
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self::OpenAi(ModelParams {
            model_name: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 1024,
        })
    }
}

impl ModelSettings {
    pub fn provider(&self) -> LlmProvider {
        match self {
            Self::OpenAi(_) => LlmProvider::OpenAi,
            Self::OpenRouter(_) => LlmProvider::OpenRouter,
            Self::Groq(_) => LlmProvider::Groq,
        }
    }

    pub fn params(&self) -> &ModelParams {
        match self {
            Self::OpenAi(p) | Self::OpenRouter(p) | Self::Groq(p) => p,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let params = self.params();
        if params.model_name.trim().is_empty() {
            return Err(ValidationError::Empty("model_name"));
        }
        check_range("temperature", params.temperature, TEMPERATURE_RANGE)?;
        check_range("max_tokens", params.max_tokens, MAX_TOKENS_RANGE)
    }
}

/// Web search capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSearchConfig {
    pub enabled: bool,
    pub provider: SearchProvider,
    pub max_results: u32,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: SearchProvider::DuckDuckGo,
            max_results: 5,
        }
    }
}

/// Temperature units reported by the weather tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherUnits {
    #[default]
    Metric,
    Imperial,
}

/// Weather lookup capability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub enabled: bool,
    pub units: WeatherUnits,
}

/// Retrieval-augmented QA over the agent's uploaded documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub enabled: bool,
    pub collection_name: Option<String>,
    pub chunk_size: u32,
    pub chunk_overlap: u32,
    pub top_k: u32,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            collection_name: None,
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 5,
        }
    }
}

/// Capability toggles for an agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub web_search: WebSearchConfig,
    pub weather: WeatherConfig,
    pub rag: RagConfig,
    /// Keywords that route a user query to this agent in multi-agent mode.
    pub routing_keywords: Vec<String>,
    pub tools: Vec<String>,
}

impl Capabilities {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range(
            "web_search.max_results",
            self.web_search.max_results,
            SEARCH_RESULTS_RANGE,
        )?;
        check_range("rag.chunk_size", self.rag.chunk_size, CHUNK_SIZE_RANGE)?;
        check_range(
            "rag.chunk_overlap",
            self.rag.chunk_overlap,
            CHUNK_OVERLAP_RANGE,
        )?;
        check_range("rag.top_k", self.rag.top_k, TOP_K_RANGE)
    }
}

/// A configured agent as returned by the agents API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Free-text system instructions.
    pub system_prompt: String,
    #[serde(default)]
    pub model_settings: ModelSettings,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default)]
    pub voice_settings: VoiceSettings,
    pub is_active: bool,
    pub is_default: bool,
    #[serde(default)]
    pub document_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AgentConfig {
    /// Validates every nested section of the record.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::Empty("name"));
        }
        if self.name.chars().count() > MAX_AGENT_NAME_CHARS {
            return Err(ValidationError::TooLong {
                field: "name",
                max: MAX_AGENT_NAME_CHARS,
            });
        }
        if let Some(description) = &self.description {
            if description.chars().count() > MAX_AGENT_DESCRIPTION_CHARS {
                return Err(ValidationError::TooLong {
                    field: "description",
                    max: MAX_AGENT_DESCRIPTION_CHARS,
                });
            }
        }
        if self.system_prompt.trim().is_empty() {
            return Err(ValidationError::Empty("system_prompt"));
        }
        self.model_settings.validate()?;
        self.capabilities.validate()?;
        self.voice_settings.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_agent() -> AgentConfig {
        AgentConfig {
            id: Uuid::new_v4(),
            name: "Concierge".to_string(),
            description: Some("Front desk".to_string()),
            system_prompt: "You are a helpful concierge.".to_string(),
            model_settings: ModelSettings::default(),
            capabilities: Capabilities::default(),
            voice_settings: VoiceSettings::default(),
            is_active: true,
            is_default: false,
            document_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn model_settings_are_tagged_by_provider() {
        let settings = ModelSettings::Groq(ModelParams {
            model_name: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.3,
            max_tokens: 512,
        });
        let value = serde_json::to_value(&settings).unwrap();
        assert_eq!(value["provider"], "groq");
        assert_eq!(value["model_name"], "llama-3.3-70b-versatile");
        assert_eq!(settings.provider(), LlmProvider::Groq);
    }

    #[test]
    fn unknown_provider_tag_is_rejected() {
        let raw = json!({
            "provider": "acme",
            "model_name": "m",
            "temperature": 0.5,
            "max_tokens": 10
        });
        assert!(serde_json::from_value::<ModelSettings>(raw).is_err());
    }

    #[test]
    fn temperature_outside_range_fails_validation() {
        let settings = ModelSettings::OpenRouter(ModelParams {
            model_name: "anthropic/claude-3.5-sonnet".to_string(),
            temperature: 2.5,
            max_tokens: 100,
        });
        assert!(matches!(
            settings.validate(),
            Err(ValidationError::OutOfRange { field: "temperature", .. })
        ));
    }

    #[test]
    fn max_tokens_zero_fails_validation() {
        let mut settings = ModelSettings::default();
        if let ModelSettings::OpenAi(params) = &mut settings {
            params.max_tokens = 0;
        }
        assert!(matches!(
            settings.validate(),
            Err(ValidationError::OutOfRange { field: "max_tokens", .. })
        ));
    }

    #[test]
    fn capabilities_default_from_empty_object() {
        let caps: Capabilities = serde_json::from_str("{}").unwrap();
        assert_eq!(caps, Capabilities::default());
        assert_eq!(caps.rag.chunk_size, 1000);
        assert_eq!(caps.web_search.provider, SearchProvider::DuckDuckGo);
        assert!(caps.validate().is_ok());
    }

    #[test]
    fn rag_chunk_size_bounds() {
        let mut caps = Capabilities::default();
        caps.rag.chunk_size = 50;
        assert!(matches!(
            caps.validate(),
            Err(ValidationError::OutOfRange { field: "rag.chunk_size", .. })
        ));
    }

    #[test]
    fn agent_validation_checks_nested_sections() {
        let mut agent = sample_agent();
        assert!(agent.validate().is_ok());

        agent.voice_settings.speaking_rate = 3.0;
        assert!(agent.validate().is_err());

        let mut agent = sample_agent();
        agent.name = "x".repeat(MAX_AGENT_NAME_CHARS + 1);
        assert_eq!(
            agent.validate(),
            Err(ValidationError::TooLong {
                field: "name",
                max: MAX_AGENT_NAME_CHARS
            })
        );
    }

    #[test]
    fn agent_record_deserializes_with_defaults() {
        let raw = json!({
            "id": Uuid::nil(),
            "name": "Support",
            "description": null,
            "system_prompt": "Help users.",
            "is_active": true,
            "is_default": true,
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-02T00:00:00Z"
        });
        let agent: AgentConfig = serde_json::from_value(raw).unwrap();
        assert_eq!(agent.model_settings, ModelSettings::default());
        assert_eq!(agent.voice_settings, VoiceSettings::default());
        assert_eq!(agent.document_count, 0);
    }
}
