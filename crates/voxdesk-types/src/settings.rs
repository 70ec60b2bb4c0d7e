//! Provider settings catalogue and the active provider selection.
//!
//! The catalogue is the richer per-provider shape (name, configured flag,
//! models, voices). The flat "list of provider ids" shape is superseded and
//! not modelled here.

use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A provider family member that can be selected in the admin console.
pub trait Provider: Copy + Eq + 'static {
    /// Every variant, in display order.
    const ALL: &'static [Self];
    /// Catalogue category label used in error messages.
    const KIND: &'static str;

    /// Wire identifier (e.g. `"openai"`).
    fn as_str(self) -> &'static str;

    /// Human-readable name for the console.
    fn display_name(self) -> &'static str;

    /// Environment variable holding this provider's API key, if one is needed.
    fn api_key_var(self) -> Option<&'static str>;

    /// Parses a wire identifier.
    fn parse(value: &str) -> Result<Self, ValidationError> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == value)
            .ok_or_else(|| ValidationError::Unknown {
                kind: Self::KIND,
                value: value.to_string(),
                expected: Self::ALL.iter().map(|p| p.as_str()).collect(),
            })
    }
}

/// LLM provider families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAi,
    Groq,
    OpenRouter,
}

impl Provider for LlmProvider {
    const ALL: &'static [Self] = &[Self::OpenAi, Self::Groq, Self::OpenRouter];
    const KIND: &'static str = "LLM provider";

    fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Groq => "groq",
            Self::OpenRouter => "openrouter",
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Groq => "Groq (FREE)",
            Self::OpenRouter => "OpenRouter",
        }
    }

    fn api_key_var(self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::Groq => Some("GROQ_API_KEY"),
            Self::OpenRouter => Some("OPENROUTER_API_KEY"),
        }
    }
}

impl LlmProvider {
    /// Models offered for this provider.
    pub fn models(self) -> &'static [&'static str] {
        match self {
            Self::OpenAi => &["gpt-4o", "gpt-4o-mini", "gpt-4-turbo", "gpt-3.5-turbo"],
            Self::Groq => &[
                "llama-3.3-70b-versatile",
                "llama-3.1-8b-instant",
                "llama3-8b-8192",
                "mixtral-8x7b-32768",
            ],
            Self::OpenRouter => &[
                "openai/gpt-4o",
                "anthropic/claude-3.5-sonnet",
                "google/gemini-pro",
                "meta-llama/llama-3.1-70b-instruct",
            ],
        }
    }
}

/// Text-to-speech providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtsProvider {
    OpenAi,
    Deepgram,
    ElevenLabs,
}

impl Provider for TtsProvider {
    const ALL: &'static [Self] = &[Self::OpenAi, Self::Deepgram, Self::ElevenLabs];
    const KIND: &'static str = "TTS provider";

    fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Deepgram => "deepgram",
            Self::ElevenLabs => "elevenlabs",
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI TTS",
            Self::Deepgram => "Deepgram Aura",
            Self::ElevenLabs => "ElevenLabs",
        }
    }

    fn api_key_var(self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::Deepgram => Some("DEEPGRAM_API_KEY"),
            Self::ElevenLabs => Some("ELEVENLABS_API_KEY"),
        }
    }
}

impl TtsProvider {
    /// Voices offered for this provider.
    pub fn voices(self) -> &'static [&'static str] {
        match self {
            Self::OpenAi => &["alloy", "echo", "fable", "onyx", "nova", "shimmer"],
            Self::Deepgram => &[
                "aura-2-andromeda-en",
                "aura-2-arcas-en",
                "aura-2-athena-en",
                "aura-2-helios-en",
                "aura-2-hera-en",
                "aura-2-luna-en",
                "aura-2-orion-en",
                "aura-2-perseus-en",
                "aura-2-stella-en",
                "aura-2-zeus-en",
            ],
            Self::ElevenLabs => &[
                "Rachel", "Domi", "Bella", "Antoni", "Elli", "Josh", "Arnold", "Adam", "Sam",
            ],
        }
    }
}

/// Speech-to-text providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SttProvider {
    OpenAi,
    Deepgram,
}

impl Provider for SttProvider {
    const ALL: &'static [Self] = &[Self::OpenAi, Self::Deepgram];
    const KIND: &'static str = "STT provider";

    fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Deepgram => "deepgram",
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI Whisper",
            Self::Deepgram => "Deepgram Nova",
        }
    }

    fn api_key_var(self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::Deepgram => Some("DEEPGRAM_API_KEY"),
        }
    }
}

/// Web search providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchProvider {
    Tavily,
    Brave,
    DuckDuckGo,
}

impl Provider for SearchProvider {
    const ALL: &'static [Self] = &[Self::DuckDuckGo, Self::Tavily, Self::Brave];
    const KIND: &'static str = "search provider";

    fn as_str(self) -> &'static str {
        match self {
            Self::Tavily => "tavily",
            Self::Brave => "brave",
            Self::DuckDuckGo => "duckduckgo",
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            Self::Tavily => "Tavily",
            Self::Brave => "Brave Search",
            Self::DuckDuckGo => "DuckDuckGo",
        }
    }

    fn api_key_var(self) -> Option<&'static str> {
        match self {
            Self::Tavily => Some("TAVILY_API_KEY"),
            Self::Brave => Some("BRAVE_API_KEY"),
            Self::DuckDuckGo => None,
        }
    }
}

/// Catalogue entry for one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    /// Whether the provider's API key is present on the server.
    pub configured: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub voices: Vec<String>,
}

/// One settings category (LLM, TTS, STT or search).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderCategory {
    pub default_provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_voice: Option<String>,
    pub providers: BTreeMap<String, ProviderInfo>,
}

impl ProviderCategory {
    fn build<P: Provider>(
        selected: P,
        configured: &impl Fn(&str) -> bool,
        models: impl Fn(P) -> &'static [&'static str],
        voices: impl Fn(P) -> &'static [&'static str],
    ) -> Self {
        let providers = P::ALL
            .iter()
            .map(|&p| {
                let info = ProviderInfo {
                    name: p.display_name().to_string(),
                    configured: p.api_key_var().map_or(true, |var| configured(var)),
                    models: models(p).iter().map(|m| m.to_string()).collect(),
                    voices: voices(p).iter().map(|v| v.to_string()).collect(),
                };
                (p.as_str().to_string(), info)
            })
            .collect();
        Self {
            default_provider: selected.as_str().to_string(),
            default_model: None,
            default_voice: None,
            providers,
        }
    }
}

fn no_entries<P>(_: P) -> &'static [&'static str] {
    &[]
}

/// Full settings view served to the admin console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsCatalog {
    pub environment: String,
    pub llm: ProviderCategory,
    pub tts: ProviderCategory,
    pub stt: ProviderCategory,
    pub search: ProviderCategory,
}

impl SettingsCatalog {
    /// Builds the catalogue for the current selection.
    ///
    /// `configured` is asked whether an API key environment variable name
    /// (e.g. `"OPENAI_API_KEY"`) has a value on this server.
    pub fn build(
        environment: &str,
        selection: &ProviderSelection,
        configured: impl Fn(&str) -> bool,
    ) -> Self {
        let mut llm = ProviderCategory::build(
            selection.llm_provider,
            &configured,
            LlmProvider::models,
            no_entries,
        );
        llm.default_model = Some(selection.llm_model.clone());

        let mut tts = ProviderCategory::build(
            selection.tts_provider,
            &configured,
            no_entries,
            TtsProvider::voices,
        );
        tts.default_voice = Some(selection.tts_voice.clone());

        Self {
            environment: environment.to_string(),
            llm,
            tts,
            stt: ProviderCategory::build(
                selection.stt_provider,
                &configured,
                no_entries,
                no_entries,
            ),
            search: ProviderCategory::build(
                selection.search_provider,
                &configured,
                no_entries,
                no_entries,
            ),
        }
    }
}

/// The providers currently used by the voice agent worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSelection {
    pub llm_provider: LlmProvider,
    pub llm_model: String,
    pub tts_provider: TtsProvider,
    pub tts_voice: String,
    pub stt_provider: SttProvider,
    pub search_provider: SearchProvider,
}

impl Default for ProviderSelection {
    fn default() -> Self {
        Self {
            llm_provider: LlmProvider::Groq,
            llm_model: "llama-3.3-70b-versatile".to_string(),
            tts_provider: TtsProvider::Deepgram,
            tts_voice: "aura-2-andromeda-en".to_string(),
            stt_provider: SttProvider::Deepgram,
            search_provider: SearchProvider::DuckDuckGo,
        }
    }
}

impl ProviderSelection {
    /// Checks that `model` is offered by the currently selected LLM provider.
    pub fn check_llm_model(&self, model: &str) -> Result<(), ValidationError> {
        let models = self.llm_provider.models();
        if models.iter().any(|m| *m == model) {
            Ok(())
        } else {
            Err(ValidationError::Unknown {
                kind: "model",
                value: model.to_string(),
                expected: models.to_vec(),
            })
        }
    }
}
