//! Provider settings API used by the admin console and the agent worker.
//!
//! The active [`ProviderSelection`] lives in memory on [`AppState`]; a
//! restart returns to the defaults.

use crate::api::ApiError;
use crate::config::ProvidersConfig;
use crate::AppState;
use axum::extract::{Extension, Json, Path};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use voxdesk_types::{
    LlmProvider, Provider, ProviderSelection, SearchProvider, SettingsCatalog, SttProvider,
    TtsProvider,
};

/// A setting that can be changed with `PUT /api/v1/settings/{key}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    SearchProvider,
    LlmProvider,
    LlmModel,
    TtsProvider,
    TtsVoice,
    SttProvider,
}

impl SettingKey {
    /// Parses the URL form (`llm-provider`).
    pub fn from_path(key: &str) -> Option<Self> {
        match key {
            "search-provider" => Some(Self::SearchProvider),
            "llm-provider" => Some(Self::LlmProvider),
            "llm-model" => Some(Self::LlmModel),
            "tts-provider" => Some(Self::TtsProvider),
            "tts-voice" => Some(Self::TtsVoice),
            "stt-provider" => Some(Self::SttProvider),
            _ => None,
        }
    }

    /// The stored form (`llm_provider`), echoed back in responses.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SearchProvider => "search_provider",
            Self::LlmProvider => "llm_provider",
            Self::LlmModel => "llm_model",
            Self::TtsProvider => "tts_provider",
            Self::TtsVoice => "tts_voice",
            Self::SttProvider => "stt_provider",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SettingUpdate {
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SettingUpdated {
    pub key: String,
    pub value: String,
}

/// Rejects providers whose API key is missing on this server.
fn require_configured<P: Provider>(
    provider: P,
    providers: &ProvidersConfig,
) -> Result<P, ApiError> {
    if let Some(var) = provider.api_key_var() {
        if !providers.is_configured(var) {
            return Err(ApiError::BadRequest(format!(
                "{} is not configured in environment",
                var
            )));
        }
    }
    Ok(provider)
}

/// Applies one validated update to `selection`.
fn apply_update(
    selection: &mut ProviderSelection,
    key: SettingKey,
    value: &str,
    providers: &ProvidersConfig,
) -> Result<(), ApiError> {
    match key {
        SettingKey::SearchProvider => {
            selection.search_provider =
                require_configured(SearchProvider::parse(value)?, providers)?;
        }
        SettingKey::LlmProvider => {
            let provider = require_configured(LlmProvider::parse(value)?, providers)?;
            selection.llm_provider = provider;
            if selection.check_llm_model(&selection.llm_model).is_err() {
                if let Some(first) = provider.models().first() {
                    tracing::info!(
                        provider = value,
                        model = *first,
                        "selected model not offered by new provider, switching"
                    );
                    selection.llm_model = (*first).to_string();
                }
            }
        }
        SettingKey::LlmModel => {
            selection.check_llm_model(value)?;
            selection.llm_model = value.to_string();
        }
        SettingKey::TtsProvider => {
            selection.tts_provider = require_configured(TtsProvider::parse(value)?, providers)?;
        }
        SettingKey::TtsVoice => {
            if value.trim().is_empty() {
                return Err(ApiError::BadRequest("voice must not be empty".to_string()));
            }
            selection.tts_voice = value.to_string();
        }
        SettingKey::SttProvider => {
            selection.stt_provider = require_configured(SttProvider::parse(value)?, providers)?;
        }
    }
    Ok(())
}

/// Handler for `GET /api/v1/settings`.
pub async fn get_settings_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<SettingsCatalog> {
    let selection = state.selection.read().clone();
    Json(SettingsCatalog::build(
        &state.environment,
        &selection,
        |var| state.providers.is_configured(var),
    ))
}

/// Handler for `GET /api/v1/settings/voice-providers`.
pub async fn get_voice_providers_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<Value> {
    let selection = state.selection.read();
    Json(json!({
        "tts": {
            "provider": selection.tts_provider.as_str(),
            "voice": selection.tts_voice,
        },
        "stt": { "provider": selection.stt_provider.as_str() },
        "llm": {
            "provider": selection.llm_provider.as_str(),
            "model": selection.llm_model,
        },
    }))
}

/// Handler for `GET /api/v1/settings/{key}`.
///
/// Only the provider lookups the agent worker polls are readable this way.
pub async fn get_setting_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let selection = state.selection.read();
    match key.as_str() {
        "search-provider" => Ok(Json(json!({
            "provider": selection.search_provider.as_str(),
        }))),
        "llm-provider" => Ok(Json(json!({
            "provider": selection.llm_provider.as_str(),
            "model": selection.llm_model,
        }))),
        _ => Err(ApiError::NotFound(format!("unknown setting '{}'", key))),
    }
}

/// Handler for `PUT /api/v1/settings/{key}`.
pub async fn update_setting_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(key): Path<String>,
    Json(update): Json<SettingUpdate>,
) -> Result<Json<SettingUpdated>, ApiError> {
    let setting = SettingKey::from_path(&key)
        .ok_or_else(|| ApiError::NotFound(format!("unknown setting '{}'", key)))?;

    {
        let mut selection = state.selection.write();
        apply_update(&mut selection, setting, &update.value, &state.providers)?;
    }

    tracing::info!(key = setting.as_str(), value = %update.value, "setting updated");

    Ok(Json(SettingUpdated {
        key: setting.as_str().to_string(),
        value: update.value,
    }))
}
