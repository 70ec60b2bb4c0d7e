//! VoxDesk backend: the HTTP collaborator of the voice session client.
//!
//! Issues LiveKit join credentials and serves the provider settings the
//! admin console edits and the agent worker reads.

pub mod api;
pub mod api_livekit;
pub mod api_settings;
pub mod config;

use axum::{
    routing::get,
    Extension, Json, Router,
};
use config::{Config, ProvidersConfig};
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use voxdesk_types::ProviderSelection;
use voxdesk_voice::TokenService;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Mints LiveKit join tokens.
    pub token_service: Arc<TokenService>,
    /// Providers the agent worker should use.
    ///
    /// A synchronous lock: every acquisition is a short read or field write
    /// that never spans an `.await`.
    pub selection: Arc<RwLock<ProviderSelection>>,
    /// Which provider API keys are present.
    pub providers: ProvidersConfig,
    /// Deployment label shown in the settings catalogue.
    pub environment: String,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            token_service: Arc::new(TokenService::new(config.livekit.clone())),
            selection: Arc::new(RwLock::new(ProviderSelection::default())),
            providers: config.providers.clone(),
            environment: config.server.environment.clone(),
        }
    }
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/livekit/token", get(api_livekit::token_handler))
        .route("/api/v1/settings", get(api_settings::get_settings_handler))
        .route(
            "/api/v1/settings/voice-providers",
            get(api_settings::get_voice_providers_handler),
        )
        .route(
            "/api/v1/settings/{key}",
            get(api_settings::get_setting_handler).put(api_settings::update_setting_handler),
        )
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
