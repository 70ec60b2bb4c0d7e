//! Credential endpoint used by the voice session client.

use crate::api::ApiError;
use crate::AppState;
use axum::extract::{Extension, Query};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use voxdesk_voice::VoiceError;

/// Query string for `GET /api/v1/livekit/token`.
#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    #[serde(default)]
    pub room: String,
    #[serde(default)]
    pub identity: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Handler for `GET /api/v1/livekit/token`.
///
/// Mints a join token scoped to exactly `room` and `identity`. The display
/// name is the identity.
pub async fn token_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<TokenResponse>, ApiError> {
    if query.room.trim().is_empty() {
        return Err(ApiError::BadRequest("room is required".to_string()));
    }
    if query.identity.trim().is_empty() {
        return Err(ApiError::BadRequest("identity is required".to_string()));
    }

    let token = state
        .token_service
        .generate_join_token(&query.room, &query.identity, &query.identity)
        .map_err(|e| match e {
            VoiceError::Validation(msg) => ApiError::BadRequest(msg),
            other => {
                tracing::error!(room = %query.room, "failed to mint join token: {}", other);
                ApiError::InternalServerError(format!("Failed to create token: {}", other))
            }
        })?;

    tracing::info!(
        room = %query.room,
        identity = %query.identity,
        token_len = token.len(),
        "issued join token"
    );

    Ok(Json(TokenResponse { token }))
}
