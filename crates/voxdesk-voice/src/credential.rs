//! Token exchange: obtaining a short-lived credential for one room.

use crate::context::{Identity, RoomName};
use crate::error::VoiceError;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use tracing::{debug, warn};

/// Path of the credential endpoint on the backend API.
pub const TOKEN_PATH: &str = "/api/v1/livekit/token";

/// A bearer token bound to exactly one room and one identity.
///
/// Issued once per connect attempt and never reused.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredential {
    token: String,
    room: RoomName,
    identity: Identity,
}

impl SessionCredential {
    pub fn new(token: impl Into<String>, room: RoomName, identity: Identity) -> Self {
        Self {
            token: token.into(),
            room,
            identity,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn room(&self) -> &RoomName {
        &self.room
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}

impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredential")
            .field("token", &"[REDACTED]")
            .field("room", &self.room)
            .field("identity", &self.identity)
            .finish()
    }
}

/// Anything that can issue a [`SessionCredential`].
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn request(
        &self,
        room: &RoomName,
        identity: &Identity,
    ) -> Result<SessionCredential, VoiceError>;
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

/// HTTP client for the backend credential endpoint.
#[derive(Debug, Clone)]
pub struct CredentialClient {
    http: reqwest::Client,
    endpoint: String,
}

impl CredentialClient {
    pub fn new(api_base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), api_base_url)
    }

    pub fn with_client(http: reqwest::Client, api_base_url: &str) -> Self {
        Self {
            http,
            endpoint: format!("{}{}", api_base_url.trim_end_matches('/'), TOKEN_PATH),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CredentialSource for CredentialClient {
    async fn request(
        &self,
        room: &RoomName,
        identity: &Identity,
    ) -> Result<SessionCredential, VoiceError> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("room", room.as_str()), ("identity", identity.as_str())])
            .send()
            .await
            .map_err(|e| {
                warn!(endpoint = %self.endpoint, "credential endpoint unreachable: {}", e);
                VoiceError::CredentialUnavailable(format!("request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(endpoint = %self.endpoint, %status, "credential request rejected");
            return Err(VoiceError::CredentialUnavailable(format!(
                "server responded with {}",
                status
            )));
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            VoiceError::CredentialUnavailable(format!("malformed token response: {}", e))
        })?;

        if body.token.is_empty() {
            return Err(VoiceError::CredentialUnavailable(
                "server returned an empty token".to_string(),
            ));
        }

        debug!(
            room = %room,
            identity = %identity,
            token_len = body.token.len(),
            "credential acquired"
        );

        Ok(SessionCredential::new(body.token, room.clone(), identity.clone()))
    }
}
