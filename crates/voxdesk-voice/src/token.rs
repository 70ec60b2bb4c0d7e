use crate::config::LiveKitConfig;
use crate::error::VoiceError;
use livekit_api::access_token::{AccessToken, VideoGrants};
use std::time::Duration;
use tracing::debug;

/// Mints LiveKit join tokens on behalf of the credential endpoint.
#[derive(Debug, Clone)]
pub struct TokenService {
    config: LiveKitConfig,
}

impl TokenService {
    pub fn new(config: LiveKitConfig) -> Self {
        Self { config }
    }

    /// Whether an API key and secret are both configured.
    pub fn is_enabled(&self) -> bool {
        !self.config.api_key.is_empty() && !self.config.api_secret.is_empty()
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.config.token_ttl_seconds)
    }

    /// Signs a token that lets `identity` join, publish to and subscribe in
    /// `room`.
    pub fn generate_join_token(
        &self,
        room: &str,
        identity: &str,
        display_name: &str,
    ) -> Result<String, VoiceError> {
        if room.trim().is_empty() {
            return Err(VoiceError::Validation("room is required".to_string()));
        }
        if identity.trim().is_empty() {
            return Err(VoiceError::Validation("identity is required".to_string()));
        }
        if !self.is_enabled() {
            return Err(VoiceError::Config(
                "LiveKit API key and secret must be set".to_string(),
            ));
        }

        let token = AccessToken::with_api_key(&self.config.api_key, &self.config.api_secret)
            .with_identity(identity)
            .with_name(display_name)
            .with_grants(VideoGrants {
                room_join: true,
                room: room.to_string(),
                can_publish: true,
                can_subscribe: true,
                can_publish_data: true,
                ..Default::default()
            })
            .with_ttl(self.token_ttl());

        let jwt = token.to_jwt()?;
        debug!(room, identity, "minted join token");
        Ok(jwt)
    }
}
