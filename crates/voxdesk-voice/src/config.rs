use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// LiveKit URL used by a local development server.
pub const DEV_LIVEKIT_URL: &str = "ws://localhost:7880";
/// API key accepted by a LiveKit server started with `--dev`.
pub const DEV_LIVEKIT_API_KEY: &str = "devkey";
/// API secret accepted by a LiveKit server started with `--dev`.
pub const DEV_LIVEKIT_API_SECRET: &str = "secret";

fn default_token_ttl_seconds() -> u64 {
    3600
}

/// Server-side credentials used to mint join tokens.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveKitConfig {
    pub url: String,
    pub api_key: String,
    #[serde(skip_serializing)]
    pub api_secret: String,
    /// JWT token TTL in seconds for LiveKit join tokens. Default: 3600 (1 hour).
    #[serde(default = "default_token_ttl_seconds")]
    pub token_ttl_seconds: u64,
}

impl Default for LiveKitConfig {
    fn default() -> Self {
        Self {
            url: DEV_LIVEKIT_URL.to_string(),
            api_key: DEV_LIVEKIT_API_KEY.to_string(),
            api_secret: DEV_LIVEKIT_API_SECRET.to_string(),
            token_ttl_seconds: default_token_ttl_seconds(),
        }
    }
}

impl fmt::Debug for LiveKitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveKitConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .finish()
    }
}

impl LiveKitConfig {
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            token_ttl_seconds: default_token_ttl_seconds(),
        }
    }
}

/// Settings for the voice session client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the backend API that issues session credentials.
    pub api_base_url: String,
    /// Media server URL passed to the room connector.
    pub livekit_url: String,
    pub credential_timeout_ms: u64,
    pub handshake_timeout_ms: u64,
    /// Upper bound on waiting for the media room to close.
    pub teardown_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            livekit_url: DEV_LIVEKIT_URL.to_string(),
            credential_timeout_ms: 10_000,
            handshake_timeout_ms: 15_000,
            teardown_timeout_ms: 5_000,
        }
    }
}

impl ClientConfig {
    pub fn credential_timeout(&self) -> Duration {
        Duration::from_millis(self.credential_timeout_ms)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    pub fn teardown_timeout(&self) -> Duration {
        Duration::from_millis(self.teardown_timeout_ms)
    }
}
