use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// The suspending step of a session that can time out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectStage {
    Credential,
    Handshake,
}

impl fmt::Display for ConnectStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Credential => "credential request",
            Self::Handshake => "media handshake",
        })
    }
}

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("LiveKit token error: {0}")]
    LiveKit(#[from] livekit_api::access_token::AccessTokenError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Rejected locally before any network call.
    #[error("{0}")]
    Validation(String),

    #[error("Failed to get token. Check if the server is running. ({0})")]
    CredentialUnavailable(String),

    #[error("Could not connect to the voice room: {0}")]
    HandshakeFailed(String),

    #[error("{stage} timed out after {}ms", .after.as_millis())]
    Timeout { stage: ConnectStage, after: Duration },

    #[error("Connection to the voice room was lost: {0}")]
    TransportDropped(String),

    #[error("Not connected to a voice room")]
    NotConnected,
}

impl VoiceError {
    /// Whether re-submitting the identity form can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::CredentialUnavailable(_)
                | Self::HandshakeFailed(_)
                | Self::Timeout { .. }
                | Self::TransportDropped(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_error_tells_operator_to_check_server() {
        let err = VoiceError::CredentialUnavailable("server responded with 500".to_string());
        let message = err.to_string();
        assert!(message.contains("Check if the server is running"));
        assert!(message.contains("500"));
        assert!(err.is_retryable());
    }

    #[test]
    fn timeout_names_the_stage() {
        let err = VoiceError::Timeout {
            stage: ConnectStage::Handshake,
            after: Duration::from_millis(1500),
        };
        assert_eq!(err.to_string(), "media handshake timed out after 1500ms");
    }

    #[test]
    fn validation_is_not_retryable() {
        assert!(!VoiceError::Validation("identity must not be empty".into()).is_retryable());
    }
}
