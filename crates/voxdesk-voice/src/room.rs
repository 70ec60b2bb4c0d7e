//! The media room boundary.
//!
//! The session manager never talks to a transport directly. It asks a
//! [`RoomConnector`] to join with a credential and gets back a
//! [`MediaRoom`] plus an ordered stream of [`RoomEvent`]s.

use crate::credential::SessionCredential;
use crate::error::VoiceError;
use async_trait::async_trait;
use std::fmt;
use tokio::sync::mpsc;
use voxdesk_types::VoiceSettings;

/// Link state of a media connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

impl ConnectionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who owns a remote track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantKind {
    /// The AI agent worker.
    Agent,
    /// Any other participant.
    Standard,
}

/// A remote audio track subscribed by the local participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTrack {
    pub sid: String,
    pub participant: String,
    pub kind: ParticipantKind,
    /// A muted track is present but carries no audio.
    pub muted: bool,
}

impl AudioTrack {
    pub fn agent(sid: impl Into<String>, participant: impl Into<String>) -> Self {
        Self {
            sid: sid.into(),
            participant: participant.into(),
            kind: ParticipantKind::Agent,
            muted: false,
        }
    }

    /// Whether this track is the agent actively producing audio.
    pub fn is_agent_audio(&self) -> bool {
        self.kind == ParticipantKind::Agent && !self.muted
    }
}

/// A point-in-time amplitude reading for one track. Cosmetic only.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioActivitySample {
    pub track_sid: String,
    /// Normalised amplitude in `[0, 1]`.
    pub level: f32,
}

/// Asynchronous signals raised by a joined room.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    StatusChanged(ConnectionStatus),
    TrackSubscribed(AudioTrack),
    TrackUnsubscribed { sid: String },
    TrackMuted { sid: String, muted: bool },
    /// The agent's side-channel "processing" flag.
    AgentProcessing(bool),
    MicrophoneChanged(bool),
    AudioLevel(AudioActivitySample),
    /// The transport closed underneath us.
    Disconnected { reason: String },
}

/// Capability flags for joining a room.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOptions {
    pub audio: bool,
    pub video: bool,
    /// Forwarded to the agent worker so it speaks with the configured voice.
    pub voice: Option<VoiceSettings>,
}

impl JoinOptions {
    /// Audio on, video off.
    pub fn voice_only(voice: Option<VoiceSettings>) -> Self {
        Self {
            audio: true,
            video: false,
            voice,
        }
    }
}

/// A live media connection.
#[async_trait]
pub trait MediaRoom: Send + Sync {
    fn name(&self) -> &str;

    async fn set_microphone(&self, enabled: bool) -> Result<(), VoiceError>;

    /// Releases the connection and every track it holds.
    async fn close(&self);
}

/// Result of a successful handshake.
pub struct JoinedRoom {
    pub room: Box<dyn MediaRoom>,
    pub events: mpsc::Receiver<RoomEvent>,
}

impl fmt::Debug for JoinedRoom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinedRoom")
            .field("room", &self.room.name())
            .finish_non_exhaustive()
    }
}

/// Establishes media connections.
///
/// Implementations should report handshake problems as
/// [`VoiceError::HandshakeFailed`].
#[async_trait]
pub trait RoomConnector: Send + Sync {
    async fn join(
        &self,
        url: &str,
        credential: &SessionCredential,
        options: JoinOptions,
    ) -> Result<JoinedRoom, VoiceError>;
}
