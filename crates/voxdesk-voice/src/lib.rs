//! Voice session core for VoxDesk.
//!
//! A user enters a name, the client fetches a short-lived LiveKit credential
//! from the backend, joins a media room, and then talks with an AI agent in
//! that room. This crate owns that flow:
//!
//! - [`credential`] exchanges an identity for a [`SessionCredential`].
//! - [`session`] runs the connection lifecycle and owns the single live
//!   [`ConnectionHandle`].
//! - [`conversation`] derives idle/connecting/listening/thinking/speaking
//!   from connection and audio signals.
//! - [`presentation`] turns that into labels, themes and meter bars.
//!
//! The media transport sits behind [`RoomConnector`]; [`simulated`] provides
//! an in-process implementation. [`TokenService`] is the server-side half
//! that signs the credentials.

pub mod config;
pub mod context;
pub mod conversation;
pub mod credential;
pub mod error;
pub mod presentation;
pub mod room;
pub mod session;
pub mod simulated;
pub mod token;

pub use config::{
    ClientConfig, LiveKitConfig, DEV_LIVEKIT_API_KEY, DEV_LIVEKIT_API_SECRET, DEV_LIVEKIT_URL,
};
pub use context::{Identity, RoomName, SessionContext};
pub use conversation::{derive, ConversationSignals, ConversationState, ConversationTracker};
pub use credential::{CredentialClient, CredentialSource, SessionCredential};
pub use error::{ConnectStage, VoiceError};
pub use presentation::{
    describe, render, BarMeter, LevelHistory, RenderModel, StatusDescriptor, Theme,
};
pub use room::{
    AudioActivitySample, AudioTrack, ConnectionStatus, JoinOptions, JoinedRoom, MediaRoom,
    ParticipantKind, RoomConnector, RoomEvent,
};
pub use session::{
    ConnectOutcome, ConnectionHandle, SessionManager, SessionNotice, SessionPhase,
    SessionSnapshot,
};
pub use simulated::{JoinBehavior, RoomDriver, SimulatedConnector};
pub use token::TokenService;
