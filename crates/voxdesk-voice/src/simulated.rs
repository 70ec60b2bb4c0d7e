//! In-process media room.
//!
//! Stands in for a WebRTC transport in tests and local demos. Join behaviour
//! is scriptable, and a [`RoomDriver`] injects the events a real agent
//! worker would produce.

use crate::credential::SessionCredential;
use crate::error::VoiceError;
use crate::room::{
    AudioActivitySample, AudioTrack, ConnectionStatus, JoinOptions, JoinedRoom, MediaRoom,
    RoomConnector, RoomEvent,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Capacity of a simulated room's event channel.
const DEFAULT_ROOM_EVENT_CAPACITY: usize = 64;

/// How the next join request is answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinBehavior {
    Accept,
    Reject(String),
    /// Never completes.
    Hang,
}

/// What a join request carried.
#[derive(Debug, Clone)]
pub struct JoinRecord {
    pub url: String,
    pub token: String,
    pub room: String,
    pub identity: String,
    pub options: JoinOptions,
}

/// Scriptable [`RoomConnector`].
#[derive(Debug)]
pub struct SimulatedConnector {
    behavior: Mutex<JoinBehavior>,
    latency: Duration,
    close_latency: Duration,
    joins: Mutex<Vec<JoinRecord>>,
    driver: Mutex<Option<RoomDriver>>,
}

impl Default for SimulatedConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedConnector {
    pub fn new() -> Self {
        Self {
            behavior: Mutex::new(JoinBehavior::Accept),
            latency: Duration::ZERO,
            close_latency: Duration::ZERO,
            joins: Mutex::new(Vec::new()),
            driver: Mutex::new(None),
        }
    }

    /// Delays every handshake by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Delays closing every room joined from here by `latency`.
    pub fn with_close_latency(mut self, latency: Duration) -> Self {
        self.close_latency = latency;
        self
    }

    pub fn set_behavior(&self, behavior: JoinBehavior) {
        *self.behavior.lock() = behavior;
    }

    /// Every join request seen so far, oldest first.
    pub fn joins(&self) -> Vec<JoinRecord> {
        self.joins.lock().clone()
    }

    /// Driver for the most recently joined room.
    pub fn driver(&self) -> Option<RoomDriver> {
        self.driver.lock().clone()
    }
}

#[async_trait]
impl RoomConnector for SimulatedConnector {
    async fn join(
        &self,
        url: &str,
        credential: &SessionCredential,
        options: JoinOptions,
    ) -> Result<JoinedRoom, VoiceError> {
        info!(
            "simulated join to room '{}' at '{}' with token length {}",
            credential.room(),
            url,
            credential.token().len()
        );

        self.joins.lock().push(JoinRecord {
            url: url.to_string(),
            token: credential.token().to_string(),
            room: credential.room().to_string(),
            identity: credential.identity().to_string(),
            options,
        });

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let behavior = self.behavior.lock().clone();
        match behavior {
            JoinBehavior::Accept => {}
            JoinBehavior::Reject(reason) => return Err(VoiceError::HandshakeFailed(reason)),
            JoinBehavior::Hang => return std::future::pending().await,
        }

        let (tx, rx) = mpsc::channel(DEFAULT_ROOM_EVENT_CAPACITY);
        let closed = Arc::new(AtomicBool::new(false));
        let driver = RoomDriver {
            events: tx.clone(),
            closed: closed.clone(),
        };
        *self.driver.lock() = Some(driver);

        let room = SimulatedRoom {
            name: credential.room().to_string(),
            events: tx,
            closed,
            close_latency: self.close_latency,
        };
        Ok(JoinedRoom {
            room: Box::new(room),
            events: rx,
        })
    }
}

/// A joined simulated room.
#[derive(Debug)]
pub struct SimulatedRoom {
    name: String,
    events: mpsc::Sender<RoomEvent>,
    closed: Arc<AtomicBool>,
    close_latency: Duration,
}

#[async_trait]
impl MediaRoom for SimulatedRoom {
    fn name(&self) -> &str {
        &self.name
    }

    async fn set_microphone(&self, enabled: bool) -> Result<(), VoiceError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(VoiceError::NotConnected);
        }
        // A real transport confirms the change asynchronously.
        self.events
            .send(RoomEvent::MicrophoneChanged(enabled))
            .await
            .map_err(|_| VoiceError::NotConnected)
    }

    async fn close(&self) {
        if !self.close_latency.is_zero() {
            tokio::time::sleep(self.close_latency).await;
        }
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("simulated room '{}' closed", self.name);
        }
    }
}

/// Injects events into a simulated room, playing the part of the agent.
#[derive(Debug, Clone)]
pub struct RoomDriver {
    events: mpsc::Sender<RoomEvent>,
    closed: Arc<AtomicBool>,
}

impl RoomDriver {
    /// Whether the local side has closed the room.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub async fn send(&self, event: RoomEvent) {
        if self.events.send(event).await.is_err() {
            debug!("simulated room event dropped: no listener");
        }
    }

    pub async fn agent_processing(&self, processing: bool) {
        self.send(RoomEvent::AgentProcessing(processing)).await;
    }

    pub async fn publish_agent_audio(&self, sid: &str) {
        self.send(RoomEvent::TrackSubscribed(AudioTrack::agent(sid, "agent")))
            .await;
    }

    pub async fn unpublish(&self, sid: &str) {
        self.send(RoomEvent::TrackUnsubscribed {
            sid: sid.to_string(),
        })
        .await;
    }

    pub async fn audio_level(&self, sid: &str, level: f32) {
        self.send(RoomEvent::AudioLevel(AudioActivitySample {
            track_sid: sid.to_string(),
            level,
        }))
        .await;
    }

    pub async fn status(&self, status: ConnectionStatus) {
        self.send(RoomEvent::StatusChanged(status)).await;
    }

    /// Simulates the transport going away.
    pub async fn drop_connection(&self, reason: &str) {
        self.send(RoomEvent::Disconnected {
            reason: reason.to_string(),
        })
        .await;
    }
}
