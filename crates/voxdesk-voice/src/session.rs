//! Session connection lifecycle.
//!
//! [`SessionManager`] owns at most one [`ConnectionHandle`] and drives it
//! through `Disconnected → Acquiring → Establishing → Live → Disconnecting →
//! Disconnected`. Every connect and every disconnect bumps an attempt id;
//! a suspended step applies its result only if the id it started with is
//! still current.

use crate::config::ClientConfig;
use crate::context::{RoomName, SessionContext};
use crate::conversation::{ConversationSignals, ConversationState, ConversationTracker};
use crate::credential::{CredentialSource, SessionCredential};
use crate::error::{ConnectStage, VoiceError};
use crate::room::{
    AudioActivitySample, AudioTrack, ConnectionStatus, JoinOptions, JoinedRoom, MediaRoom,
    RoomConnector, RoomEvent,
};
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Capacity of the notice broadcast channel.
const DEFAULT_NOTICE_BROADCAST_CAPACITY: usize = 256;

/// Lifecycle phase of the session connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Disconnected,
    Acquiring,
    Establishing,
    Live,
    Disconnecting,
}

impl SessionPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Acquiring => "acquiring",
            Self::Establishing => "establishing",
            Self::Live => "live",
            Self::Disconnecting => "disconnecting",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of the session for presentation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub conversation: ConversationState,
    pub microphone_enabled: bool,
    pub room: Option<String>,
    pub attempt: u64,
}

/// Things a UI reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionNotice {
    PhaseChanged(SessionPhase),
    ConversationChanged(ConversationState),
    /// A connect attempt failed; the message is user-facing.
    ConnectFailed { message: String },
    /// A live session ended involuntarily; the message is user-facing.
    Dropped { message: String },
    AudioLevel(AudioActivitySample),
}

/// Result of a connect request that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectOutcome {
    Live { room: RoomName },
    /// Another attempt or session is in progress; nothing was changed.
    Rejected { current: SessionPhase },
    /// A disconnect arrived while this attempt was suspended.
    Cancelled,
}

/// One live media connection.
pub struct ConnectionHandle {
    status: ConnectionStatus,
    tracks: Vec<AudioTrack>,
    credential: SessionCredential,
    room: Arc<dyn MediaRoom>,
    microphone_enabled: bool,
    agent_processing: bool,
}

impl ConnectionHandle {
    fn new(credential: SessionCredential, room: Arc<dyn MediaRoom>) -> Self {
        Self {
            status: ConnectionStatus::Connected,
            tracks: Vec::new(),
            credential,
            room,
            microphone_enabled: false,
            agent_processing: false,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn tracks(&self) -> &[AudioTrack] {
        &self.tracks
    }

    pub fn credential(&self) -> &SessionCredential {
        &self.credential
    }

    pub fn signals(&self) -> ConversationSignals {
        ConversationSignals {
            connection: self.status,
            agent_publishing: self.tracks.iter().any(AudioTrack::is_agent_audio),
            agent_processing: self.agent_processing,
            microphone_live: self.microphone_enabled,
        }
    }

    fn upsert_track(&mut self, track: AudioTrack) {
        match self.tracks.iter_mut().find(|t| t.sid == track.sid) {
            Some(existing) => *existing = track,
            None => self.tracks.push(track),
        }
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("status", &self.status)
            .field("tracks", &self.tracks)
            .field("room", &self.room.name())
            .field("microphone_enabled", &self.microphone_enabled)
            .field("agent_processing", &self.agent_processing)
            .finish()
    }
}

#[derive(Default)]
struct Inner {
    phase: SessionPhase,
    attempt: u64,
    room: Option<RoomName>,
    handle: Option<ConnectionHandle>,
    tracker: ConversationTracker,
    pump: Option<JoinHandle<()>>,
}

impl Inner {
    fn signals(&self) -> ConversationSignals {
        match (self.phase, &self.handle) {
            (SessionPhase::Acquiring | SessionPhase::Establishing, _) => ConversationSignals {
                connection: ConnectionStatus::Connecting,
                ..Default::default()
            },
            (SessionPhase::Live, Some(handle)) => handle.signals(),
            _ => ConversationSignals::default(),
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            conversation: self.tracker.current(),
            microphone_enabled: self
                .handle
                .as_ref()
                .is_some_and(|h| h.microphone_enabled),
            room: self.room.as_ref().map(|r| r.to_string()),
            attempt: self.attempt,
        }
    }
}

enum Applied {
    Continue,
    Stale,
    Dropped(String),
}

struct Shared {
    config: ClientConfig,
    credentials: Arc<dyn CredentialSource>,
    connector: Arc<dyn RoomConnector>,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<SessionSnapshot>,
    notice_tx: broadcast::Sender<SessionNotice>,
}

impl Shared {
    fn notify(&self, notice: SessionNotice) {
        // No subscribers is fine.
        let _ = self.notice_tx.send(notice);
    }

    fn transition(&self, inner: &mut Inner, phase: SessionPhase) {
        if inner.phase != phase {
            info!(
                attempt = inner.attempt,
                from = %inner.phase,
                to = %phase,
                "session phase changed"
            );
            inner.phase = phase;
            self.notify(SessionNotice::PhaseChanged(phase));
        }
        self.refresh(inner);
    }

    /// Recomputes the conversation state and publishes a snapshot.
    fn refresh(&self, inner: &mut Inner) {
        let changed = match inner.phase {
            SessionPhase::Disconnected | SessionPhase::Disconnecting => inner.tracker.reset(),
            _ => {
                let signals = inner.signals();
                inner.tracker.update(&signals)
            }
        };
        if let Some(state) = changed {
            debug!(attempt = inner.attempt, state = %state, "conversation state changed");
            self.notify(SessionNotice::ConversationChanged(state));
        }
        self.state_tx.send_replace(inner.snapshot());
    }

    fn fail(&self, attempt: u64, err: VoiceError) -> Result<ConnectOutcome, VoiceError> {
        let mut inner = self.inner.lock();
        if inner.attempt != attempt {
            debug!(attempt, error = %err, "discarding failure of a cancelled attempt");
            return Ok(ConnectOutcome::Cancelled);
        }
        warn!(attempt, error = %err, "connect attempt failed");
        inner.handle = None;
        inner.room = None;
        self.transition(&mut inner, SessionPhase::Disconnected);
        self.notify(SessionNotice::ConnectFailed {
            message: err.to_string(),
        });
        Err(err)
    }

    fn apply(&self, attempt: u64, event: RoomEvent) -> Applied {
        let mut inner = self.inner.lock();
        if inner.attempt != attempt || inner.phase != SessionPhase::Live {
            return Applied::Stale;
        }
        let Some(handle) = inner.handle.as_mut() else {
            return Applied::Stale;
        };

        match event {
            RoomEvent::StatusChanged(status) => match status {
                ConnectionStatus::Connected | ConnectionStatus::Connecting => {
                    handle.status = status;
                }
                ConnectionStatus::Disconnected | ConnectionStatus::Failed => {
                    return Applied::Dropped(format!("room reported {}", status));
                }
            },
            RoomEvent::TrackSubscribed(track) => {
                debug!(sid = %track.sid, participant = %track.participant, "track subscribed");
                handle.upsert_track(track);
            }
            RoomEvent::TrackUnsubscribed { sid } => {
                handle.tracks.retain(|t| t.sid != sid);
            }
            RoomEvent::TrackMuted { sid, muted } => {
                if let Some(track) = handle.tracks.iter_mut().find(|t| t.sid == sid) {
                    track.muted = muted;
                }
            }
            RoomEvent::AgentProcessing(processing) => handle.agent_processing = processing,
            RoomEvent::MicrophoneChanged(enabled) => handle.microphone_enabled = enabled,
            RoomEvent::AudioLevel(sample) => {
                self.notify(SessionNotice::AudioLevel(sample));
                return Applied::Continue;
            }
            RoomEvent::Disconnected { reason } => return Applied::Dropped(reason),
        }

        self.refresh(&mut inner);
        Applied::Continue
    }

    /// Tears down a live session whose transport went away. No retry.
    async fn drop_transport(&self, attempt: u64, reason: String) {
        let (teardown_attempt, handle) = {
            let mut inner = self.inner.lock();
            if inner.attempt != attempt || inner.phase != SessionPhase::Live {
                return;
            }
            inner.attempt += 1;
            // This runs on the pump task itself; detach rather than abort.
            inner.pump.take();
            let handle = inner.handle.take();
            self.transition(&mut inner, SessionPhase::Disconnecting);
            (inner.attempt, handle)
        };

        let err = VoiceError::TransportDropped(reason);
        warn!(attempt, error = %err, "live session dropped");
        self.notify(SessionNotice::Dropped {
            message: err.to_string(),
        });

        if let Some(handle) = handle {
            self.release(handle).await;
        }
        self.finish_teardown(teardown_attempt);
    }

    async fn release(&self, handle: ConnectionHandle) {
        let room_name = handle.room.name().to_string();
        let limit = self.config.teardown_timeout();
        if tokio::time::timeout(limit, handle.room.close()).await.is_err() {
            warn!(room = %room_name, "media room did not close within {:?}", limit);
        }
        // The credential goes with the handle.
        drop(handle);
    }

    fn finish_teardown(&self, teardown_attempt: u64) {
        let mut inner = self.inner.lock();
        if inner.attempt == teardown_attempt && inner.phase == SessionPhase::Disconnecting {
            inner.room = None;
            self.transition(&mut inner, SessionPhase::Disconnected);
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        if let Some(pump) = inner.pump.take() {
            pump.abort();
        }
        let Some(handle) = inner.handle.take() else {
            return;
        };

        let room = handle.room.clone();
        let room_name = room.name().to_string();
        let limit = self.config.teardown_timeout();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                info!(room = %room_name, "session manager dropped while live, releasing room");
                runtime.spawn(async move {
                    if tokio::time::timeout(limit, room.close()).await.is_err() {
                        warn!(room = %room_name, "media room did not close within {:?}", limit);
                    }
                });
            }
            Err(_) => {
                warn!(room = %room_name, "no runtime to release media room on drop");
            }
        }
    }
}

/// Returns an abandoned connect attempt to `Disconnected`.
///
/// Lives for the whole of [`SessionManager::connect`]. On the normal paths
/// the phase or attempt id has already moved on by the time it drops, so it
/// only acts when the connect future itself was dropped mid-await.
struct AttemptGuard<'a> {
    shared: &'a Shared,
    attempt: u64,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.shared.inner.lock();
        if inner.attempt != self.attempt
            || !matches!(
                inner.phase,
                SessionPhase::Acquiring | SessionPhase::Establishing
            )
        {
            return;
        }
        inner.attempt += 1;
        inner.room = None;
        info!(attempt = self.attempt, phase = %inner.phase, "connect attempt abandoned");
        self.shared.transition(&mut inner, SessionPhase::Disconnected);
    }
}

async fn pump_events(weak: Weak<Shared>, attempt: u64, mut events: mpsc::Receiver<RoomEvent>) {
    while let Some(event) = events.recv().await {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        match shared.apply(attempt, event) {
            Applied::Continue => {}
            Applied::Stale => return,
            Applied::Dropped(reason) => {
                shared.drop_transport(attempt, reason).await;
                return;
            }
        }
    }
    if let Some(shared) = weak.upgrade() {
        shared
            .drop_transport(attempt, "event stream closed".to_string())
            .await;
    }
}

/// Owns the lifecycle of one user's voice connection.
///
/// Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct SessionManager {
    shared: Arc<Shared>,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(
        config: ClientConfig,
        credentials: Arc<dyn CredentialSource>,
        connector: Arc<dyn RoomConnector>,
    ) -> Self {
        let (state_tx, _) = watch::channel(SessionSnapshot::default());
        let (notice_tx, _) = broadcast::channel(DEFAULT_NOTICE_BROADCAST_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                config,
                credentials,
                connector,
                inner: Mutex::new(Inner::default()),
                state_tx,
                notice_tx,
            }),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.shared.inner.lock().phase
    }

    pub fn conversation(&self) -> ConversationState {
        self.shared.inner.lock().tracker.current()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.state_tx.borrow().clone()
    }

    /// Latest snapshot, updated on every change.
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.state_tx.subscribe()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionNotice> {
        self.shared.notice_tx.subscribe()
    }

    /// Runs a full connect cycle for `ctx` with a freshly generated room.
    ///
    /// Rejected without side effects unless the session is `Disconnected`.
    /// Any failure leaves the session `Disconnected` and is returned.
    pub async fn connect(&self, ctx: &SessionContext) -> Result<ConnectOutcome, VoiceError> {
        let shared = &self.shared;
        let room = RoomName::generate();

        let attempt = {
            let mut inner = shared.inner.lock();
            if inner.phase != SessionPhase::Disconnected {
                debug!(current = %inner.phase, "connect rejected: session already active");
                return Ok(ConnectOutcome::Rejected {
                    current: inner.phase,
                });
            }
            inner.attempt += 1;
            inner.room = Some(room.clone());
            shared.transition(&mut inner, SessionPhase::Acquiring);
            inner.attempt
        };
        let _guard = AttemptGuard {
            shared: shared.as_ref(),
            attempt,
        };

        info!(attempt, room = %room, identity = %ctx.identity(), "acquiring session credential");
        let limit = shared.config.credential_timeout();
        let credential = match tokio::time::timeout(
            limit,
            shared.credentials.request(&room, ctx.identity()),
        )
        .await
        {
            Ok(Ok(credential)) => credential,
            Ok(Err(err)) => return shared.fail(attempt, err),
            Err(_) => {
                return shared.fail(
                    attempt,
                    VoiceError::Timeout {
                        stage: ConnectStage::Credential,
                        after: limit,
                    },
                )
            }
        };

        {
            let mut inner = shared.inner.lock();
            if inner.attempt != attempt {
                debug!(attempt, "discarding credential for a cancelled attempt");
                return Ok(ConnectOutcome::Cancelled);
            }
            shared.transition(&mut inner, SessionPhase::Establishing);
        }

        let options = JoinOptions::voice_only(ctx.voice().cloned());
        let limit = shared.config.handshake_timeout();
        let joined = match tokio::time::timeout(
            limit,
            shared
                .connector
                .join(&shared.config.livekit_url, &credential, options),
        )
        .await
        {
            Ok(Ok(joined)) => joined,
            Ok(Err(err)) => return shared.fail(attempt, err),
            Err(_) => {
                return shared.fail(
                    attempt,
                    VoiceError::Timeout {
                        stage: ConnectStage::Handshake,
                        after: limit,
                    },
                )
            }
        };

        let JoinedRoom { room: media, events } = joined;
        let media: Arc<dyn MediaRoom> = Arc::from(media);

        let stale = {
            let mut inner = shared.inner.lock();
            if inner.attempt != attempt {
                true
            } else {
                inner.handle = Some(ConnectionHandle::new(credential, media.clone()));
                inner.pump = Some(tokio::spawn(pump_events(
                    Arc::downgrade(shared),
                    attempt,
                    events,
                )));
                shared.transition(&mut inner, SessionPhase::Live);
                false
            }
        };

        if stale {
            debug!(attempt, "handshake completed after cancellation, closing room");
            media.close().await;
            return Ok(ConnectOutcome::Cancelled);
        }

        info!(attempt, room = %room, "voice session live");
        Ok(ConnectOutcome::Live { room })
    }

    /// Ends the session from any phase. A no-op when already disconnected.
    ///
    /// The conversation state is `Idle` as soon as this is called; the call
    /// returns once the media room has been released.
    pub async fn disconnect(&self) {
        let shared = &self.shared;
        let (teardown_attempt, handle) = {
            let mut inner = shared.inner.lock();
            match inner.phase {
                SessionPhase::Disconnected | SessionPhase::Disconnecting => {
                    debug!(phase = %inner.phase, "disconnect ignored");
                    return;
                }
                SessionPhase::Acquiring | SessionPhase::Establishing => {
                    inner.attempt += 1;
                    inner.room = None;
                    info!(attempt = inner.attempt, "connect attempt cancelled");
                    shared.transition(&mut inner, SessionPhase::Disconnected);
                    return;
                }
                SessionPhase::Live => {
                    inner.attempt += 1;
                    if let Some(pump) = inner.pump.take() {
                        pump.abort();
                    }
                    let handle = inner.handle.take();
                    shared.transition(&mut inner, SessionPhase::Disconnecting);
                    (inner.attempt, handle)
                }
            }
        };

        info!(attempt = teardown_attempt, "ending voice session");
        if let Some(handle) = handle {
            shared.release(handle).await;
        }
        shared.finish_teardown(teardown_attempt);
    }

    /// Enables or disables the local microphone on the live room.
    pub async fn set_microphone(&self, enabled: bool) -> Result<(), VoiceError> {
        let room = {
            let inner = self.shared.inner.lock();
            match (inner.phase, &inner.handle) {
                (SessionPhase::Live, Some(handle)) => handle.room.clone(),
                _ => return Err(VoiceError::NotConnected),
            }
        };
        room.set_microphone(enabled).await
    }

    /// Tracks on the live connection, if any.
    pub fn tracks(&self) -> Vec<AudioTrack> {
        self.shared
            .inner
            .lock()
            .handle
            .as_ref()
            .map(|h| h.tracks.clone())
            .unwrap_or_default()
    }
}
