//! Conversation state derivation.
//!
//! [`derive`] is a pure, total function from the latest signal values to one
//! of five states. [`ConversationTracker`] remembers only the last state it
//! emitted so callers can tell when something changed.

use crate::room::ConnectionStatus;
use std::fmt;

/// The discrete phase of the conversation shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConversationState {
    #[default]
    Idle,
    Connecting,
    Listening,
    Thinking,
    Speaking,
}

impl ConversationState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Listening => "listening",
            Self::Thinking => "thinking",
            Self::Speaking => "speaking",
        }
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latest known values of everything the state depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConversationSignals {
    pub connection: ConnectionStatus,
    /// A remote agent audio track is subscribed and not muted.
    pub agent_publishing: bool,
    /// The agent's processing flag, independent of audio presence.
    pub agent_processing: bool,
    /// The local microphone is enabled.
    pub microphone_live: bool,
}

/// Maps signals to a state. First match wins:
///
/// 1. not connected → `Idle`
/// 2. connecting → `Connecting`
/// 3. agent audio → `Speaking`
/// 4. agent processing → `Thinking`
/// 5. microphone live → `Listening`
/// 6. otherwise → `Idle`
pub fn derive(signals: &ConversationSignals) -> ConversationState {
    match signals.connection {
        ConnectionStatus::Disconnected | ConnectionStatus::Failed => ConversationState::Idle,
        ConnectionStatus::Connecting => ConversationState::Connecting,
        ConnectionStatus::Connected => {
            if signals.agent_publishing {
                ConversationState::Speaking
            } else if signals.agent_processing {
                ConversationState::Thinking
            } else if signals.microphone_live {
                ConversationState::Listening
            } else {
                ConversationState::Idle
            }
        }
    }
}

/// Holds the last emitted state and nothing else.
#[derive(Debug, Clone, Default)]
pub struct ConversationTracker {
    last: ConversationState,
}

impl ConversationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> ConversationState {
        self.last
    }

    /// Re-evaluates from `signals`; returns the new state if it changed.
    pub fn update(&mut self, signals: &ConversationSignals) -> Option<ConversationState> {
        self.emit(derive(signals))
    }

    /// Forces `Idle`; returns it if that is a change.
    pub fn reset(&mut self) -> Option<ConversationState> {
        self.emit(ConversationState::Idle)
    }

    fn emit(&mut self, next: ConversationState) -> Option<ConversationState> {
        if next == self.last {
            None
        } else {
            self.last = next;
            Some(next)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUSES: [ConnectionStatus; 4] = [
        ConnectionStatus::Disconnected,
        ConnectionStatus::Connecting,
        ConnectionStatus::Connected,
        ConnectionStatus::Failed,
    ];

    fn all_signals() -> impl Iterator<Item = ConversationSignals> {
        STATUSES.into_iter().flat_map(|connection| {
            (0u8..8).map(move |bits| ConversationSignals {
                connection,
                agent_publishing: bits & 1 != 0,
                agent_processing: bits & 2 != 0,
                microphone_live: bits & 4 != 0,
            })
        })
    }

    fn connected() -> ConversationSignals {
        ConversationSignals {
            connection: ConnectionStatus::Connected,
            ..Default::default()
        }
    }

    #[test]
    fn every_combination_follows_priority_order() {
        for signals in all_signals() {
            let expected = match signals.connection {
                ConnectionStatus::Disconnected | ConnectionStatus::Failed => {
                    ConversationState::Idle
                }
                ConnectionStatus::Connecting => ConversationState::Connecting,
                ConnectionStatus::Connected if signals.agent_publishing => {
                    ConversationState::Speaking
                }
                ConnectionStatus::Connected if signals.agent_processing => {
                    ConversationState::Thinking
                }
                ConnectionStatus::Connected if signals.microphone_live => {
                    ConversationState::Listening
                }
                ConnectionStatus::Connected => ConversationState::Idle,
            };
            assert_eq!(derive(&signals), expected, "signals: {:?}", signals);
            // Deterministic.
            assert_eq!(derive(&signals), derive(&signals));
        }
    }

    #[test]
    fn default_signals_are_idle() {
        assert_eq!(derive(&ConversationSignals::default()), ConversationState::Idle);
    }

    #[test]
    fn speaking_beats_a_stale_processing_flag() {
        let signals = ConversationSignals {
            agent_publishing: true,
            agent_processing: true,
            microphone_live: true,
            ..connected()
        };
        assert_eq!(derive(&signals), ConversationState::Speaking);
    }

    #[test]
    fn connecting_hides_agent_activity() {
        let signals = ConversationSignals {
            connection: ConnectionStatus::Connecting,
            agent_publishing: true,
            ..Default::default()
        };
        assert_eq!(derive(&signals), ConversationState::Connecting);
    }

    #[test]
    fn tracker_reports_only_changes() {
        let mut tracker = ConversationTracker::new();
        assert_eq!(tracker.update(&connected()), None);

        let thinking = ConversationSignals {
            agent_processing: true,
            ..connected()
        };
        assert_eq!(tracker.update(&thinking), Some(ConversationState::Thinking));
        assert_eq!(tracker.update(&thinking), None);
        assert_eq!(tracker.current(), ConversationState::Thinking);

        assert_eq!(tracker.reset(), Some(ConversationState::Idle));
        assert_eq!(tracker.reset(), None);
    }
}
