//! Projection of session state onto something drawable.
//!
//! Nothing here feeds back into the session; a UI can replace this module
//! wholesale.

use crate::conversation::ConversationState;
use crate::room::AudioActivitySample;
use crate::session::{SessionPhase, SessionSnapshot};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;

/// Number of bars drawn by [`BarMeter::default`].
pub const DEFAULT_METER_BARS: usize = 5;

/// Lowest bar height drawn by [`BarMeter::default`].
pub const DEFAULT_METER_FLOOR: f32 = 0.1;

/// Named visual theme for the status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Ready,
    Connecting,
    Listening,
    Thinking,
    Speaking,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Connecting => "connecting",
            Self::Listening => "listening",
            Self::Thinking => "thinking",
            Self::Speaking => "speaking",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusDescriptor {
    pub label: &'static str,
    pub theme: Theme,
}

/// Fixed label and theme for each conversation state.
pub fn describe(state: ConversationState) -> StatusDescriptor {
    let (label, theme) = match state {
        ConversationState::Idle => ("Ready", Theme::Ready),
        ConversationState::Connecting => ("Connecting…", Theme::Connecting),
        ConversationState::Listening => ("Listening", Theme::Listening),
        ConversationState::Thinking => ("Thinking…", Theme::Thinking),
        ConversationState::Speaking => ("AI Speaking", Theme::Speaking),
    };
    StatusDescriptor { label, theme }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Indicator {
    pub animated: bool,
    pub theme: Theme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MicIndicator {
    pub enabled: bool,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenderModel {
    pub status: StatusDescriptor,
    pub indicator: Indicator,
    pub microphone: MicIndicator,
}

/// Builds the render model for a snapshot.
///
/// The indicator animates whenever the conversation is not idle. The
/// microphone indicator is shown only while a session is live.
pub fn render(snapshot: &SessionSnapshot) -> RenderModel {
    let status = describe(snapshot.conversation);
    let live = snapshot.phase == SessionPhase::Live;
    RenderModel {
        status,
        indicator: Indicator {
            animated: snapshot.conversation != ConversationState::Idle,
            theme: status.theme,
        },
        microphone: MicIndicator {
            enabled: live && snapshot.microphone_enabled,
            visible: live,
        },
    }
}

/// Bounded window of recent audio samples, oldest first.
#[derive(Debug, Clone)]
pub struct LevelHistory {
    capacity: usize,
    samples: VecDeque<AudioActivitySample>,
}

impl LevelHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, sample: AudioActivitySample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &AudioActivitySample> {
        self.samples.iter()
    }
}

/// Maps audio samples to a fixed number of bar heights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarMeter {
    bars: usize,
    min_height: f32,
}

impl Default for BarMeter {
    fn default() -> Self {
        Self {
            bars: DEFAULT_METER_BARS,
            min_height: DEFAULT_METER_FLOOR,
        }
    }
}

impl BarMeter {
    /// At least one bar; the floor is clamped to `[0, 1]`.
    pub fn new(bars: usize, min_height: f32) -> Self {
        let min_height = if min_height.is_finite() {
            min_height.clamp(0.0, 1.0)
        } else {
            DEFAULT_METER_FLOOR
        };
        Self {
            bars: bars.max(1),
            min_height,
        }
    }

    pub fn bars(&self) -> usize {
        self.bars
    }

    pub fn min_height(&self) -> f32 {
        self.min_height
    }

    /// Splits the samples into `bars` contiguous buckets and averages each.
    ///
    /// Always returns exactly `bars` values in `[min_height, 1.0]`; empty
    /// buckets sit at the floor.
    pub fn heights<'a, I>(&self, samples: I) -> Vec<f32>
    where
        I: IntoIterator<Item = &'a AudioActivitySample>,
    {
        let levels: Vec<f32> = samples
            .into_iter()
            .map(|s| if s.level.is_finite() { s.level } else { 0.0 })
            .collect();

        (0..self.bars)
            .map(|i| {
                let start = i * levels.len() / self.bars;
                let end = (i + 1) * levels.len() / self.bars;
                let bucket = &levels[start..end];
                if bucket.is_empty() {
                    return self.min_height;
                }
                let mean = bucket.iter().sum::<f32>() / bucket.len() as f32;
                mean.clamp(self.min_height, 1.0)
            })
            .collect()
    }
}
