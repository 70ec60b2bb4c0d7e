//! Session and transcript records shown by the admin console.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a recorded voice session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Active,
    Ended,
}

/// Author of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// One utterance in a session transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub id: Uuid,
    pub role: MessageRole,
    pub content: String,
    /// Agent that produced the reply, for assistant messages.
    #[serde(default)]
    pub agent_id: Option<Uuid>,
    #[serde(default)]
    pub tools_used: Vec<String>,
    #[serde(default)]
    pub audio_duration_ms: Option<u64>,
    pub created_at: DateTime<Utc>,
}

/// A voice session with its ordered transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: Uuid,
    pub participant_identity: Option<String>,
    pub room_name: Option<String>,
    #[serde(default)]
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub message_count: u32,
    #[serde(default)]
    pub messages: Vec<TranscriptMessage>,
}

impl SessionRecord {
    /// Wall-clock length of the session, if it has ended.
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.ended_at.map(|end| end - self.started_at)
    }

    /// Messages in chronological order.
    pub fn ordered_messages(&self) -> Vec<&TranscriptMessage> {
        let mut messages: Vec<_> = self.messages.iter().collect();
        messages.sort_by_key(|m| m.created_at);
        messages
    }
}

/// A page of session summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPage {
    pub items: Vec<SessionRecord>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn message(role: MessageRole, content: &str, minute: u32) -> TranscriptMessage {
        TranscriptMessage {
            id: Uuid::new_v4(),
            role,
            content: content.to_string(),
            agent_id: None,
            tools_used: Vec::new(),
            audio_duration_ms: None,
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, minute, 0).unwrap(),
        }
    }

    #[test]
    fn session_defaults_when_fields_missing() {
        let raw = json!({
            "id": Uuid::nil(),
            "participant_identity": "Ada",
            "room_name": "voice-1",
            "started_at": "2025-03-01T12:00:00Z",
            "ended_at": null
        });
        let record: SessionRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(record.status, SessionStatus::Active);
        assert!(record.messages.is_empty());
        assert_eq!(record.duration(), None);
    }

    #[test]
    fn ordered_messages_sorts_by_timestamp() {
        let record = SessionRecord {
            id: Uuid::new_v4(),
            participant_identity: Some("Ada".to_string()),
            room_name: Some("voice-2".to_string()),
            status: SessionStatus::Ended,
            started_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
            ended_at: Some(Utc.with_ymd_and_hms(2025, 3, 1, 12, 10, 0).unwrap()),
            message_count: 2,
            messages: vec![
                message(MessageRole::Assistant, "Hi Ada", 2),
                message(MessageRole::User, "Hello", 1),
            ],
        };

        let ordered = record.ordered_messages();
        assert_eq!(ordered[0].content, "Hello");
        assert_eq!(ordered[1].role, MessageRole::Assistant);
        assert_eq!(record.duration(), Some(chrono::Duration::minutes(10)));
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_value(SessionStatus::Ended).unwrap(), "ended");
    }
}
