//! Wire shapes accepted at the edge, before normalization.
//!
//! Every field is optional so that malformed payloads reach the normalizer
//! and get a validation message instead of a deserializer rejection.

use serde::Deserialize;

/// Identifier that may arrive as a JSON string or number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LooseId {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl LooseId {
    pub fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Integer(n) => n.to_string(),
            Self::Float(n) => n.to_string(),
        }
    }
}

/// Timestamp as text (ISO-8601) or epoch milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Text(String),
    Millis(i64),
}

/// Platform webhook: `{"event": "meeting.participant_joined", "payload": {"object": {...}}}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WebhookPayload {
    pub event: Option<String>,
    pub event_ts: Option<i64>,
    pub payload: WebhookEnvelope,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WebhookEnvelope {
    pub object: WebhookObject,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WebhookObject {
    pub id: Option<LooseId>,
    pub topic: Option<String>,
    pub participant: Option<WebhookParticipant>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WebhookParticipant {
    pub id: Option<LooseId>,
    pub user_id: Option<LooseId>,
    pub user_name: Option<String>,
    pub join_time: Option<RawTimestamp>,
    pub leave_time: Option<RawTimestamp>,
}

/// Caption submitted by a dashboard client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TranscriptionSubmission {
    pub meeting_id: Option<LooseId>,
    pub participant_id: Option<LooseId>,
    pub participant_name: Option<String>,
    pub transcript: Option<String>,
    pub timestamp: Option<RawTimestamp>,
    pub browser_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TalkTimeSubmission {
    pub meeting_id: Option<LooseId>,
    pub participant_id: Option<LooseId>,
    pub talk_time: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActiveStatusSubmission {
    pub meeting_id: Option<LooseId>,
    pub participant_id: Option<LooseId>,
    pub is_active: Option<bool>,
    pub browser_id: Option<String>,
}

/// Flat event tagged by `kind`, one field set per canonical kind.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DirectEvent {
    pub kind: Option<String>,
    pub meeting_id: Option<LooseId>,
    pub participant_id: Option<LooseId>,
    pub participant_name: Option<String>,
    pub text: Option<String>,
    pub timestamp: Option<RawTimestamp>,
    pub browser_tag: Option<String>,
    pub talk_time: Option<f64>,
    pub is_active: Option<bool>,
    pub topic: Option<String>,
}
