use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform meeting identifier with all whitespace removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeetingId(String);

impl MeetingId {
    /// Strip every whitespace character. Returns None if nothing is left.
    pub fn parse(raw: &str) -> Option<Self> {
        let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        if cleaned.is_empty() {
            None
        } else {
            Some(Self(cleaned))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MeetingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ParticipantJoined,
    ParticipantLeft,
    MeetingStarted,
    MeetingEnded,
    TranscriptLine,
    TalkTimeUpdate,
    ActiveStatusUpdate,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParticipantJoined => "participant_joined",
            Self::ParticipantLeft => "participant_left",
            Self::MeetingStarted => "meeting_started",
            Self::MeetingEnded => "meeting_ended",
            Self::TranscriptLine => "transcript_line",
            Self::TalkTimeUpdate => "talk_time_update",
            Self::ActiveStatusUpdate => "active_status_update",
        }
    }
}

/// Kind-specific payload of a canonical event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventBody {
    ParticipantJoined {
        participant_id: String,
        participant_name: Option<String>,
        timestamp: Option<DateTime<Utc>>,
    },
    ParticipantLeft {
        participant_id: String,
        timestamp: Option<DateTime<Utc>>,
    },
    MeetingStarted {
        topic: Option<String>,
    },
    MeetingEnded,
    TranscriptLine {
        participant_id: String,
        participant_name: String,
        text: String,
        timestamp: Option<DateTime<Utc>>,
        browser_tag: Option<String>,
    },
    TalkTimeUpdate {
        participant_id: String,
        talk_time: i64,
    },
    ActiveStatusUpdate {
        participant_id: String,
        is_active: bool,
        browser_tag: Option<String>,
    },
}

/// An inbound event after normalization, ready for the aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalEvent {
    pub meeting_id: MeetingId,
    pub body: EventBody,
}

impl CanonicalEvent {
    pub fn new(meeting_id: MeetingId, body: EventBody) -> Self {
        Self { meeting_id, body }
    }

    pub fn kind(&self) -> EventKind {
        match &self.body {
            EventBody::ParticipantJoined { .. } => EventKind::ParticipantJoined,
            EventBody::ParticipantLeft { .. } => EventKind::ParticipantLeft,
            EventBody::MeetingStarted { .. } => EventKind::MeetingStarted,
            EventBody::MeetingEnded => EventKind::MeetingEnded,
            EventBody::TranscriptLine { .. } => EventKind::TranscriptLine,
            EventBody::TalkTimeUpdate { .. } => EventKind::TalkTimeUpdate,
            EventBody::ActiveStatusUpdate { .. } => EventKind::ActiveStatusUpdate,
        }
    }

    pub fn participant_id(&self) -> Option<&str> {
        match &self.body {
            EventBody::ParticipantJoined { participant_id, .. }
            | EventBody::ParticipantLeft { participant_id, .. }
            | EventBody::TranscriptLine { participant_id, .. }
            | EventBody::TalkTimeUpdate { participant_id, .. }
            | EventBody::ActiveStatusUpdate { participant_id, .. } => Some(participant_id.as_str()),
            EventBody::MeetingStarted { .. } | EventBody::MeetingEnded => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meeting_id_strips_all_whitespace() {
        let id = MeetingId::parse(" 812 3456\t7890 ").unwrap();
        assert_eq!(id.as_str(), "81234567890");
        assert_eq!(id.to_string(), "81234567890");
    }

    #[test]
    fn test_blank_meeting_id_rejected() {
        assert!(MeetingId::parse("").is_none());
        assert!(MeetingId::parse("   \n").is_none());
    }

    #[test]
    fn test_kind_and_participant_accessors() {
        let id = MeetingId::parse("m1").unwrap();
        let event = CanonicalEvent::new(
            id.clone(),
            EventBody::TalkTimeUpdate {
                participant_id: "p1".to_string(),
                talk_time: 5,
            },
        );
        assert_eq!(event.kind(), EventKind::TalkTimeUpdate);
        assert_eq!(event.kind().as_str(), "talk_time_update");
        assert_eq!(event.participant_id(), Some("p1"));

        let ended = CanonicalEvent::new(id, EventBody::MeetingEnded);
        assert_eq!(ended.kind(), EventKind::MeetingEnded);
        assert_eq!(ended.participant_id(), None);
    }
}
