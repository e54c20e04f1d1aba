//! Change notifications fanned out to dashboard subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// One state change, tagged by `event` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Notification {
    ParticipantJoined {
        meeting_id: String,
        participant_id: String,
        participant_name: String,
        join_time: DateTime<Utc>,
        is_active: bool,
    },
    ParticipantLeft {
        meeting_id: String,
        participant_id: String,
        participant_name: String,
        leave_time: DateTime<Utc>,
        duration: i64,
        ordering_anomaly: bool,
    },
    NewTranscription {
        meeting_id: String,
        id: i64,
        participant_id: String,
        participant_name: String,
        text: String,
        timestamp: DateTime<Utc>,
        sentiment_score: f64,
        browser_tag: Option<String>,
    },
    TalkTimeUpdated {
        meeting_id: String,
        participant_id: String,
        talk_time: i64,
    },
    ParticipantStatusChange {
        meeting_id: String,
        participant_id: String,
        is_active: bool,
        browser_tag: Option<String>,
    },
    MeetingStarted {
        meeting_id: String,
        topic: String,
    },
    MeetingEnded {
        meeting_id: String,
        participant_count: usize,
        transcript_line_count: usize,
    },
}

impl Notification {
    pub fn meeting_id(&self) -> &str {
        match self {
            Self::ParticipantJoined { meeting_id, .. }
            | Self::ParticipantLeft { meeting_id, .. }
            | Self::NewTranscription { meeting_id, .. }
            | Self::TalkTimeUpdated { meeting_id, .. }
            | Self::ParticipantStatusChange { meeting_id, .. }
            | Self::MeetingStarted { meeting_id, .. }
            | Self::MeetingEnded { meeting_id, .. } => meeting_id,
        }
    }

    /// Wire name, also used as the SSE event type.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::ParticipantJoined { .. } => "participant_joined",
            Self::ParticipantLeft { .. } => "participant_left",
            Self::NewTranscription { .. } => "new_transcription",
            Self::TalkTimeUpdated { .. } => "talk_time_updated",
            Self::ParticipantStatusChange { .. } => "participant_status_change",
            Self::MeetingStarted { .. } => "meeting_started",
            Self::MeetingEnded { .. } => "meeting_ended",
        }
    }
}

/// Sink for change notifications. Delivery is best effort and never fails the caller.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Fan-out over a tokio broadcast channel.
///
/// Slow subscribers lag and lose the oldest messages once `capacity` is exceeded.
#[derive(Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, notification: Notification) {
        let event = notification.event_name();
        match self.tx.send(notification) {
            Ok(receivers) => debug!("Broadcast {} to {} subscriber(s)", event, receivers),
            Err(_) => debug!("No subscribers for {}", event),
        }
    }
}
