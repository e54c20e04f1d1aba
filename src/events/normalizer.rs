//! Maps inbound payloads onto [`CanonicalEvent`].
//!
//! Pure: no I/O, no clock. Anything that cannot become a canonical event is a
//! [`ValidationError`], which the HTTP boundary acknowledges as "ignored".

use chrono::{DateTime, Datelike, NaiveDateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::canonical::{CanonicalEvent, EventBody, MeetingId};
use super::inbound::{
    ActiveStatusSubmission, DirectEvent, LooseId, RawTimestamp, TalkTimeSubmission,
    TranscriptionSubmission, WebhookPayload,
};

/// Inbound event rejected before reaching the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// An inbound payload tagged with the route it arrived on.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    Webhook(Value),
    Direct(Value),
    Transcription(Value),
    TalkTime(Value),
    ActiveStatus(Value),
}

impl InboundEvent {
    pub fn source(&self) -> &'static str {
        match self {
            Self::Webhook(_) => "webhook",
            Self::Direct(_) => "direct",
            Self::Transcription(_) => "transcription",
            Self::TalkTime(_) => "talk_time",
            Self::ActiveStatus(_) => "active_status",
        }
    }
}

pub fn normalize(inbound: InboundEvent) -> Result<CanonicalEvent, ValidationError> {
    let source = inbound.source();
    let event = match inbound {
        InboundEvent::Webhook(value) => from_webhook(decode(value)?),
        InboundEvent::Direct(value) => from_direct(decode(value)?),
        InboundEvent::Transcription(value) => from_transcription(decode(value)?),
        InboundEvent::TalkTime(value) => from_talk_time(decode(value)?),
        InboundEvent::ActiveStatus(value) => from_active_status(decode(value)?),
    }?;

    debug!(
        "Normalized {} payload into {} for meeting {}",
        source,
        event.kind().as_str(),
        event.meeting_id
    );
    Ok(event)
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ValidationError> {
    serde_json::from_value(value)
        .map_err(|e| ValidationError::new(format!("Malformed payload: {}", e)))
}

pub fn from_webhook(webhook: WebhookPayload) -> Result<CanonicalEvent, ValidationError> {
    let event_type = webhook
        .event
        .ok_or_else(|| ValidationError::new("Missing event type"))?;
    let object = webhook.payload.object;
    let meeting_id = meeting_id(object.id)?;

    let body = match event_type.as_str() {
        "meeting.started" => EventBody::MeetingStarted {
            topic: non_blank(object.topic),
        },
        "meeting.ended" => EventBody::MeetingEnded,
        "meeting.participant_joined" | "meeting.participant_left" => {
            let participant = object
                .participant
                .ok_or_else(|| ValidationError::new("Missing participant object"))?;
            let participant_id = required_id(
                participant.id.or(participant.user_id),
                "participant.id",
            )?;

            if event_type == "meeting.participant_joined" {
                EventBody::ParticipantJoined {
                    participant_id,
                    participant_name: non_blank(participant.user_name),
                    timestamp: optional_timestamp(participant.join_time)?,
                }
            } else {
                EventBody::ParticipantLeft {
                    participant_id,
                    timestamp: optional_timestamp(participant.leave_time)?,
                }
            }
        }
        other => {
            return Err(ValidationError::new(format!(
                "Unrecognized event kind: {}",
                other
            )))
        }
    };

    Ok(CanonicalEvent::new(meeting_id, body))
}

pub fn from_direct(event: DirectEvent) -> Result<CanonicalEvent, ValidationError> {
    let kind = event
        .kind
        .ok_or_else(|| ValidationError::new("Missing event kind"))?;
    let meeting_id = meeting_id(event.meeting_id)?;

    let body = match kind.as_str() {
        "participant_joined" => EventBody::ParticipantJoined {
            participant_id: required_id(event.participant_id, "participant_id")?,
            participant_name: non_blank(event.participant_name),
            timestamp: optional_timestamp(event.timestamp)?,
        },
        "participant_left" => EventBody::ParticipantLeft {
            participant_id: required_id(event.participant_id, "participant_id")?,
            timestamp: optional_timestamp(event.timestamp)?,
        },
        "meeting_started" => EventBody::MeetingStarted {
            topic: non_blank(event.topic),
        },
        "meeting_ended" => EventBody::MeetingEnded,
        "transcript_line" => EventBody::TranscriptLine {
            participant_id: required_id(event.participant_id, "participant_id")?,
            participant_name: required_text(event.participant_name, "participant_name")?,
            text: required_text(event.text, "text")?,
            timestamp: optional_timestamp(event.timestamp)?,
            browser_tag: non_blank(event.browser_tag),
        },
        "talk_time_update" => EventBody::TalkTimeUpdate {
            participant_id: required_id(event.participant_id, "participant_id")?,
            talk_time: talk_time(event.talk_time)?,
        },
        "active_status_update" => EventBody::ActiveStatusUpdate {
            participant_id: required_id(event.participant_id, "participant_id")?,
            is_active: event
                .is_active
                .ok_or_else(|| ValidationError::new("Missing required field: is_active"))?,
            browser_tag: non_blank(event.browser_tag),
        },
        other => {
            return Err(ValidationError::new(format!(
                "Unrecognized event kind: {}",
                other
            )))
        }
    };

    Ok(CanonicalEvent::new(meeting_id, body))
}

pub fn from_transcription(
    submission: TranscriptionSubmission,
) -> Result<CanonicalEvent, ValidationError> {
    Ok(CanonicalEvent::new(
        meeting_id(submission.meeting_id)?,
        EventBody::TranscriptLine {
            participant_id: required_id(submission.participant_id, "participant_id")?,
            participant_name: required_text(submission.participant_name, "participant_name")?,
            text: required_text(submission.transcript, "transcript")?,
            timestamp: optional_timestamp(submission.timestamp)?,
            browser_tag: non_blank(submission.browser_id),
        },
    ))
}

pub fn from_talk_time(submission: TalkTimeSubmission) -> Result<CanonicalEvent, ValidationError> {
    Ok(CanonicalEvent::new(
        meeting_id(submission.meeting_id)?,
        EventBody::TalkTimeUpdate {
            participant_id: required_id(submission.participant_id, "participant_id")?,
            talk_time: talk_time(submission.talk_time)?,
        },
    ))
}

pub fn from_active_status(
    submission: ActiveStatusSubmission,
) -> Result<CanonicalEvent, ValidationError> {
    Ok(CanonicalEvent::new(
        meeting_id(submission.meeting_id)?,
        EventBody::ActiveStatusUpdate {
            participant_id: required_id(submission.participant_id, "participant_id")?,
            is_active: submission
                .is_active
                .ok_or_else(|| ValidationError::new("Missing required field: is_active"))?,
            browser_tag: non_blank(submission.browser_id),
        },
    ))
}

fn meeting_id(raw: Option<LooseId>) -> Result<MeetingId, ValidationError> {
    raw.map(LooseId::into_string)
        .as_deref()
        .and_then(MeetingId::parse)
        .ok_or_else(|| ValidationError::new("Missing required field: meeting_id"))
}

fn required_id(raw: Option<LooseId>, field: &str) -> Result<String, ValidationError> {
    required_text(raw.map(LooseId::into_string), field)
}

fn required_text(raw: Option<String>, field: &str) -> Result<String, ValidationError> {
    non_blank(raw).ok_or_else(|| ValidationError::new(format!("Missing required field: {}", field)))
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn talk_time(raw: Option<f64>) -> Result<i64, ValidationError> {
    let seconds = raw.ok_or_else(|| ValidationError::new("Missing required field: talk_time"))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(ValidationError::new(format!(
            "talk_time must be a non-negative number of seconds, got {}",
            seconds
        )));
    }
    Ok(seconds.floor() as i64)
}

fn optional_timestamp(raw: Option<RawTimestamp>) -> Result<Option<DateTime<Utc>>, ValidationError> {
    match raw {
        None => Ok(None),
        Some(RawTimestamp::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(raw) => parse_timestamp(&raw).map(Some),
    }
}

/// Accepts RFC 3339, naive ISO-8601 (taken as UTC) and epoch milliseconds.
///
/// Only years 0000 through 9999 are accepted; the store keeps timestamps as
/// fixed-width text and cannot represent anything outside that range.
pub fn parse_timestamp(raw: &RawTimestamp) -> Result<DateTime<Utc>, ValidationError> {
    let parsed = match raw {
        RawTimestamp::Millis(ms) => Utc
            .timestamp_millis_opt(*ms)
            .single()
            .ok_or_else(|| ValidationError::new(format!("Timestamp out of range: {}", ms)))?,
        RawTimestamp::Text(text) => parse_text_timestamp(text.trim())?,
    };

    if !(0..=9999).contains(&parsed.year()) {
        return Err(ValidationError::new(format!(
            "Timestamp out of range: year {}",
            parsed.year()
        )));
    }
    Ok(parsed)
}

fn parse_text_timestamp(text: &str) -> Result<DateTime<Utc>, ValidationError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(ValidationError::new(format!("Unparsable timestamp: {}", text)))
}
