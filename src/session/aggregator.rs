use anyhow::anyhow;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{ArchivalFinalizer, SessionError};
use crate::db::{
    now_ts, NewParticipant, NewTranscriptLine, ParticipantRepository, SessionStore,
    TranscriptRepository,
};
use crate::events::{CanonicalEvent, EventBody, MeetingId};
use crate::notify::{Notification, Notifier};
use crate::sentiment::SentimentScorer;

const DEFAULT_TOPIC: &str = "Untitled Meeting";

/// Result of applying one event.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// State changed (or the event is purely informational) and this was published.
    Applied(Notification),
    /// Nothing changed and nothing was published.
    NoOp { reason: String },
}

/// Applies canonical events to the session store and publishes what changed.
pub struct SessionAggregator {
    store: Arc<SessionStore>,
    scorer: Arc<dyn SentimentScorer>,
    notifier: Arc<dyn Notifier>,
    finalizer: ArchivalFinalizer,
}

impl SessionAggregator {
    pub fn new(
        store: Arc<SessionStore>,
        scorer: Arc<dyn SentimentScorer>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let finalizer = ArchivalFinalizer::new(Arc::clone(&store));
        Self {
            store,
            scorer,
            notifier,
            finalizer,
        }
    }

    pub fn finalizer(&self) -> &ArchivalFinalizer {
        &self.finalizer
    }

    pub fn apply(&self, event: CanonicalEvent) -> Result<ApplyOutcome, SessionError> {
        let kind = event.kind();
        let meeting_id = event.meeting_id;

        let outcome = match event.body {
            EventBody::ParticipantJoined {
                participant_id,
                participant_name,
                timestamp,
            } => self.participant_joined(
                &meeting_id,
                &participant_id,
                participant_name,
                timestamp.unwrap_or_else(now_ts),
            )?,
            EventBody::ParticipantLeft {
                participant_id,
                timestamp,
            } => self.participant_left(
                &meeting_id,
                &participant_id,
                timestamp.unwrap_or_else(now_ts),
            )?,
            EventBody::TranscriptLine {
                participant_id,
                participant_name,
                text,
                timestamp,
                browser_tag,
            } => {
                let sentiment_score = self.scorer.score(&text);
                let line = self.store.with_connection(|conn| {
                    TranscriptRepository::insert(
                        conn,
                        &NewTranscriptLine {
                            meeting_id: meeting_id.as_str(),
                            participant_id: &participant_id,
                            participant_name: &participant_name,
                            text: &text,
                            timestamp: timestamp.unwrap_or_else(now_ts),
                            sentiment_score,
                            browser_tag: browser_tag.as_deref(),
                        },
                    )
                })?;

                ApplyOutcome::Applied(Notification::NewTranscription {
                    meeting_id: line.meeting_id,
                    id: line.id,
                    participant_id: line.participant_id,
                    participant_name: line.participant_name,
                    text: line.text,
                    timestamp: line.timestamp,
                    sentiment_score: line.sentiment_score,
                    browser_tag: line.browser_tag,
                })
            }
            EventBody::TalkTimeUpdate {
                participant_id,
                talk_time,
            } => {
                let updated = self.store.with_connection(|conn| {
                    ParticipantRepository::set_talk_time(
                        conn,
                        meeting_id.as_str(),
                        &participant_id,
                        talk_time,
                    )
                })?;

                if updated {
                    ApplyOutcome::Applied(Notification::TalkTimeUpdated {
                        meeting_id: meeting_id.to_string(),
                        participant_id,
                        talk_time,
                    })
                } else {
                    unknown_participant(&meeting_id, &participant_id)
                }
            }
            EventBody::ActiveStatusUpdate {
                participant_id,
                is_active,
                browser_tag,
            } => self.active_status_update(&meeting_id, participant_id, is_active, browser_tag)?,
            EventBody::MeetingStarted { topic } => {
                let topic = topic.unwrap_or_else(|| DEFAULT_TOPIC.to_string());
                info!("Meeting {} started: {}", meeting_id, topic);
                ApplyOutcome::Applied(Notification::MeetingStarted {
                    meeting_id: meeting_id.to_string(),
                    topic,
                })
            }
            EventBody::MeetingEnded => {
                let archive = self.finalizer.finalize(&meeting_id)?;
                ApplyOutcome::Applied(Notification::MeetingEnded {
                    meeting_id: archive.meeting_id,
                    participant_count: archive.participant_data.len(),
                    transcript_line_count: archive.transcript_data.len(),
                })
            }
        };

        match &outcome {
            ApplyOutcome::Applied(notification) => {
                debug!("Applied {} for meeting {}", kind.as_str(), meeting_id);
                self.notifier.notify(notification.clone());
            }
            ApplyOutcome::NoOp { reason } => {
                info!("Ignored {} for meeting {}: {}", kind.as_str(), meeting_id, reason);
            }
        }

        Ok(outcome)
    }

    fn participant_joined(
        &self,
        meeting_id: &MeetingId,
        participant_id: &str,
        participant_name: Option<String>,
        join_time: DateTime<Utc>,
    ) -> Result<ApplyOutcome, SessionError> {
        let name = participant_name.unwrap_or_else(|| placeholder_name(participant_id));

        let outcome = self.store.with_transaction(|tx| {
            let inserted = ParticipantRepository::insert_if_absent(
                tx,
                &NewParticipant {
                    meeting_id: meeting_id.as_str(),
                    participant_id,
                    participant_name: &name,
                    join_time,
                    is_active: true,
                    browser_tag: None,
                },
            )?;

            let existing = ParticipantRepository::get(tx, meeting_id.as_str(), participant_id)?
                .ok_or_else(|| anyhow!("Participant {} missing after insert", participant_id))?;

            if !inserted && existing.is_active {
                return Ok(ApplyOutcome::NoOp {
                    reason: format!("participant {} already joined", participant_id),
                });
            }

            if !inserted {
                ParticipantRepository::set_active(
                    tx,
                    meeting_id.as_str(),
                    participant_id,
                    true,
                    None,
                )?;
            }

            Ok(ApplyOutcome::Applied(Notification::ParticipantJoined {
                meeting_id: existing.meeting_id,
                participant_id: existing.participant_id,
                participant_name: existing.participant_name,
                join_time: existing.join_time,
                is_active: true,
            }))
        })?;

        Ok(outcome)
    }

    fn participant_left(
        &self,
        meeting_id: &MeetingId,
        participant_id: &str,
        leave_time: DateTime<Utc>,
    ) -> Result<ApplyOutcome, SessionError> {
        let outcome = self.store.with_transaction(|tx| {
            let Some(participant) =
                ParticipantRepository::get(tx, meeting_id.as_str(), participant_id)?
            else {
                return Ok(unknown_participant(meeting_id, participant_id));
            };

            let mut duration = (leave_time - participant.join_time).num_seconds();
            let ordering_anomaly = duration < 0;
            if ordering_anomaly {
                warn!(
                    "Leave for participant {} in meeting {} precedes join ({} < {}), clamping duration to 0",
                    participant_id, meeting_id, leave_time, participant.join_time
                );
                duration = 0;
            }

            ParticipantRepository::record_leave(
                tx,
                meeting_id.as_str(),
                participant_id,
                &leave_time,
                duration,
                ordering_anomaly,
            )?;

            Ok(ApplyOutcome::Applied(Notification::ParticipantLeft {
                meeting_id: participant.meeting_id,
                participant_id: participant.participant_id,
                participant_name: participant.participant_name,
                leave_time,
                duration,
                ordering_anomaly: ordering_anomaly || participant.ordering_anomaly,
            }))
        })?;

        Ok(outcome)
    }

    fn active_status_update(
        &self,
        meeting_id: &MeetingId,
        participant_id: String,
        is_active: bool,
        browser_tag: Option<String>,
    ) -> Result<ApplyOutcome, SessionError> {
        let browser_tag = self.store.with_transaction(|tx| {
            let name = placeholder_name(&participant_id);
            let inserted = ParticipantRepository::insert_if_absent(
                tx,
                &NewParticipant {
                    meeting_id: meeting_id.as_str(),
                    participant_id: &participant_id,
                    participant_name: &name,
                    join_time: now_ts(),
                    is_active,
                    browser_tag: browser_tag.as_deref(),
                },
            )?;

            if inserted {
                debug!(
                    "Created participant {} in meeting {} from status update",
                    participant_id, meeting_id
                );
            } else {
                ParticipantRepository::set_active(
                    tx,
                    meeting_id.as_str(),
                    &participant_id,
                    is_active,
                    browser_tag.as_deref(),
                )?;
            }

            let stored = ParticipantRepository::get(tx, meeting_id.as_str(), &participant_id)?;
            Ok(stored.and_then(|p| p.browser_tag))
        })?;

        Ok(ApplyOutcome::Applied(Notification::ParticipantStatusChange {
            meeting_id: meeting_id.to_string(),
            participant_id,
            is_active,
            browser_tag,
        }))
    }
}

fn placeholder_name(participant_id: &str) -> String {
    format!("Participant {}", participant_id)
}

fn unknown_participant(meeting_id: &MeetingId, participant_id: &str) -> ApplyOutcome {
    ApplyOutcome::NoOp {
        reason: format!(
            "participant {} not found in meeting {}",
            participant_id, meeting_id
        ),
    }
}
