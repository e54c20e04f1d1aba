//! Read-side views over live and archived meetings.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use super::SessionError;
use crate::db::{
    ArchiveRepository, ArchiveSummary, FinalArchive, Participant, ParticipantRepository,
    SessionStore, TranscriptLine, TranscriptRepository,
};
use crate::events::MeetingId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingStatus {
    /// Nothing recorded for this meeting.
    Unknown,
    /// Live rows exist, no archive yet.
    Active,
    /// An archive exists.
    Ended,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeetingSummary {
    pub meeting_id: String,
    pub status: MeetingStatus,
    pub participant_count: i64,
    pub start_time: Option<DateTime<Utc>>,
    pub transcript_line_count: i64,
}

/// Best available transcript for a meeting.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptView {
    Final(FinalArchive),
    Live(Vec<TranscriptLine>),
}

impl TranscriptView {
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Final(_))
    }

    pub fn lines(&self) -> &[TranscriptLine] {
        match self {
            Self::Final(archive) => &archive.transcript_data,
            Self::Live(lines) => lines,
        }
    }
}

#[derive(Clone)]
pub struct SessionQueries {
    store: Arc<SessionStore>,
}

impl SessionQueries {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    pub fn meeting_summary(&self, meeting_id: &MeetingId) -> Result<MeetingSummary, SessionError> {
        let id = meeting_id.as_str();
        let summary = self.store.with_transaction(|tx| {
            let participant_count = ParticipantRepository::count_distinct(tx, id)?;
            let transcript_line_count = TranscriptRepository::count_for_meeting(tx, id)?;
            let start_time = ParticipantRepository::earliest_join(tx, id)?;

            let status = if ArchiveRepository::exists(tx, id)? {
                MeetingStatus::Ended
            } else if participant_count > 0 || transcript_line_count > 0 {
                MeetingStatus::Active
            } else {
                MeetingStatus::Unknown
            };

            Ok(MeetingSummary {
                meeting_id: id.to_string(),
                status,
                participant_count,
                start_time,
                transcript_line_count,
            })
        })?;

        Ok(summary)
    }

    /// Lines recorded so far, oldest first.
    pub fn live_transcript(
        &self,
        meeting_id: &MeetingId,
    ) -> Result<Vec<TranscriptLine>, SessionError> {
        Ok(self
            .store
            .with_connection(|conn| TranscriptRepository::list_for_meeting(conn, meeting_id.as_str()))?)
    }

    pub fn final_transcript(&self, meeting_id: &MeetingId) -> Result<FinalArchive, SessionError> {
        self.store
            .with_connection(|conn| ArchiveRepository::get(conn, meeting_id.as_str()))?
            .ok_or_else(|| not_found(meeting_id))
    }

    /// Final archive when there is one, otherwise the live lines.
    pub fn transcript(&self, meeting_id: &MeetingId) -> Result<TranscriptView, SessionError> {
        match self.final_transcript(meeting_id) {
            Ok(archive) => Ok(TranscriptView::Final(archive)),
            Err(SessionError::NotFound(_)) => {
                Ok(TranscriptView::Live(self.live_transcript(meeting_id)?))
            }
            Err(err) => Err(err),
        }
    }

    /// Talk-time leaderboard; earlier joiners win ties.
    pub fn participants(&self, meeting_id: &MeetingId) -> Result<Vec<Participant>, SessionError> {
        Ok(self
            .store
            .with_connection(|conn| ParticipantRepository::list_by_talk_time(conn, meeting_id.as_str()))?)
    }

    /// Drop the archive. Live rows stay.
    pub fn delete_archive(&self, meeting_id: &MeetingId) -> Result<(), SessionError> {
        let deleted = self
            .store
            .with_connection(|conn| ArchiveRepository::delete(conn, meeting_id.as_str()))?;
        if !deleted {
            return Err(not_found(meeting_id));
        }

        info!("Deleted archive for meeting {}", meeting_id);
        Ok(())
    }

    pub fn list_archives(
        &self,
        query: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ArchiveSummary>, SessionError> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        let archives = self
            .store
            .with_connection(|conn| ArchiveRepository::list(conn, query, limit))
            .context("Failed to list archives")?;
        Ok(archives)
    }
}

fn not_found(meeting_id: &MeetingId) -> SessionError {
    SessionError::NotFound(format!("No transcript found for meeting {}", meeting_id))
}
