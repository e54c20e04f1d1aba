//! Row types for the session store.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// Canonical on-disk timestamp: RFC 3339, UTC, millisecond precision.
///
/// Fixed width, so lexical ordering in SQLite matches chronological ordering.
pub fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time, truncated to the precision the store keeps.
pub fn now_ts() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

pub fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Invalid stored timestamp: {}", raw))
}

fn decode_ts(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn ts_column(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    decode_ts(idx, &raw)
}

fn opt_ts_column(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|value| decode_ts(idx, &value)).transpose()
}

/// One attendee's presence record within one meeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub meeting_id: String,
    pub participant_id: String,
    pub participant_name: String,
    pub join_time: DateTime<Utc>,
    pub leave_time: Option<DateTime<Utc>>,
    /// Seconds between join and leave, never negative.
    pub duration: i64,
    /// Running total reported by the client, in seconds.
    pub talk_time: i64,
    pub is_active: bool,
    pub browser_tag: Option<String>,
    /// Set when a leave arrived before the stored join and the duration was clamped.
    pub ordering_anomaly: bool,
}

impl Participant {
    pub(crate) const COLUMNS: &'static str = "meeting_id, participant_id, participant_name, \
         join_time, leave_time, duration, talk_time, is_active, browser_tag, ordering_anomaly";

    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            meeting_id: row.get(0)?,
            participant_id: row.get(1)?,
            participant_name: row.get(2)?,
            join_time: ts_column(row, 3)?,
            leave_time: opt_ts_column(row, 4)?,
            duration: row.get(5)?,
            talk_time: row.get(6)?,
            is_active: row.get(7)?,
            browser_tag: row.get(8)?,
            ordering_anomaly: row.get(9)?,
        })
    }
}

/// Fields needed to create a participant row.
#[derive(Debug, Clone)]
pub struct NewParticipant<'a> {
    pub meeting_id: &'a str,
    pub participant_id: &'a str,
    pub participant_name: &'a str,
    pub join_time: DateTime<Utc>,
    pub is_active: bool,
    pub browser_tag: Option<&'a str>,
}

/// One captioned utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptLine {
    pub id: i64,
    pub meeting_id: String,
    pub participant_id: String,
    /// Name as it was when the line was written.
    pub participant_name: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub sentiment_score: f64,
    pub browser_tag: Option<String>,
}

impl TranscriptLine {
    pub(crate) const COLUMNS: &'static str = "id, meeting_id, participant_id, participant_name, \
         text, timestamp, sentiment_score, browser_tag";

    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            meeting_id: row.get(1)?,
            participant_id: row.get(2)?,
            participant_name: row.get(3)?,
            text: row.get(4)?,
            timestamp: ts_column(row, 5)?,
            sentiment_score: row.get(6)?,
            browser_tag: row.get(7)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewTranscriptLine<'a> {
    pub meeting_id: &'a str,
    pub participant_id: &'a str,
    pub participant_name: &'a str,
    pub text: &'a str,
    pub timestamp: DateTime<Utc>,
    pub sentiment_score: f64,
    pub browser_tag: Option<&'a str>,
}

/// Frozen copy of a meeting, written when the meeting ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalArchive {
    pub meeting_id: String,
    /// Earliest known join time.
    pub meeting_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub transcript_data: Vec<TranscriptLine>,
    pub participant_data: Vec<Participant>,
    pub full_text: String,
}

impl FinalArchive {
    pub(crate) const COLUMNS: &'static str =
        "meeting_id, meeting_date, created_at, transcript_data, participant_data, full_text";

    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let transcript_json: String = row.get(3)?;
        let participant_json: String = row.get(4)?;

        Ok(Self {
            meeting_id: row.get(0)?,
            meeting_date: opt_ts_column(row, 1)?,
            created_at: ts_column(row, 2)?,
            transcript_data: serde_json::from_str(&transcript_json).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, e.into())
            })?,
            participant_data: serde_json::from_str(&participant_json).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, e.into())
            })?,
            full_text: row.get(5)?,
        })
    }
}

/// Listing view of an archive, without the frozen payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveSummary {
    pub meeting_id: String,
    pub meeting_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub participant_count: i64,
    pub transcript_line_count: i64,
}

impl ArchiveSummary {
    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            meeting_id: row.get(0)?,
            meeting_date: opt_ts_column(row, 1)?,
            created_at: ts_column(row, 2)?,
            participant_count: row.get(3)?,
            transcript_line_count: row.get(4)?,
        })
    }
}
