//! Participant persistence.
//!
//! Raw SQL over rusqlite. Row creation is a single conditional insert backed by
//! the unique `(meeting_id, participant_id)` index, so concurrent first joins
//! cannot produce two rows.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::schemas::{format_ts, parse_ts, NewParticipant, Participant};

/// Repository for participant rows.
pub struct ParticipantRepository;

impl ParticipantRepository {
    /// Insert the participant unless a row for the same identity exists.
    /// Returns true when a row was created.
    pub fn insert_if_absent(conn: &Connection, participant: &NewParticipant) -> Result<bool> {
        let inserted = conn
            .execute(
                "INSERT INTO participants (
                    meeting_id, participant_id, participant_name, join_time,
                    leave_time, duration, talk_time, is_active, browser_tag
                 ) VALUES (?1, ?2, ?3, ?4, NULL, 0, 0, ?5, ?6)
                 ON CONFLICT(meeting_id, participant_id) DO NOTHING",
                params![
                    participant.meeting_id,
                    participant.participant_id,
                    participant.participant_name,
                    format_ts(&participant.join_time),
                    participant.is_active,
                    participant.browser_tag,
                ],
            )
            .context("Failed to insert participant")?;

        Ok(inserted == 1)
    }

    pub fn get(
        conn: &Connection,
        meeting_id: &str,
        participant_id: &str,
    ) -> Result<Option<Participant>> {
        let sql = format!(
            "SELECT {} FROM participants WHERE meeting_id = ?1 AND participant_id = ?2",
            Participant::COLUMNS
        );
        conn.query_row(&sql, params![meeting_id, participant_id], Participant::from_row)
            .optional()
            .context("Failed to query participant")
    }

    /// Set the active flag, and the browser tag when one is given.
    /// Returns true if a row was updated.
    pub fn set_active(
        conn: &Connection,
        meeting_id: &str,
        participant_id: &str,
        is_active: bool,
        browser_tag: Option<&str>,
    ) -> Result<bool> {
        let updated = conn
            .execute(
                "UPDATE participants
                 SET is_active = ?1, browser_tag = COALESCE(?2, browser_tag)
                 WHERE meeting_id = ?3 AND participant_id = ?4",
                params![is_active, browser_tag, meeting_id, participant_id],
            )
            .context("Failed to update participant status")?;
        Ok(updated > 0)
    }

    /// Write leave time and duration, and mark the participant inactive.
    pub fn record_leave(
        conn: &Connection,
        meeting_id: &str,
        participant_id: &str,
        leave_time: &DateTime<Utc>,
        duration: i64,
        ordering_anomaly: bool,
    ) -> Result<bool> {
        let updated = conn
            .execute(
                "UPDATE participants
                 SET leave_time = ?1, duration = ?2, is_active = 0,
                     ordering_anomaly = MAX(ordering_anomaly, ?3)
                 WHERE meeting_id = ?4 AND participant_id = ?5",
                params![
                    format_ts(leave_time),
                    duration,
                    ordering_anomaly,
                    meeting_id,
                    participant_id
                ],
            )
            .context("Failed to record participant leave")?;
        Ok(updated > 0)
    }

    /// Overwrite talk time with the caller's running total.
    pub fn set_talk_time(
        conn: &Connection,
        meeting_id: &str,
        participant_id: &str,
        talk_time: i64,
    ) -> Result<bool> {
        let updated = conn
            .execute(
                "UPDATE participants SET talk_time = ?1
                 WHERE meeting_id = ?2 AND participant_id = ?3",
                params![talk_time, meeting_id, participant_id],
            )
            .context("Failed to update talk time")?;
        Ok(updated > 0)
    }

    /// All participants of a meeting, highest talk time first.
    pub fn list_by_talk_time(conn: &Connection, meeting_id: &str) -> Result<Vec<Participant>> {
        let sql = format!(
            "SELECT {} FROM participants WHERE meeting_id = ?1
             ORDER BY talk_time DESC, join_time ASC, id ASC",
            Participant::COLUMNS
        );
        let mut stmt = conn
            .prepare(&sql)
            .context("Failed to prepare participants query")?;

        let participants = stmt
            .query_map(params![meeting_id], Participant::from_row)
            .context("Failed to query participants")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to map participants")?;

        Ok(participants)
    }

    pub fn count_distinct(conn: &Connection, meeting_id: &str) -> Result<i64> {
        conn.query_row(
            "SELECT COUNT(DISTINCT participant_id) FROM participants WHERE meeting_id = ?1",
            params![meeting_id],
            |row| row.get(0),
        )
        .context("Failed to count participants")
    }

    pub fn earliest_join(conn: &Connection, meeting_id: &str) -> Result<Option<DateTime<Utc>>> {
        let raw: Option<String> = conn
            .query_row(
                "SELECT MIN(join_time) FROM participants WHERE meeting_id = ?1",
                params![meeting_id],
                |row| row.get(0),
            )
            .context("Failed to query earliest join time")?;

        raw.as_deref().map(parse_ts).transpose()
    }
}
