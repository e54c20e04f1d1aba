//! Transcript line persistence.

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use super::schemas::{format_ts, NewTranscriptLine, TranscriptLine};

/// Repository for transcript lines. Lines are append-only.
pub struct TranscriptRepository;

impl TranscriptRepository {
    /// Append a line and return it with its assigned sequence number.
    pub fn insert(conn: &Connection, line: &NewTranscriptLine) -> Result<TranscriptLine> {
        conn.execute(
            "INSERT INTO transcript_lines (
                meeting_id, participant_id, participant_name, text,
                timestamp, sentiment_score, browser_tag
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                line.meeting_id,
                line.participant_id,
                line.participant_name,
                line.text,
                format_ts(&line.timestamp),
                line.sentiment_score,
                line.browser_tag,
            ],
        )
        .context("Failed to insert transcript line")?;

        Ok(TranscriptLine {
            id: conn.last_insert_rowid(),
            meeting_id: line.meeting_id.to_string(),
            participant_id: line.participant_id.to_string(),
            participant_name: line.participant_name.to_string(),
            text: line.text.to_string(),
            timestamp: line.timestamp,
            sentiment_score: line.sentiment_score,
            browser_tag: line.browser_tag.map(str::to_string),
        })
    }

    /// All lines of a meeting in caller-timestamp order; the sequence number breaks ties.
    pub fn list_for_meeting(conn: &Connection, meeting_id: &str) -> Result<Vec<TranscriptLine>> {
        let sql = format!(
            "SELECT {} FROM transcript_lines WHERE meeting_id = ?1
             ORDER BY timestamp ASC, id ASC",
            TranscriptLine::COLUMNS
        );
        let mut stmt = conn
            .prepare(&sql)
            .context("Failed to prepare transcript query")?;

        let lines = stmt
            .query_map(params![meeting_id], TranscriptLine::from_row)
            .context("Failed to query transcript lines")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to map transcript lines")?;

        Ok(lines)
    }

    pub fn count_for_meeting(conn: &Connection, meeting_id: &str) -> Result<i64> {
        conn.query_row(
            "SELECT COUNT(*) FROM transcript_lines WHERE meeting_id = ?1",
            params![meeting_id],
            |row| row.get(0),
        )
        .context("Failed to count transcript lines")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SessionStore;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn line<'a>(meeting_id: &'a str, text: &'a str, ts: i64) -> NewTranscriptLine<'a> {
        NewTranscriptLine {
            meeting_id,
            participant_id: "p1",
            participant_name: "Ann",
            text,
            timestamp: at(ts),
            sentiment_score: 0.0,
            browser_tag: None,
        }
    }

    #[test]
    fn test_insert_assigns_increasing_ids() {
        let store = SessionStore::open_in_memory().unwrap();
        store
            .with_connection(|conn| {
                let first = TranscriptRepository::insert(conn, &line("m1", "one", 0))?;
                let second = TranscriptRepository::insert(conn, &line("m1", "two", 1))?;
                assert!(second.id > first.id);
                assert_eq!(TranscriptRepository::count_for_meeting(conn, "m1")?, 2);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_list_sorts_by_timestamp_not_insertion() {
        let store = SessionStore::open_in_memory().unwrap();
        store
            .with_connection(|conn| {
                TranscriptRepository::insert(conn, &line("m1", "third", 30))?;
                TranscriptRepository::insert(conn, &line("m1", "first", 10))?;
                TranscriptRepository::insert(conn, &line("m1", "second", 20))?;
                TranscriptRepository::insert(conn, &line("m2", "elsewhere", 0))?;

                let texts: Vec<_> = TranscriptRepository::list_for_meeting(conn, "m1")?
                    .into_iter()
                    .map(|l| l.text)
                    .collect();
                assert_eq!(texts, vec!["first", "second", "third"]);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_equal_timestamps_fall_back_to_sequence() {
        let store = SessionStore::open_in_memory().unwrap();
        store
            .with_connection(|conn| {
                TranscriptRepository::insert(conn, &line("m1", "a", 5))?;
                TranscriptRepository::insert(conn, &line("m1", "b", 5))?;

                let texts: Vec<_> = TranscriptRepository::list_for_meeting(conn, "m1")?
                    .into_iter()
                    .map(|l| l.text)
                    .collect();
                assert_eq!(texts, vec!["a", "b"]);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_stored_line_round_trips_fields() {
        let store = SessionStore::open_in_memory().unwrap();
        store
            .with_connection(|conn| {
                let mut new_line = line("m1", "thanks everyone", 7);
                new_line.sentiment_score = 1.0;
                new_line.browser_tag = Some("tab-9");
                let inserted = TranscriptRepository::insert(conn, &new_line)?;

                let stored = TranscriptRepository::list_for_meeting(conn, "m1")?;
                assert_eq!(stored, vec![inserted]);
                Ok(())
            })
            .unwrap();
    }
}
