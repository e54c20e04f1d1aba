//! Final archive persistence.
//!
//! One row per meeting. Writing again for the same meeting replaces the row.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use super::schemas::{format_ts, ArchiveSummary, FinalArchive};

/// Repository for final meeting archives.
pub struct ArchiveRepository;

impl ArchiveRepository {
    /// Insert or replace the archive for `archive.meeting_id`.
    pub fn upsert(conn: &Connection, archive: &FinalArchive) -> Result<()> {
        let transcript_json = serde_json::to_string(&archive.transcript_data)
            .context("Failed to serialize transcript data")?;
        let participant_json = serde_json::to_string(&archive.participant_data)
            .context("Failed to serialize participant data")?;

        conn.execute(
            "INSERT INTO final_archives (
                meeting_id, meeting_date, created_at, transcript_data, participant_data, full_text
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(meeting_id) DO UPDATE SET
                meeting_date = excluded.meeting_date,
                created_at = excluded.created_at,
                transcript_data = excluded.transcript_data,
                participant_data = excluded.participant_data,
                full_text = excluded.full_text",
            params![
                archive.meeting_id,
                archive.meeting_date.as_ref().map(format_ts),
                format_ts(&archive.created_at),
                transcript_json,
                participant_json,
                archive.full_text,
            ],
        )
        .context("Failed to save final archive")?;

        Ok(())
    }

    pub fn get(conn: &Connection, meeting_id: &str) -> Result<Option<FinalArchive>> {
        let sql = format!(
            "SELECT {} FROM final_archives WHERE meeting_id = ?1",
            FinalArchive::COLUMNS
        );
        conn.query_row(&sql, params![meeting_id], FinalArchive::from_row)
            .optional()
            .context("Failed to query final archive")
    }

    pub fn exists(conn: &Connection, meeting_id: &str) -> Result<bool> {
        let mut stmt = conn
            .prepare("SELECT 1 FROM final_archives WHERE meeting_id = ?1")
            .context("Failed to prepare archive lookup")?;
        stmt.exists(params![meeting_id])
            .context("Failed to check archive existence")
    }

    /// Remove the archive. Returns false if there was none.
    pub fn delete(conn: &Connection, meeting_id: &str) -> Result<bool> {
        let deleted = conn
            .execute(
                "DELETE FROM final_archives WHERE meeting_id = ?1",
                params![meeting_id],
            )
            .context("Failed to delete final archive")?;
        Ok(deleted > 0)
    }

    /// Archive summaries, newest first, optionally filtered by transcript text.
    pub fn list(
        conn: &Connection,
        query: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ArchiveSummary>> {
        let mut sql = "SELECT meeting_id, meeting_date, created_at, \
                       json_array_length(participant_data), json_array_length(transcript_data) \
                       FROM final_archives WHERE 1=1"
            .to_string();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(q) = query {
            sql.push_str(" AND full_text LIKE ? ESCAPE '\\'");
            params.push(Box::new(format!("%{}%", escape_like(q))));
        }

        sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT ?");
        params.push(Box::new(limit as i64));

        let mut stmt = conn
            .prepare(&sql)
            .context("Failed to prepare archive list query")?;

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let archives = stmt
            .query_map(param_refs.as_slice(), ArchiveSummary::from_row)
            .context("Failed to list archives")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to map archive summaries")?;

        Ok(archives)
    }
}

/// Escapes `LIKE` wildcards so the search text matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SessionStore;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn archive(meeting_id: &str, full_text: &str, created: i64) -> FinalArchive {
        FinalArchive {
            meeting_id: meeting_id.to_string(),
            meeting_date: Some(at(0)),
            created_at: at(created),
            transcript_data: Vec::new(),
            participant_data: Vec::new(),
            full_text: full_text.to_string(),
        }
    }

    #[test]
    fn test_upsert_replaces_existing() {
        let store = SessionStore::open_in_memory().unwrap();
        store
            .with_connection(|conn| {
                ArchiveRepository::upsert(conn, &archive("m1", "first pass", 10))?;
                ArchiveRepository::upsert(conn, &archive("m1", "second pass", 20))?;

                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM final_archives WHERE meeting_id = 'm1'",
                    [],
                    |row| row.get(0),
                )?;
                assert_eq!(count, 1);

                let stored = ArchiveRepository::get(conn, "m1")?.unwrap();
                assert_eq!(stored.full_text, "second pass");
                assert_eq!(stored.created_at, at(20));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_get_and_delete_missing() {
        let store = SessionStore::open_in_memory().unwrap();
        store
            .with_connection(|conn| {
                assert!(ArchiveRepository::get(conn, "nope")?.is_none());
                assert!(!ArchiveRepository::exists(conn, "nope")?);
                assert!(!ArchiveRepository::delete(conn, "nope")?);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_delete_existing() {
        let store = SessionStore::open_in_memory().unwrap();
        store
            .with_connection(|conn| {
                ArchiveRepository::upsert(conn, &archive("m1", "text", 0))?;
                assert!(ArchiveRepository::exists(conn, "m1")?);
                assert!(ArchiveRepository::delete(conn, "m1")?);
                assert!(!ArchiveRepository::exists(conn, "m1")?);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_list_newest_first_with_filter() {
        let store = SessionStore::open_in_memory().unwrap();
        store
            .with_connection(|conn| {
                ArchiveRepository::upsert(conn, &archive("old", "budget review", 1))?;
                ArchiveRepository::upsert(conn, &archive("new", "roadmap and budget", 2))?;
                ArchiveRepository::upsert(conn, &archive("other", "standup", 3))?;

                let all = ArchiveRepository::list(conn, None, 10)?;
                let ids: Vec<_> = all.iter().map(|a| a.meeting_id.as_str()).collect();
                assert_eq!(ids, vec!["other", "new", "old"]);
                assert_eq!(all[0].participant_count, 0);

                let budget = ArchiveRepository::list(conn, Some("budget"), 10)?;
                let ids: Vec<_> = budget.iter().map(|a| a.meeting_id.as_str()).collect();
                assert_eq!(ids, vec!["new", "old"]);

                let limited = ArchiveRepository::list(conn, None, 1)?;
                assert_eq!(limited.len(), 1);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_list_filter_matches_wildcards_literally() {
        let store = SessionStore::open_in_memory().unwrap();
        store
            .with_connection(|conn| {
                ArchiveRepository::upsert(conn, &archive("pct", "growth hit 50% this quarter", 1))?;
                ArchiveRepository::upsert(conn, &archive("plain", "50 people joined", 2))?;
                ArchiveRepository::upsert(conn, &archive("under", "see file a_b.txt", 3))?;
                ArchiveRepository::upsert(conn, &archive("axb", "see file axb.txt", 4))?;
                ArchiveRepository::upsert(conn, &archive("slash", "path c:\\temp", 5))?;

                let pct = ArchiveRepository::list(conn, Some("50%"), 10)?;
                let ids: Vec<_> = pct.iter().map(|a| a.meeting_id.as_str()).collect();
                assert_eq!(ids, vec!["pct"]);

                let under = ArchiveRepository::list(conn, Some("a_b"), 10)?;
                let ids: Vec<_> = under.iter().map(|a| a.meeting_id.as_str()).collect();
                assert_eq!(ids, vec!["under"]);

                let slash = ArchiveRepository::list(conn, Some("c:\\temp"), 10)?;
                let ids: Vec<_> = slash.iter().map(|a| a.meeting_id.as_str()).collect();
                assert_eq!(ids, vec!["slash"]);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("50%_x\\y"), "50\\%\\_x\\\\y");
    }
}
