use anyhow::Context;
use std::sync::Arc;
use tracing::info;

use super::SessionError;
use crate::db::{
    now_ts, ArchiveRepository, FinalArchive, ParticipantRepository, SessionStore, TranscriptRepository,
};
use crate::events::MeetingId;

/// Freezes a meeting's live rows into its final archive.
#[derive(Clone)]
pub struct ArchivalFinalizer {
    store: Arc<SessionStore>,
}

impl ArchivalFinalizer {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    /// Snapshot the meeting and write its archive, replacing any earlier one.
    ///
    /// Safe to call repeatedly. A meeting with no rows still gets an (empty) archive.
    pub fn finalize(&self, meeting_id: &MeetingId) -> Result<FinalArchive, SessionError> {
        let id = meeting_id.as_str();

        let archive = self
            .store
            .with_transaction(|tx| {
                let transcript_data = TranscriptRepository::list_for_meeting(tx, id)?;
                let participant_data = ParticipantRepository::list_by_talk_time(tx, id)?;
                let meeting_date = ParticipantRepository::earliest_join(tx, id)?;

                let full_text = transcript_data
                    .iter()
                    .map(|line| line.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");

                let archive = FinalArchive {
                    meeting_id: id.to_string(),
                    meeting_date,
                    created_at: now_ts(),
                    transcript_data,
                    participant_data,
                    full_text,
                };

                ArchiveRepository::upsert(tx, &archive)?;
                Ok(archive)
            })
            .with_context(|| format!("Failed to finalize meeting {}", id))?;

        info!(
            "Archived meeting {}: {} participant(s), {} transcript line(s)",
            id,
            archive.participant_data.len(),
            archive.transcript_data.len()
        );

        Ok(archive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewParticipant, NewTranscriptLine};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn seed(store: &SessionStore) {
        store
            .with_connection(|conn| {
                for (pid, name, joined) in [("p2", "Bo", 30), ("p1", "Ann", 10)] {
                    ParticipantRepository::insert_if_absent(
                        conn,
                        &NewParticipant {
                            meeting_id: "m1",
                            participant_id: pid,
                            participant_name: name,
                            join_time: at(joined),
                            is_active: true,
                            browser_tag: None,
                        },
                    )?;
                }
                for (text, ts) in [("world", 50), ("hello", 40)] {
                    TranscriptRepository::insert(
                        conn,
                        &NewTranscriptLine {
                            meeting_id: "m1",
                            participant_id: "p1",
                            participant_name: "Ann",
                            text,
                            timestamp: at(ts),
                            sentiment_score: 0.0,
                            browser_tag: None,
                        },
                    )?;
                }
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_finalize_snapshots_meeting() {
        let store = Arc::new(SessionStore::open_in_memory().unwrap());
        seed(&store);

        let archive = ArchivalFinalizer::new(Arc::clone(&store))
            .finalize(&MeetingId::parse("m1").unwrap())
            .unwrap();

        assert_eq!(archive.full_text, "hello world");
        assert_eq!(archive.meeting_date, Some(at(10)));
        assert_eq!(archive.participant_data.len(), 2);
        assert_eq!(archive.transcript_data.len(), 2);

        let stored = store
            .with_connection(|conn| ArchiveRepository::get(conn, "m1"))
            .unwrap()
            .unwrap();
        assert_eq!(stored, archive);
    }

    #[test]
    fn test_refinalize_replaces_archive() {
        let store = Arc::new(SessionStore::open_in_memory().unwrap());
        let finalizer = ArchivalFinalizer::new(Arc::clone(&store));
        let id = MeetingId::parse("m1").unwrap();

        let first = finalizer.finalize(&id).unwrap();
        assert_eq!(first.full_text, "");
        assert!(first.meeting_date.is_none());

        seed(&store);
        let second = finalizer.finalize(&id).unwrap();
        assert_eq!(second.full_text, "hello world");

        let count: i64 = store
            .with_connection(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM final_archives", [], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(count, 1);
    }
}
