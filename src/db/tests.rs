use super::*;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

#[test]
fn test_open_creates_file_and_migrates() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("meetpulse.db");

    let store = SessionStore::open(&db_path, Duration::from_secs(1)).unwrap();
    assert!(db_path.exists());
    assert_eq!(store.db_path(), Some(db_path.as_path()));
    assert_eq!(store.schema_version().unwrap(), migrations::latest_version());
}

#[test]
fn test_reopen_existing_store_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("meetpulse.db");

    {
        let store = SessionStore::open(&db_path, Duration::from_secs(1)).unwrap();
        store
            .with_connection(|conn| {
                ParticipantRepository::insert_if_absent(
                    conn,
                    &NewParticipant {
                        meeting_id: "m1",
                        participant_id: "p1",
                        participant_name: "Ann",
                        join_time: at(0),
                        is_active: true,
                        browser_tag: None,
                    },
                )
            })
            .unwrap();
    }

    let reopened = SessionStore::open(&db_path, Duration::from_secs(1)).unwrap();
    let count = reopened
        .with_connection(|conn| ParticipantRepository::count_distinct(conn, "m1"))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn test_transaction_rolls_back_on_error() {
    let store = SessionStore::open_in_memory().unwrap();

    let result: anyhow::Result<()> = store.with_transaction(|tx| {
        ArchiveRepository::upsert(
            tx,
            &FinalArchive {
                meeting_id: "m1".to_string(),
                meeting_date: None,
                created_at: at(0),
                transcript_data: Vec::new(),
                participant_data: Vec::new(),
                full_text: String::new(),
            },
        )?;
        anyhow::bail!("abort after write")
    });
    assert!(result.is_err());

    let exists = store
        .with_connection(|conn| ArchiveRepository::exists(conn, "m1"))
        .unwrap();
    assert!(!exists);
}

#[test]
fn test_concurrent_first_joins_create_one_row() {
    let store = Arc::new(SessionStore::open_in_memory().unwrap());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                store
                    .with_connection(|conn| {
                        ParticipantRepository::insert_if_absent(
                            conn,
                            &NewParticipant {
                                meeting_id: "m1",
                                participant_id: "p1",
                                participant_name: "Ann",
                                join_time: at(i),
                                is_active: true,
                                browser_tag: None,
                            },
                        )
                    })
                    .unwrap()
            })
        })
        .collect();

    let inserted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|created| *created)
        .count();
    assert_eq!(inserted, 1);

    let count: i64 = store
        .with_connection(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM participants WHERE meeting_id = 'm1'",
                [],
                |row| row.get(0),
            )?)
        })
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn test_timestamp_format_is_fixed_width_utc() {
    let formatted = format_ts(&at(0));
    assert_eq!(formatted, "2023-11-14T22:13:20.000Z");
    assert_eq!(parse_ts(&formatted).unwrap(), at(0));
    assert!(parse_ts("yesterday").is_err());
}

#[test]
fn test_corrupt_stored_timestamp_reports_column_once() {
    let store = SessionStore::open_in_memory().unwrap();
    store
        .with_connection(|conn| {
            conn.execute(
                "INSERT INTO transcript_lines
                    (meeting_id, participant_id, participant_name, text, timestamp, sentiment_score)
                 VALUES ('m1', 'p1', 'Ann', 'hello', 'not-a-time', 0)",
                [],
            )?;
            Ok(())
        })
        .unwrap();

    let err = store
        .with_connection(|conn| TranscriptRepository::list_for_meeting(conn, "m1"))
        .unwrap_err();
    let chain = format!("{:#}", err);

    assert!(chain.starts_with("Failed to map transcript lines"));
    assert!(chain.contains("index: 5"));
    assert!(chain.matches("Invalid stored timestamp").count() <= 1);
}
