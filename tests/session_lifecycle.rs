//! End-to-end meeting lifecycle against an on-disk store.
//!
//! Payloads go through the normalizer exactly as the HTTP routes feed them.

use meetpulse::db::SessionStore;
use meetpulse::events::{normalize, InboundEvent, MeetingId};
use meetpulse::notify::{BroadcastNotifier, Notification};
use meetpulse::sentiment::LexiconScorer;
use meetpulse::session::{ApplyOutcome, MeetingStatus, SessionAggregator, SessionQueries};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

struct Service {
    aggregator: SessionAggregator,
    queries: SessionQueries,
    notifier: BroadcastNotifier,
}

fn open(db_path: &Path) -> Service {
    let store = Arc::new(SessionStore::open(db_path, Duration::from_secs(5)).unwrap());
    let notifier = BroadcastNotifier::new(32);
    Service {
        aggregator: SessionAggregator::new(
            Arc::clone(&store),
            Arc::new(LexiconScorer::new().unwrap()),
            Arc::new(notifier.clone()),
        ),
        queries: SessionQueries::new(store),
        notifier,
    }
}

fn apply(service: &Service, inbound: InboundEvent) -> ApplyOutcome {
    service
        .aggregator
        .apply(normalize(inbound).unwrap())
        .unwrap()
}

fn webhook(event: &str, participant: Value) -> InboundEvent {
    InboundEvent::Webhook(json!({
        "event": event,
        "payload": {"object": {"id": "M 1", "topic": "Retro", "participant": participant}}
    }))
}

#[test]
fn test_meeting_lifecycle_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("meetpulse.db");

    {
        let service = open(&db_path);
        let mut rx = service.notifier.subscribe();

        apply(&service, webhook("meeting.started", Value::Null));
        apply(
            &service,
            webhook(
                "meeting.participant_joined",
                json!({"id": "P1", "user_name": "Ann", "join_time": "2024-03-01T10:00:00Z"}),
            ),
        );
        apply(
            &service,
            InboundEvent::Transcription(json!({
                "meeting_id": "M1",
                "participant_id": "P1",
                "participant_name": "Ann",
                "transcript": "hello",
                "timestamp": "2024-03-01T10:00:30Z"
            })),
        );
        apply(
            &service,
            webhook(
                "meeting.participant_left",
                json!({"id": "P1", "leave_time": "2024-03-01T10:02:00Z"}),
            ),
        );

        let summary = service
            .queries
            .meeting_summary(&MeetingId::parse("M1").unwrap())
            .unwrap();
        assert_eq!(summary.status, MeetingStatus::Active);

        apply(&service, webhook("meeting.ended", Value::Null));

        let mut names = Vec::new();
        while let Ok(notification) = rx.try_recv() {
            names.push(notification.event_name());
        }
        assert_eq!(
            names,
            vec![
                "meeting_started",
                "participant_joined",
                "new_transcription",
                "participant_left",
                "meeting_ended"
            ]
        );
    }

    let service = open(&db_path);
    let id = MeetingId::parse("M1").unwrap();

    let archive = service.queries.final_transcript(&id).unwrap();
    assert_eq!(archive.full_text, "hello");
    assert_eq!(archive.transcript_data.len(), 1);
    assert_eq!(archive.participant_data.len(), 1);
    assert_eq!(archive.participant_data[0].duration, 120);
    assert!(archive.transcript_data[0].sentiment_score.abs() < 1e-9);

    let summary = service.queries.meeting_summary(&id).unwrap();
    assert_eq!(summary.status, MeetingStatus::Ended);
    assert_eq!(summary.participant_count, 1);
}

#[test]
fn test_out_of_order_events_converge() {
    let dir = tempfile::tempdir().unwrap();
    let service = open(&dir.path().join("meetpulse.db"));
    let id = MeetingId::parse("M1").unwrap();

    // leave before any join: nothing recorded
    let early_leave = apply(
        &service,
        webhook("meeting.participant_left", json!({"id": "P2"})),
    );
    assert!(matches!(early_leave, ApplyOutcome::NoOp { .. }));
    assert_eq!(
        service.queries.meeting_summary(&id).unwrap().status,
        MeetingStatus::Unknown
    );

    // captions arriving out of order are read back in timestamp order
    for (text, ts) in [("three", 3_000), ("one", 1_000), ("two", 2_000)] {
        apply(
            &service,
            InboundEvent::Direct(json!({
                "kind": "transcript_line",
                "meeting_id": "M1",
                "participant_id": "P1",
                "participant_name": "Ann",
                "text": text,
                "timestamp": 1_709_287_200_000i64 + ts
            })),
        );
    }
    let texts: Vec<_> = service
        .queries
        .live_transcript(&id)
        .unwrap()
        .into_iter()
        .map(|line| line.text)
        .collect();
    assert_eq!(texts, vec!["one", "two", "three"]);

    // duplicate joins collapse into one row
    for _ in 0..3 {
        apply(
            &service,
            webhook(
                "meeting.participant_joined",
                json!({"user_id": 42, "user_name": "Bo", "join_time": "2024-03-01T10:00:00Z"}),
            ),
        );
    }
    let participants = service.queries.participants(&id).unwrap();
    assert_eq!(participants.len(), 1);
    assert_eq!(participants[0].participant_id, "42");

    match apply(
        &service,
        InboundEvent::TalkTime(json!({"meeting_id": "M1", "participant_id": "42", "talk_time": 25})),
    ) {
        ApplyOutcome::Applied(Notification::TalkTimeUpdated { talk_time, .. }) => {
            assert_eq!(talk_time, 25)
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}
