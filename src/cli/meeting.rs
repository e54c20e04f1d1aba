//! CLI handler for inspecting one meeting straight from the local store.

use anyhow::Result;
use std::sync::Arc;

use super::archives::parse_id;
use super::args::MeetingCliArgs;
use crate::app;
use crate::config::Config;
use crate::session::{SessionQueries, TranscriptView};

pub fn handle_meeting_command(args: MeetingCliArgs, config: &Config) -> Result<()> {
    let meeting_id = parse_id(&args.id)?;
    let queries = SessionQueries::new(Arc::new(app::open_store(config)?));

    let summary = queries.meeting_summary(&meeting_id)?;
    println!("Meeting: {}", summary.meeting_id);
    println!("Status: {:?}", summary.status);
    println!(
        "Started: {}",
        summary
            .start_time
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "Unknown".to_string())
    );
    println!("Participants: {}", summary.participant_count);
    println!("Transcript lines: {}", summary.transcript_line_count);

    let participants = queries.participants(&meeting_id)?;
    if !participants.is_empty() {
        println!("\nTalk time:");
        for (rank, p) in participants.iter().enumerate() {
            let state = if p.is_active { "active" } else { "away" };
            let anomaly = if p.ordering_anomaly { " [out-of-order leave]" } else { "" };
            println!(
                "  {}. {} - {}s ({}){}",
                rank + 1,
                p.participant_name,
                p.talk_time,
                state,
                anomaly
            );
        }
    }

    if args.transcript {
        let view = queries.transcript(&meeting_id)?;
        let label = match &view {
            TranscriptView::Final(_) => "final",
            TranscriptView::Live(_) => "live",
        };
        println!("\nTranscript ({}):", label);
        for line in view.lines() {
            println!(
                "  [{}] {}: {}",
                line.timestamp.format("%H:%M:%S"),
                line.participant_name,
                line.text
            );
        }
    }

    Ok(())
}
