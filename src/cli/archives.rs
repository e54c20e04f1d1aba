use anyhow::Result;
use std::sync::Arc;

use super::args::ArchivesCliArgs;
use crate::app;
use crate::config::Config;
use crate::events::MeetingId;
use crate::session::{SessionError, SessionQueries};

pub fn handle_archives_command(args: ArchivesCliArgs, config: &Config) -> Result<()> {
    let queries = SessionQueries::new(Arc::new(app::open_store(config)?));

    if let Some(raw) = args.delete.as_deref() {
        let meeting_id = parse_id(raw)?;
        return match queries.delete_archive(&meeting_id) {
            Ok(()) => {
                println!("Deleted archive for meeting {}", meeting_id);
                Ok(())
            }
            Err(SessionError::NotFound(message)) => {
                println!("{}", message);
                Ok(())
            }
            Err(err) => Err(err.into()),
        };
    }

    if let Some(raw) = args.show.as_deref() {
        let meeting_id = parse_id(raw)?;
        let archive = match queries.final_transcript(&meeting_id) {
            Ok(archive) => archive,
            Err(SessionError::NotFound(message)) => {
                println!("{}", message);
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        println!("Meeting: {}", archive.meeting_id);
        println!(
            "Date: {}",
            archive
                .meeting_date
                .map(|d| d.to_rfc3339())
                .unwrap_or_else(|| "Unknown".to_string())
        );
        println!("Archived: {}", archive.created_at.to_rfc3339());
        println!("Participants:");
        for p in &archive.participant_data {
            println!(
                "  {} ({}) - {}s in meeting, {}s talking",
                p.participant_name, p.participant_id, p.duration, p.talk_time
            );
        }
        println!("Transcript:");
        for line in &archive.transcript_data {
            println!(
                "  [{}] {}: {}",
                line.timestamp.format("%H:%M:%S"),
                line.participant_name,
                line.text
            );
        }
        return Ok(());
    }

    let archives = queries.list_archives(args.query.as_deref(), args.limit)?;

    if archives.is_empty() {
        println!("No archives found matching your criteria.");
        return Ok(());
    }

    println!("Found {} archive(s):\n", archives.len());

    for archive in archives {
        println!("Meeting: {}", archive.meeting_id);
        println!(
            "Date: {}",
            archive
                .meeting_date
                .map(|d| d.to_rfc3339())
                .unwrap_or_else(|| "Unknown".to_string())
        );
        println!(
            "Participants: {}, lines: {}",
            archive.participant_count, archive.transcript_line_count
        );
        println!("---");
    }

    println!("\nTo view an archive, use: meetpulse archives --show <MEETING_ID>");

    Ok(())
}

pub(crate) fn parse_id(raw: &str) -> Result<MeetingId> {
    MeetingId::parse(raw).ok_or_else(|| anyhow::anyhow!("Meeting id must not be blank"))
}
