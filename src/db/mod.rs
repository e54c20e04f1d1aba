//! Embedded session store.
//!
//! SQLite through rusqlite, raw SQL, no ORM. Three tables: `participants`,
//! `transcript_lines` and `final_archives`, created by versioned migrations.

pub mod archives;
pub mod init;
pub mod migrations;
pub mod participants;
pub mod schemas;
pub mod transcripts;

#[cfg(test)]
mod tests;

pub use archives::ArchiveRepository;
pub use init::SessionStore;
pub use participants::ParticipantRepository;
pub use schemas::{
    format_ts, now_ts, parse_ts, ArchiveSummary, FinalArchive, NewParticipant, NewTranscriptLine,
    Participant, TranscriptLine,
};
pub use transcripts::TranscriptRepository;
