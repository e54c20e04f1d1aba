pub mod archives;
pub mod args;
pub mod meeting;

pub use archives::handle_archives_command;
pub use args::{ArchivesCliArgs, Cli, CliCommand, MeetingCliArgs};
pub use meeting::handle_meeting_command;

use crate::config::Config;

impl Cli {
    /// Apply `--port` and `--db` on top of the loaded config.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(db) = &self.db {
            config.database.path = Some(db.clone());
        }
    }
}
