use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "meetpulse")]
#[command(about = "Meeting session aggregation and transcript archival", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override the configured HTTP port
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Override the configured database file
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Run the HTTP service (default)
    Serve,
    /// Apply pending schema migrations and exit
    Migrate,
    /// Show a meeting's summary, participants and transcript
    Meeting(MeetingCliArgs),
    /// Search, view or delete final transcript archives
    Archives(ArchivesCliArgs),
    /// Print version information
    Version,
}

#[derive(ClapArgs, Debug)]
pub struct MeetingCliArgs {
    /// Meeting id (whitespace is ignored)
    pub id: String,
    /// Also print every transcript line
    #[arg(long)]
    pub transcript: bool,
}

#[derive(ClapArgs, Debug)]
pub struct ArchivesCliArgs {
    /// Search query to filter archives by transcript text
    #[arg(short, long)]
    pub query: Option<String>,
    /// Maximum number of results
    #[arg(short, long, default_value = "20")]
    pub limit: usize,
    /// Print the full archive for a meeting id
    #[arg(long, conflicts_with = "delete")]
    pub show: Option<String>,
    /// Delete the archive for a meeting id
    #[arg(long)]
    pub delete: Option<String>,
}
