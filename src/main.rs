use anyhow::Result;
use clap::Parser;
use meetpulse::{
    app,
    cli::{handle_archives_command, handle_meeting_command, Cli, CliCommand},
    config::Config,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    if let Some(CliCommand::Version) = cli.command {
        println!("meetpulse {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let mut config = Config::load()?;
    cli.apply_overrides(&mut config);

    match cli.command {
        Some(CliCommand::Migrate) => {
            let store = app::open_store(&config)?;
            info!("Schema is at version {}", store.schema_version()?);
            Ok(())
        }
        Some(CliCommand::Meeting(args)) => handle_meeting_command(args, &config),
        Some(CliCommand::Archives(args)) => handle_archives_command(args, &config),
        Some(CliCommand::Serve) | Some(CliCommand::Version) | None => {
            app::run_service(config).await
        }
    }
}
