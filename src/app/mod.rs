use crate::api::{ApiServer, AppState};
use crate::config::Config;
use crate::db::SessionStore;
use crate::notify::BroadcastNotifier;
use crate::sentiment::{LexiconScorer, SentimentScorer};
use crate::session::{SessionAggregator, SessionQueries};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub async fn run_service(config: Config) -> Result<()> {
    info!("Starting meetpulse service");

    let store = Arc::new(open_store(&config)?);
    let scorer = Arc::new(LexiconScorer::new()?);
    info!("Sentiment scorer: {}", scorer.name());

    let notifier = BroadcastNotifier::new(config.broadcast.capacity);
    let aggregator = Arc::new(SessionAggregator::new(
        Arc::clone(&store),
        scorer,
        Arc::new(notifier.clone()),
    ));

    let state = AppState {
        aggregator,
        queries: SessionQueries::new(store),
        notifier,
    };

    ApiServer::new(&config, state).start().await
}

/// Open the configured store, applying pending migrations.
pub fn open_store(config: &Config) -> Result<SessionStore> {
    let db_path = config.db_path()?;
    SessionStore::open(
        &db_path,
        Duration::from_millis(config.database.busy_timeout_ms),
    )
}
