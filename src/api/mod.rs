//! REST API server for meetpulse.
//!
//! Provides HTTP endpoints for:
//! - Platform webhooks and dashboard submissions
//! - Meeting summaries, live transcripts and leaderboards
//! - Final transcript archives
//! - Live notifications over Server-Sent Events

pub mod error;
pub mod routes;

use crate::config::Config;
use crate::notify::BroadcastNotifier;
use crate::session::{SessionAggregator, SessionQueries};
use anyhow::{Context, Result};
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared handles for every route.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<SessionAggregator>,
    pub queries: SessionQueries,
    pub notifier: BroadcastNotifier,
}

pub struct ApiServer {
    bind_addr: String,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: &Config, state: AppState) -> Self {
        Self {
            bind_addr: config.bind_addr(),
            state,
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            // Root and version endpoints
            .route("/", get(status))
            .route("/version", get(version))
            .merge(routes::ingest::router(self.state.clone()))
            .merge(routes::meetings::router(self.state.clone()))
            .merge(routes::transcripts::router(self.state.clone()))
            .merge(routes::stream::router(self.state.clone()))
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
    }

    pub async fn start(self) -> Result<()> {
        let app = self.router();

        let listener = tokio::net::TcpListener::bind(&self.bind_addr)
            .await
            .with_context(|| format!("Failed to bind {}", self.bind_addr))?;

        info!("API server listening on http://{}", self.bind_addr);
        info!("Endpoints:");
        info!("  GET    /                          - Service info");
        info!("  GET    /version                   - Get version info");
        info!("  POST   /webhook                   - Platform meeting webhook");
        info!("  POST   /api/events                - Canonical event");
        info!("  POST   /api/transcription         - Submit transcript line");
        info!("  POST   /api/talk-time             - Update talk time");
        info!("  POST   /api/participant/active    - Update active status");
        info!("  GET    /api/meetings/:id          - Meeting info (?type=...)");
        info!("  POST   /api/meetings/:id/finalize - Archive meeting now");
        info!("  GET    /api/transcripts           - List archives");
        info!("  GET    /api/transcripts/:id       - Get archive");
        info!("  DELETE /api/transcripts/:id       - Delete archive");
        info!("  GET    /api/events/stream         - Live notifications (SSE)");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn status() -> Json<Value> {
    Json(json!({
        "service": "meetpulse",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn version() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "name": "meetpulse"
    }))
}
