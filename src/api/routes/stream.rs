//! Server-Sent Events relay of change notifications.

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::api::AppState;
use crate::events::MeetingId;

#[derive(Debug, Deserialize, Default)]
pub struct StreamQueryParams {
    /// Only relay notifications for this meeting
    pub meeting_id: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/events/stream", get(event_stream))
        .with_state(state)
}

/// GET /api/events/stream - Notifications as SSE, one event per change.
async fn event_stream(
    State(state): State<AppState>,
    Query(params): Query<StreamQueryParams>,
) -> Sse<impl futures_util::Stream<Item = Result<Event, Infallible>> + Send + 'static> {
    use async_stream::stream;

    let filter = params.meeting_id.as_deref().and_then(MeetingId::parse);
    let mut rx = state.notifier.subscribe();
    debug!(
        "SSE subscriber connected (filter: {})",
        filter.as_ref().map(MeetingId::as_str).unwrap_or("none")
    );

    let stream = stream! {
        loop {
            match rx.recv().await {
                Ok(notification) => {
                    if let Some(ref id) = filter {
                        if notification.meeting_id() != id.as_str() {
                            continue;
                        }
                    }
                    let name = notification.event_name();
                    match Event::default().event(name).json_data(&notification) {
                        Ok(event) => yield Ok(event),
                        Err(e) => warn!("Failed to encode {} notification: {}", name, e),
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    yield Ok(Event::default().comment(format!("lagged: {} notifications dropped", n)));
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    )
}
