//! Event intake: platform webhook, direct canonical events and dashboard submissions.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use serde_json::{json, Value};
use tracing::debug;

use super::run_blocking;
use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::events::{normalize, InboundEvent};
use crate::notify::Notification;
use crate::session::{ApplyOutcome, SessionError};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook))
        .route("/api/events", post(direct_event))
        .route("/api/transcription", post(transcription))
        .route("/api/talk-time", post(talk_time))
        .route("/api/participant/active", post(active_status))
        .with_state(state)
}

/// POST /webhook - Platform meeting webhook.
async fn webhook(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let outcome = ingest(&state, InboundEvent::Webhook(parse_body(&body)?)).await?;
    Ok(Json(outcome_body(outcome)))
}

/// POST /api/events - Canonical event tagged by `kind`.
async fn direct_event(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let outcome = ingest(&state, InboundEvent::Direct(parse_body(&body)?)).await?;
    Ok(Json(outcome_body(outcome)))
}

/// POST /api/transcription - Caption line from a dashboard client.
async fn transcription(State(state): State<AppState>, body: Bytes) -> ApiResult<Response> {
    let outcome = ingest(&state, InboundEvent::Transcription(parse_body(&body)?)).await?;

    match outcome {
        ApplyOutcome::Applied(Notification::NewTranscription {
            id,
            sentiment_score,
            ..
        }) => Ok((
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "id": id,
                "sentiment_score": sentiment_score,
            })),
        )
            .into_response()),
        other => Ok(Json(outcome_body(other)).into_response()),
    }
}

/// POST /api/talk-time - Running talk-time total for a participant.
async fn talk_time(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let outcome = ingest(&state, InboundEvent::TalkTime(parse_body(&body)?)).await?;
    Ok(Json(outcome_body(outcome)))
}

/// POST /api/participant/active - Participant tab became active or idle.
async fn active_status(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let outcome = ingest(&state, InboundEvent::ActiveStatus(parse_body(&body)?)).await?;
    Ok(Json(outcome_body(outcome)))
}

/// Malformed JSON is acknowledged like any other invalid event.
fn parse_body(body: &Bytes) -> ApiResult<Value> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::ignored(format!("Malformed JSON body: {}", e)))
}

async fn ingest(state: &AppState, inbound: InboundEvent) -> ApiResult<ApplyOutcome> {
    debug!("Received {} payload", inbound.source());
    let event = normalize(inbound).map_err(SessionError::from)?;

    let aggregator = state.aggregator.clone();
    run_blocking(move || aggregator.apply(event)).await
}

fn outcome_body(outcome: ApplyOutcome) -> Value {
    match outcome {
        ApplyOutcome::Applied(notification) => json!({
            "success": true,
            "status": "applied",
            "event": notification,
        }),
        ApplyOutcome::NoOp { reason } => json!({
            "success": false,
            "status": "noop",
            "message": reason,
        }),
    }
}
