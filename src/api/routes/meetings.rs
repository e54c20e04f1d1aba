//! Per-meeting query and finalize endpoints.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{meeting_id, run_blocking};
use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::events::{CanonicalEvent, EventBody};
use crate::notify::Notification;
use crate::session::{ApplyOutcome, TranscriptView};

/// Query parameters for the meeting endpoint.
#[derive(Debug, Deserialize, Default)]
pub struct MeetingQueryParams {
    /// One of info, transcriptions, participants, transcript (default info)
    #[serde(rename = "type")]
    pub view: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/meetings/:id", get(get_meeting))
        .route("/api/meetings/:id/finalize", post(finalize_meeting))
        .with_state(state)
}

/// GET /api/meetings/:id - Summary, live lines, leaderboard or best transcript.
async fn get_meeting(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<MeetingQueryParams>,
) -> ApiResult<Json<Value>> {
    let meeting_id = meeting_id(&id)?;
    let queries = state.queries.clone();
    let view = params.view.unwrap_or_else(|| "info".to_string());

    let body = match view.as_str() {
        "info" => {
            let summary = run_blocking(move || queries.meeting_summary(&meeting_id)).await?;
            json!(summary)
        }
        "transcriptions" => {
            let lines = run_blocking({
                let meeting_id = meeting_id.clone();
                move || queries.live_transcript(&meeting_id)
            })
            .await?;
            json!({ "meeting_id": meeting_id, "transcriptions": lines })
        }
        "participants" => {
            let participants = run_blocking({
                let meeting_id = meeting_id.clone();
                move || queries.participants(&meeting_id)
            })
            .await?;
            json!({ "meeting_id": meeting_id, "participants": participants })
        }
        "transcript" => {
            let view = run_blocking({
                let meeting_id = meeting_id.clone();
                move || queries.transcript(&meeting_id)
            })
            .await?;
            match view {
                TranscriptView::Final(archive) => json!({
                    "meeting_id": meeting_id,
                    "is_final": true,
                    "meeting_date": archive.meeting_date,
                    "created_at": archive.created_at,
                    "full_text": archive.full_text,
                    "participants": archive.participant_data,
                    "transcript": archive.transcript_data,
                }),
                TranscriptView::Live(lines) => json!({
                    "meeting_id": meeting_id,
                    "is_final": false,
                    "transcript": lines,
                }),
            }
        }
        other => {
            return Err(ApiError::bad_request(format!(
                "Unknown view type '{}', expected info, transcriptions, participants or transcript",
                other
            )))
        }
    };

    Ok(Json(body))
}

/// POST /api/meetings/:id/finalize - Archive now, or retry a failed archive.
async fn finalize_meeting(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let meeting_id = meeting_id(&id)?;
    info!("Manual finalize requested for meeting {}", meeting_id);

    let aggregator = state.aggregator.clone();
    let event = CanonicalEvent::new(meeting_id, EventBody::MeetingEnded);
    let outcome = run_blocking(move || aggregator.apply(event)).await?;

    match outcome {
        ApplyOutcome::Applied(Notification::MeetingEnded {
            meeting_id,
            participant_count,
            transcript_line_count,
        }) => Ok(Json(json!({
            "success": true,
            "meeting_id": meeting_id,
            "participant_count": participant_count,
            "transcript_line_count": transcript_line_count,
        }))),
        other => Err(ApiError::internal(format!(
            "Unexpected finalize outcome: {:?}",
            other
        ))),
    }
}
