//! Final archive endpoints.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{meeting_id, run_blocking};
use crate::api::error::ApiResult;
use crate::api::AppState;
use crate::db::{ArchiveSummary, FinalArchive};

const DEFAULT_LIMIT: usize = 50;

/// Query parameters for archive listing.
#[derive(Debug, Deserialize, Default)]
pub struct ArchiveQueryParams {
    /// Substring matched against the archived text
    pub q: Option<String>,
    /// Maximum results (default 50)
    pub limit: Option<usize>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/transcripts", get(list_archives))
        .route(
            "/api/transcripts/:id",
            get(get_archive).delete(delete_archive),
        )
        .with_state(state)
}

/// GET /api/transcripts - List archived meetings, newest first.
async fn list_archives(
    State(state): State<AppState>,
    Query(params): Query<ArchiveQueryParams>,
) -> ApiResult<Json<Vec<ArchiveSummary>>> {
    let queries = state.queries.clone();
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    let archives = run_blocking(move || queries.list_archives(params.q.as_deref(), limit)).await?;
    Ok(Json(archives))
}

/// GET /api/transcripts/:id - Final archive of one meeting.
async fn get_archive(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<FinalArchive>> {
    let meeting_id = meeting_id(&id)?;
    let queries = state.queries.clone();
    let archive = run_blocking(move || queries.final_transcript(&meeting_id)).await?;
    Ok(Json(archive))
}

/// DELETE /api/transcripts/:id - Remove an archive, keeping live rows.
async fn delete_archive(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let meeting_id = meeting_id(&id)?;
    let queries = state.queries.clone();
    let deleted = meeting_id.to_string();
    run_blocking(move || queries.delete_archive(&meeting_id)).await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Archive for meeting {} deleted", deleted),
    })))
}
