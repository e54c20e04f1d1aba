//! API route modules.

pub mod ingest;
pub mod meetings;
pub mod stream;
pub mod transcripts;

use crate::api::error::{ApiError, ApiResult};
use crate::events::MeetingId;
use crate::session::SessionError;

/// Run store work off the async runtime.
pub(crate) async fn run_blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> Result<T, SessionError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::internal(format!("Store task failed: {}", e)))?
        .map_err(ApiError::from)
}

pub(crate) fn meeting_id(raw: &str) -> ApiResult<MeetingId> {
    MeetingId::parse(raw).ok_or_else(|| ApiError::bad_request("Meeting id must not be blank"))
}
