use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};

use super::{enforce_rate_limit, finish};
use crate::error::ApiError;
use crate::metrics::{PRESIGNED_URLS_TOTAL, REQUEST_TOTAL};
use crate::models::{PresignedUrlResponse, UploadRequest};
use crate::state::AppState;

// POST /api/upload - mint a time-limited PUT URL for a new object
pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<UploadRequest>,
) -> Response {
    REQUEST_TOTAL.inc();

    let policy = state.policies.upload;
    let decision = match enforce_rate_limit(&state, &headers, policy) {
        Ok(decision) => decision,
        Err(denied) => return denied,
    };

    let result = issue_upload_url(&state, payload).await;
    finish(result, &state, "upload", policy, &decision)
}

async fn issue_upload_url(
    state: &AppState,
    payload: UploadRequest,
) -> Result<Response, ApiError> {
    let (Some(file_name), Some(file_type)) = (payload.file_name, payload.file_type) else {
        return Err(ApiError::Validation(
            "fileName and fileType are required".to_string(),
        ));
    };

    let store = state.store()?;
    let presigned_url = store.presign_put(&file_name, &file_type).await?;

    PRESIGNED_URLS_TOTAL.inc();
    state
        .logs
        .info(format!("Generated presigned URL for {file_name}"));

    Ok(Json(PresignedUrlResponse { presigned_url }).into_response())
}
