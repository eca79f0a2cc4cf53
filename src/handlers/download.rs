use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};

use super::{enforce_rate_limit, finish, valid_object_key};
use crate::error::ApiError;
use crate::metrics::{PRESIGNED_URLS_TOTAL, REQUEST_TOTAL};
use crate::models::{DownloadQuery, PresignedUrlResponse};
use crate::state::AppState;

// GET /api/download?key= - mint a time-limited GET URL for an existing object
pub async fn download_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<DownloadQuery>,
) -> Response {
    REQUEST_TOTAL.inc();

    let policy = state.policies.download;
    let decision = match enforce_rate_limit(&state, &headers, policy) {
        Ok(decision) => decision,
        Err(denied) => return denied,
    };

    let result = issue_download_url(&state, query).await;
    finish(result, &state, "download", policy, &decision)
}

async fn issue_download_url(
    state: &AppState,
    query: DownloadQuery,
) -> Result<Response, ApiError> {
    let Some(key) = query.key else {
        return Err(ApiError::Validation("File key is required".to_string()));
    };

    // reject traversal attempts before the issuer ever sees the key
    if !valid_object_key(&state.upload_prefix, &key) {
        state
            .logs
            .warn(format!("Suspicious download attempt for key: {key}"));
        return Err(ApiError::Validation("Invalid file key".to_string()));
    }

    let store = state.store()?;
    let presigned_url = store.presign_get(&key).await?;

    PRESIGNED_URLS_TOTAL.inc();
    state.logs.info(format!("Generated download URL for {key}"));

    Ok(Json(PresignedUrlResponse { presigned_url }).into_response())
}
