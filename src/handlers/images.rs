use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};

use super::{enforce_rate_limit, finish, valid_object_key};
use crate::error::ApiError;
use crate::metrics::{OBJECTS_DELETED_TOTAL, PRESIGNED_URLS_TOTAL, REQUEST_LATENCY, REQUEST_TOTAL};
use crate::models::{
    DeleteErrorItem, DeleteImagesRequest, DeleteImagesResponse, ImageItem, ListImagesResponse,
    ListQuery,
};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i32 = 20;
const MAX_PAGE_SIZE: i32 = 1000;

// GET /api/images - one backend listing call plus one local signing call
// per returned object
pub async fn list_images_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response {
    REQUEST_TOTAL.inc();

    let policy = state.policies.api;
    let decision = match enforce_rate_limit(&state, &headers, policy) {
        Ok(decision) => decision,
        Err(denied) => return denied,
    };

    let start_time = Instant::now();
    let result = list_images(&state, query).await;
    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());

    finish(result, &state, "images", policy, &decision)
}

async fn list_images(state: &AppState, query: ListQuery) -> Result<Response, ApiError> {
    let store = state.store()?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let page = store
        .list(
            &state.upload_prefix,
            query.continuation_token.as_deref(),
            limit,
        )
        .await?;

    // fresh URL per object, never cached; backend order is preserved
    let mut items = Vec::with_capacity(page.objects.len());
    for object in &page.objects {
        let url = store.presign_get(&object.key).await?;
        PRESIGNED_URLS_TOTAL.inc();
        items.push(ImageItem {
            key: object.key.clone(),
            url,
            last_modified: object.last_modified.to_rfc3339(),
            size: object.size_bytes,
        });
    }

    Ok(Json(ListImagesResponse {
        items,
        next_continuation_token: page.next_continuation_token,
        is_truncated: page.is_truncated,
    })
    .into_response())
}

// DELETE /api/images - single batched delete; partial failure is reported,
// not raised
pub async fn delete_images_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<DeleteImagesRequest>,
) -> Response {
    REQUEST_TOTAL.inc();

    let policy = state.policies.api;
    let decision = match enforce_rate_limit(&state, &headers, policy) {
        Ok(decision) => decision,
        Err(denied) => return denied,
    };

    let result = delete_images(&state, payload).await;
    finish(result, &state, "images", policy, &decision)
}

async fn delete_images(
    state: &AppState,
    payload: DeleteImagesRequest,
) -> Result<Response, ApiError> {
    state.logs.info("Starting delete operation");

    // fail fast, no backend call
    if payload.keys.is_empty() {
        state.logs.warn("No keys provided for deletion");
        let body = DeleteImagesResponse {
            success: false,
            deleted: 0,
            errors: vec![],
            message: Some("No keys provided".to_string()),
        };
        return Ok((axum::http::StatusCode::BAD_REQUEST, Json(body)).into_response());
    }

    for key in &payload.keys {
        if !valid_object_key(&state.upload_prefix, key) {
            state
                .logs
                .warn(format!("Suspicious delete attempt for key: {key}"));
            return Err(ApiError::Validation("Invalid file key".to_string()));
        }
    }

    // configuration is checked before the batch call so the failure message
    // is actionable instead of whatever the backend surfaces
    let store = state.store()?;

    state
        .logs
        .info(format!("Attempting to delete {} objects", payload.keys.len()));
    let outcome = store.delete_many(&payload.keys).await?;

    OBJECTS_DELETED_TOTAL.inc_by(outcome.deleted as f64);
    if outcome.errors.is_empty() {
        state
            .logs
            .info(format!("Successfully deleted {} objects", outcome.deleted));
    } else {
        state.logs.warn(format!(
            "Delete operation completed with {} errors",
            outcome.errors.len()
        ));
        for error in &outcome.errors {
            state
                .logs
                .warn(format!("Failed to delete {}: {}", error.key, error.code));
        }
    }

    let body = DeleteImagesResponse {
        success: outcome.errors.is_empty(),
        deleted: outcome.deleted,
        errors: outcome
            .errors
            .into_iter()
            .map(|error| DeleteErrorItem {
                key: error.key,
                code: error.code,
                message: error.message,
            })
            .collect(),
        message: None,
    };
    Ok(Json(body).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::state_with_store;
    use crate::storage::MemoryStore;
    use axum::body::to_bytes;
    use axum::http::StatusCode;

    const KEYS: [&str; 5] = [
        "uploads/a.png",
        "uploads/b.png",
        "uploads/c.png",
        "uploads/d.png",
        "uploads/e.png",
    ];

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn list_query(token: Option<&str>, limit: Option<i32>) -> Query<ListQuery> {
        Query(ListQuery {
            continuation_token: token.map(str::to_string),
            limit,
        })
    }

    #[tokio::test]
    async fn listing_pages_through_five_objects_in_twos() {
        let state = Arc::new(state_with_store(Some(Arc::new(MemoryStore::with_keys(
            &KEYS,
        )))));

        let response = list_images_handler(
            State(state.clone()),
            HeaderMap::new(),
            list_query(None, Some(2)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let first = body_json(response).await;
        assert_eq!(first["items"].as_array().unwrap().len(), 2);
        assert_eq!(first["isTruncated"], true);
        let token = first["nextContinuationToken"].as_str().unwrap().to_string();

        // each item carries a fresh get URL
        assert!(
            first["items"][0]["url"]
                .as_str()
                .unwrap()
                .contains("op=get")
        );

        let response = list_images_handler(
            State(state.clone()),
            HeaderMap::new(),
            list_query(Some(&token), Some(2)),
        )
        .await;
        let second = body_json(response).await;
        let token = second["nextContinuationToken"].as_str().unwrap().to_string();

        let response = list_images_handler(
            State(state),
            HeaderMap::new(),
            list_query(Some(&token), Some(2)),
        )
        .await;
        let third = body_json(response).await;
        assert_eq!(third["items"].as_array().unwrap().len(), 1);
        assert_eq!(third["isTruncated"], false);
        assert!(third["nextContinuationToken"].is_null());
    }

    #[tokio::test]
    async fn listing_without_storage_config_is_a_500() {
        let state = Arc::new(state_with_store(None));
        let response =
            list_images_handler(State(state), HeaderMap::new(), list_query(None, None)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn deleting_nothing_fails_fast() {
        let state = Arc::new(state_with_store(Some(Arc::new(MemoryStore::with_keys(
            &KEYS,
        )))));
        let response = delete_images_handler(
            State(state),
            HeaderMap::new(),
            Json(DeleteImagesRequest { keys: vec![] }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["deleted"], 0);
    }

    #[tokio::test]
    async fn partial_failure_reports_counts_and_errors_separately() {
        let store = Arc::new(MemoryStore::with_keys(&["uploads/a.png"]));
        let state = Arc::new(state_with_store(Some(store)));

        let response = delete_images_handler(
            State(state),
            HeaderMap::new(),
            Json(DeleteImagesRequest {
                keys: vec![
                    "uploads/a.png".to_string(),
                    "uploads/missing.png".to_string(),
                ],
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["deleted"], 1);
        let errors = body["errors"].as_array().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0]["key"], "uploads/missing.png");
        assert_eq!(errors[0]["code"], "NoSuchKey");
    }

    #[tokio::test]
    async fn full_success_reports_success_true() {
        let store = Arc::new(MemoryStore::with_keys(&["uploads/a.png", "uploads/b.png"]));
        let state = Arc::new(state_with_store(Some(store)));

        let response = delete_images_handler(
            State(state),
            HeaderMap::new(),
            Json(DeleteImagesRequest {
                keys: vec!["uploads/a.png".to_string(), "uploads/b.png".to_string()],
            }),
        )
        .await;
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["deleted"], 2);
        assert!(body["errors"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn traversal_keys_cannot_be_deleted() {
        let state = Arc::new(state_with_store(Some(Arc::new(MemoryStore::with_keys(
            &KEYS,
        )))));
        let response = delete_images_handler(
            State(state),
            HeaderMap::new(),
            Json(DeleteImagesRequest {
                keys: vec!["uploads/../etc/passwd".to_string()],
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
