use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;

use crate::state::AppState;

// GET /api/logs - snapshot of the in-process log buffer, most recent first
pub async fn get_logs_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({ "logs": state.logs.snapshot() }))
}

// DELETE /api/logs - explicit reset
pub async fn clear_logs_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.logs.clear();
    Json(serde_json::json!({ "message": "Logs cleared" }))
}
