use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};

use super::{enforce_rate_limit, finish};
use crate::error::ApiError;
use crate::metrics::REQUEST_TOTAL;
use crate::models::{VerifyPinRequest, VerifyPinResponse};
use crate::pin::verify_pin;
use crate::state::AppState;

// POST /api/verify-pin - constant-time gate in front of the upload flow.
// Rides the strictest rate limit policy; the verifier itself has no lockout.
pub async fn verify_pin_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<VerifyPinRequest>,
) -> Response {
    REQUEST_TOTAL.inc();

    let policy = state.policies.pin;
    let decision = match enforce_rate_limit(&state, &headers, policy) {
        Ok(decision) => decision,
        Err(denied) => return denied,
    };

    let result = check_pin(&state, payload);
    finish(result, &state, "verify-pin", policy, &decision)
}

fn check_pin(state: &AppState, payload: VerifyPinRequest) -> Result<Response, ApiError> {
    // configuration is checked before the pin so a broken deployment
    // fails closed with a 500 rather than a misleading 403
    let (Some(expected), Some(secret)) = (
        state.config.upload_pin.as_deref(),
        state.config.pin_secret.as_deref(),
    ) else {
        return Err(ApiError::Config(
            "UPLOAD_PIN or PIN_SECRET_KEY is not set".to_string(),
        ));
    };

    let Some(pin) = payload.pin else {
        return Err(ApiError::Validation("PIN is required".to_string()));
    };

    if !verify_pin(&pin, expected, secret) {
        state.logs.warn("Invalid PIN attempt");
        return Err(ApiError::InvalidPin);
    }

    state.logs.info("Successful PIN verification");
    Ok(Json(VerifyPinResponse { success: true }).into_response())
}
