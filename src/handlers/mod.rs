mod download;
mod health;
mod images;
mod logs;
mod metrics;
mod upload;
mod verify_pin;

pub use download::download_handler;
pub use health::health_handler;
pub use images::{delete_images_handler, list_images_handler};
pub use logs::{clear_logs_handler, get_logs_handler};
pub use metrics::metrics_handler;
pub use upload::upload_handler;
pub use verify_pin::verify_pin_handler;

use axum::Json;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::metrics::RATE_LIMITED_TOTAL;
use crate::rate_limit::{RateLimitDecision, RateLimitPolicy, client_identity};
use crate::state::AppState;

// The three headers are present on every response from a rate limited
// endpoint, allowed or denied
pub(crate) fn apply_rate_limit_headers(
    response: &mut Response,
    policy: RateLimitPolicy,
    decision: &RateLimitDecision,
) {
    let headers = response.headers_mut();
    headers.insert(
        HeaderName::from_static("x-ratelimit-limit"),
        HeaderValue::from(policy.max_requests),
    );
    headers.insert(
        HeaderName::from_static("x-ratelimit-remaining"),
        HeaderValue::from(decision.remaining),
    );
    headers.insert(
        HeaderName::from_static("x-ratelimit-reset"),
        HeaderValue::from(decision.reset_at_ms),
    );
}

// Shared guard: count the request against the endpoint's policy, then either
// hand the decision back or return a 429 that still carries the headers
pub(crate) fn enforce_rate_limit(
    state: &AppState,
    request_headers: &HeaderMap,
    policy: RateLimitPolicy,
) -> Result<RateLimitDecision, Response> {
    let identity = client_identity(request_headers);
    let decision = state.limiter.check(&identity, policy);
    if decision.allowed {
        return Ok(decision);
    }

    RATE_LIMITED_TOTAL.inc();
    state
        .logs
        .warn(format!("Rate limit exceeded for IP: {identity}"));

    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(serde_json::json!({ "error": "Rate limit exceeded" })),
    )
        .into_response();
    apply_rate_limit_headers(&mut response, policy, &decision);
    Err(response)
}

// Turn the endpoint outcome into a response with rate limit headers
// attached, logging server-side failures with their detail on the way out
pub(crate) fn finish(
    result: Result<Response, ApiError>,
    state: &AppState,
    route: &str,
    policy: RateLimitPolicy,
    decision: &RateLimitDecision,
) -> Response {
    let mut response = match result {
        Ok(response) => response,
        Err(err) => {
            match &err {
                ApiError::Config(detail) => state
                    .logs
                    .error(format!("Configuration error in {route} route: {detail}")),
                ApiError::Storage(detail) => {
                    state.logs.error(format!("Error in {route} route: {detail}"));
                }
                ApiError::Validation(_) | ApiError::InvalidPin => {}
            }
            err.into_response()
        }
    };
    apply_rate_limit_headers(&mut response, policy, decision);
    response
}

/// Keys handed to the download and delete paths must live under the upload
/// prefix and must not climb out of it.
pub(crate) fn valid_object_key(prefix: &str, key: &str) -> bool {
    key.starts_with(prefix) && !key.contains("..")
}
