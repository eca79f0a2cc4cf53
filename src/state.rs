use std::sync::Arc;

use crate::config::Config;
use crate::error::ApiError;
use crate::logs::LogBuffer;
use crate::rate_limit::{RateLimitPolicy, RateLimiter};
use crate::storage::ObjectStore;

// One policy per endpoint group; see config.rs for the observed quotas
#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicies {
    pub api: RateLimitPolicy,
    pub upload: RateLimitPolicy,
    pub download: RateLimitPolicy,
    pub pin: RateLimitPolicy,
}

// App's shared state
pub struct AppState {
    // None when the storage configuration is incomplete; storage endpoints
    // then answer 500 at call time
    pub store: Option<Arc<dyn ObjectStore>>,
    pub limiter: RateLimiter,
    pub logs: LogBuffer,
    pub config: Config,
    pub policies: RateLimitPolicies,
    pub upload_prefix: String,
}

impl AppState {
    pub fn store(&self) -> Result<&Arc<dyn ObjectStore>, ApiError> {
        self.store.as_ref().ok_or_else(|| {
            ApiError::Config("S3_BUCKET_NAME or AWS_REGION is not set".to_string())
        })
    }
}
