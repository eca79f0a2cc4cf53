use axum::http::HeaderMap;
use chrono::Utc;
use dashmap::DashMap;

// Limit + window pair; each endpoint group gets its own policy
#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window_ms: i64,
}

// Rate limit entry - tracks requests per client identity
#[derive(Debug)]
pub struct RateLimitEntry {
    pub count: u32,
    pub reset_at_ms: i64,
}

// What a single check observed; reported back in the response headers
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at_ms: i64,
}

/// Fixed-window request counter keyed by client identity.
///
/// Entries are replaced lazily the next time an identity shows up after its
/// window expired; there is no background eviction, so the table grows by one
/// entry per distinct identity until restart. Stale entries are inert.
pub struct RateLimiter {
    entries: DashMap<String, RateLimitEntry>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Count this request against `identity` and report whether it fits in
    /// the current window. The counter increments even when the request is
    /// denied, so every request in a denied burst sees `remaining = 0` and
    /// the same reset time until the window rolls over.
    pub fn check(&self, identity: &str, policy: RateLimitPolicy) -> RateLimitDecision {
        self.check_at(identity, policy, Utc::now().timestamp_millis())
    }

    fn check_at(&self, identity: &str, policy: RateLimitPolicy, now_ms: i64) -> RateLimitDecision {
        // entry() holds the shard lock across the whole read-check-increment,
        // so two concurrent requests cannot both claim the last slot
        let mut entry = self
            .entries
            .entry(identity.to_string())
            .or_insert(RateLimitEntry {
                count: 0,
                reset_at_ms: now_ms + policy.window_ms,
            });

        // window expired? start a fresh one
        if now_ms > entry.reset_at_ms {
            entry.count = 0;
            entry.reset_at_ms = now_ms + policy.window_ms;
        }

        entry.count += 1;

        RateLimitDecision {
            allowed: entry.count <= policy.max_requests,
            remaining: policy.max_requests.saturating_sub(entry.count),
            reset_at_ms: entry.reset_at_ms,
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// First hop of the comma-separated `x-forwarded-for` chain, trimmed.
/// Falls back to a shared "unknown" bucket when the header is absent, so
/// all unidentifiable clients count against the same quota.
pub fn client_identity(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
