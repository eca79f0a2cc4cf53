use lazy_static::lazy_static;
use prometheus::{Counter, Histogram, register_counter, register_histogram};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("gallery_requests_total", "Total number of API requests").unwrap();
    pub static ref RATE_LIMITED_TOTAL: Counter = register_counter!(
        "gallery_rate_limited_total",
        "Requests rejected by the rate limiter"
    )
    .unwrap();
    pub static ref PRESIGNED_URLS_TOTAL: Counter = register_counter!(
        "gallery_presigned_urls_total",
        "Presigned URLs issued (uploads, downloads and listings)"
    )
    .unwrap();
    pub static ref OBJECTS_DELETED_TOTAL: Counter = register_counter!(
        "gallery_objects_deleted_total",
        "Objects confirmed deleted by the storage backend"
    )
    .unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "gallery_request_latency_seconds",
        "Request latency in seconds"
    )
    .unwrap();
}
