mod config;
mod error;
mod handlers;
mod logs;
mod metrics;
mod models;
mod pin;
mod rate_limit;
mod state;
mod storage;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use axum::routing::post;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::{Args, Config};
use crate::logs::LogBuffer;
use crate::rate_limit::{RateLimitPolicy, RateLimiter};
use crate::state::{AppState, RateLimitPolicies};
use crate::storage::{ObjectStore, S3Store};

#[tokio::main]
async fn main() {
    // parse cli arguments, secrets come from the environment
    let args = Args::parse();
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let window_ms = (args.rate_window as i64) * 1000;
    let policies = RateLimitPolicies {
        api: RateLimitPolicy {
            max_requests: args.api_limit,
            window_ms,
        },
        upload: RateLimitPolicy {
            max_requests: args.upload_limit,
            window_ms,
        },
        download: RateLimitPolicy {
            max_requests: args.download_limit,
            window_ms,
        },
        pin: RateLimitPolicy {
            max_requests: args.pin_limit,
            window_ms,
        },
    };

    // build the S3 client up front when storage is configured; without it
    // the storage endpoints answer 500 at call time
    let store: Option<Arc<dyn ObjectStore>> = match (&config.region, &config.bucket) {
        (Some(region), Some(bucket)) => {
            Some(Arc::new(S3Store::connect(region.clone(), bucket.clone()).await))
        }
        _ => {
            tracing::warn!("AWS_REGION or S3_BUCKET_NAME not set, storage endpoints will fail");
            None
        }
    };

    // creating shared state
    let state = Arc::new(AppState {
        store,
        limiter: RateLimiter::new(),
        logs: LogBuffer::new(),
        config,
        policies,
        upload_prefix: args.upload_prefix.clone(),
    });

    // creating the router with routes
    let app = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/api/upload", post(handlers::upload_handler))
        .route("/api/download", get(handlers::download_handler))
        .route("/api/verify-pin", post(handlers::verify_pin_handler))
        .route(
            "/api/images",
            get(handlers::list_images_handler).delete(handlers::delete_images_handler),
        )
        .route(
            "/api/logs",
            get(handlers::get_logs_handler).delete(handlers::clear_logs_handler),
        )
        .with_state(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();

    println!("Gallery gateway running on http://localhost:{}", args.port);
    println!(
        "Rate limits per {} seconds: api={} upload={} download={} pin={}",
        args.rate_window, args.api_limit, args.upload_limit, args.download_limit, args.pin_limit
    );
    axum::serve(listener, app).await.unwrap();
}
