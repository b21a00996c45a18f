//! HTTP server for the cached payload
//!
//! Provides /data and /health endpoints.

use crate::cache::CacheCell;
use crate::types::HealthResponse;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::header,
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Shared state for the HTTP server
pub struct ServerState {
    pub cache: Arc<CacheCell>,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(cache: Arc<CacheCell>) -> Self {
        Self {
            cache,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/data", get(get_data))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Bind to `port` on all interfaces and serve until `cancel` fires
pub async fn start_server(
    state: SharedState,
    port: u16,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("Starting HTTP server on {}", addr);

    serve(listener, state, cancel).await
}

/// Serve on an already bound listener until `cancel` fires
pub async fn serve(
    listener: TcpListener,
    state: SharedState,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    let router = create_router(state);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { cancel.cancelled().await })
    .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn log_request(request: Request, next: Next) -> Response {
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    info!(
        method = %request.method(),
        path = %request.uri().path(),
        remote = %remote,
        "Request"
    );

    next.run(request).await
}

/// Latest cached payload. Always 200, empty body before the first refresh.
async fn get_data(State(state): State<SharedState>) -> impl IntoResponse {
    let body = state.cache.read().await;
    ([(header::CONTENT_TYPE, "application/json")], body)
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let cache_stats = state.cache.stats().await;
    let uptime_secs = uptime_secs(state.started_at, Utc::now());

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs,
        cache: cache_stats,
    })
}

/// Whole seconds since `started_at`, zero if the clock stepped backwards
fn uptime_secs(started_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (now - started_at).num_seconds().max(0) as u64
}
