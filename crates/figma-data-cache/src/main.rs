//! Figma Data Cache - read-through cache for a single Figma API payload
//!
//! A background task refreshes the payload on a fixed interval and the
//! HTTP server hands out whatever copy is current.

use figma_data_cache::{
    start_server, CacheCell, Config, FixedInterval, HttpUpstream, Refresher, Result, ServerState,
    SharedState,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter =
        EnvFilter::from_default_env().add_directive("figma_data_cache=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting Figma Data Cache...");

    // Missing upstream settings stop the process before the port is bound
    let config = Config::from_env().inspect_err(|e| error!("{}", e))?;
    info!("Port: {}", config.port);
    info!("Refresh interval: {:?}", config.refresh_interval);
    info!("Upstream timeout: {:?}", config.upstream_timeout);
    info!("Non-success policy: {:?}", config.non_success);

    let cache = Arc::new(CacheCell::new());
    let upstream = HttpUpstream::new(
        config.upstream_url.as_str(),
        config.upstream_token.as_str(),
        config.upstream_timeout,
    )?;
    info!("Upstream: {}", upstream.url());
    let refresher =
        Refresher::new(upstream, cache.clone()).with_non_success_policy(config.non_success);

    let cancel = CancellationToken::new();

    // Spawn refresher
    let refresher_cancel = cancel.clone();
    let schedule = FixedInterval::new(config.refresh_interval);
    let refresher_task = tokio::spawn(async move {
        refresher.run(schedule, refresher_cancel).await;
    });

    // Cancel everything on Ctrl-C
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                signal_cancel.cancel();
            }
            Err(e) => warn!("Failed to listen for shutdown signal: {}", e),
        }
    });

    // Start HTTP server (blocking)
    let state: SharedState = Arc::new(ServerState::new(cache));
    let served = start_server(state, config.port, cancel.clone()).await;

    cancel.cancel();
    if let Err(e) = refresher_task.await {
        error!("Refresher task failed: {}", e);
    }

    served?;
    Ok(())
}
