//! Background refresh loop
//!
//! Fetches the upstream payload, swaps it into the [`CacheCell`], then sleeps
//! for whatever the [`RefreshSchedule`] asks for. Fetch failures never
//! propagate: the previous blob stays in place and the next cycle retries.

use crate::cache::CacheCell;
use crate::error::Result;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Header carrying the upstream personal access token
pub const TOKEN_HEADER: &str = "X-Figma-Token";
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Status and fully read body of one upstream call
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Something the refresher can pull a payload from
pub trait UpstreamSource: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Result<UpstreamResponse>> + Send;
}

/// Fetches the payload over HTTP with the token header and a total timeout
pub struct HttpUpstream {
    client: Client,
    url: String,
    token: String,
}

impl HttpUpstream {
    pub fn new(
        url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            token: token.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl UpstreamSource for HttpUpstream {
    async fn fetch(&self) -> Result<UpstreamResponse> {
        debug!(url = %self.url, "Fetching upstream payload");

        let response = self
            .client
            .get(&self.url)
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %self.url, status = %status, "Upstream returned non-success status");
        }
        let body = response.bytes().await?;

        Ok(UpstreamResponse { status, body })
    }
}

/// What to do with a body that arrived with a non-2xx status.
///
/// `Cache` stores it like any other payload. Error bodies end up being
/// served from `/data`, which is the historical behavior of this service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NonSuccessPolicy {
    #[default]
    Cache,
    /// Leave the previous blob in place
    Keep,
}

/// Result of a single fetch cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Body was written to the cache
    Updated { status: StatusCode, bytes: usize },
    /// Non-2xx body discarded under [`NonSuccessPolicy::Keep`]
    Skipped { status: StatusCode },
    /// Request or body read failed; cache untouched
    Failed { error: String },
}

/// Decides how long to wait before the next cycle. `None` ends the loop.
pub trait RefreshSchedule: Send {
    fn next_delay(&mut self, outcome: &FetchOutcome) -> Option<Duration>;
}

/// Same delay after every cycle, forever
#[derive(Debug, Clone, Copy)]
pub struct FixedInterval {
    interval: Duration,
}

impl FixedInterval {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for FixedInterval {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_INTERVAL)
    }
}

impl RefreshSchedule for FixedInterval {
    fn next_delay(&mut self, _outcome: &FetchOutcome) -> Option<Duration> {
        Some(self.interval)
    }
}

/// Sole writer of the cache cell
pub struct Refresher<S> {
    source: S,
    cache: Arc<CacheCell>,
    non_success: NonSuccessPolicy,
}

impl<S: UpstreamSource> Refresher<S> {
    pub fn new(source: S, cache: Arc<CacheCell>) -> Self {
        Self {
            source,
            cache,
            non_success: NonSuccessPolicy::default(),
        }
    }

    pub fn with_non_success_policy(mut self, policy: NonSuccessPolicy) -> Self {
        self.non_success = policy;
        self
    }

    /// Run one fetch cycle and apply the result to the cache
    pub async fn refresh_once(&self) -> FetchOutcome {
        let response = match self.source.fetch().await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "Failed to fetch upstream payload, keeping cached copy");
                return FetchOutcome::Failed {
                    error: e.to_string(),
                };
            }
        };

        let status = response.status;
        if !status.is_success() {
            if self.non_success == NonSuccessPolicy::Keep {
                warn!(status = %status, "Keeping cached copy over non-success body");
                return FetchOutcome::Skipped { status };
            }
        }

        let bytes = response.body.len();
        self.cache.write(response.body).await;
        info!(status = %status, bytes, "Cache refreshed");

        FetchOutcome::Updated { status, bytes }
    }

    /// Refresh until the schedule gives up or `cancel` fires.
    ///
    /// Cancellation interrupts both an in-flight fetch and the sleep.
    pub async fn run<R: RefreshSchedule>(&self, mut schedule: R, cancel: CancellationToken) {
        info!("Refresher started");

        loop {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                outcome = self.refresh_once() => outcome,
            };

            let Some(delay) = schedule.next_delay(&outcome) else {
                info!("Refresh schedule finished");
                break;
            };

            debug!(?delay, "Sleeping until next refresh");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!("Refresher stopped");
    }
}
