//! Startup configuration from the secrets file and environment

use crate::error::{CacheError, Result};
use crate::refresher::{NonSuccessPolicy, DEFAULT_REFRESH_INTERVAL, DEFAULT_UPSTREAM_TIMEOUT};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SECRETS_FILE: &str = "secrets.env";

#[derive(Clone)]
pub struct Config {
    pub upstream_url: String,
    pub upstream_token: String,
    pub port: u16,
    pub refresh_interval: Duration,
    pub upstream_timeout: Duration,
    pub non_success: NonSuccessPolicy,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("upstream_url", &self.upstream_url)
            .field("upstream_token", &"<redacted>")
            .field("port", &self.port)
            .field("refresh_interval", &self.refresh_interval)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("non_success", &self.non_success)
            .finish()
    }
}

impl Config {
    /// Load the secrets file into the environment, then read the environment.
    ///
    /// Variables already set in the process environment win over the file.
    pub fn from_env() -> Result<Self> {
        let secrets_file =
            std::env::var("SECRETS_FILE").unwrap_or_else(|_| DEFAULT_SECRETS_FILE.to_string());
        load_secrets_file(Path::new(&secrets_file));

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let upstream_url = required(&lookup, "FIGMA_API_URL")?;
        let upstream_token = required(&lookup, "FIGMA_API_TOKEN")?;

        let port = lookup("PORT")
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let refresh_interval = lookup("REFRESH_INTERVAL_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REFRESH_INTERVAL);

        let upstream_timeout = lookup("UPSTREAM_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT);

        let non_success = match lookup("CACHE_NON_SUCCESS").as_deref().map(str::trim) {
            Some("false") | Some("0") => NonSuccessPolicy::Keep,
            _ => NonSuccessPolicy::Cache,
        };

        Ok(Config {
            upstream_url,
            upstream_token,
            port,
            refresh_interval,
            upstream_timeout,
            non_success,
        })
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| CacheError::Config(format!("{} is not set", key)))
}

fn load_secrets_file(path: &Path) {
    match dotenv::from_path(path) {
        Ok(()) => info!(path = %path.display(), "Loaded secrets file"),
        Err(e) => warn!(
            path = %path.display(),
            error = %e,
            "Could not load secrets file, using process environment"
        ),
    }
}
