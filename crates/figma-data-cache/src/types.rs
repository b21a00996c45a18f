//! Core types for the Figma data cache

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The cached blob together with the time it was written
#[derive(Debug, Clone, Default)]
pub struct CacheSnapshot {
    pub body: Bytes,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Statistics about the cache cell
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub size_bytes: usize,
    pub last_updated: Option<DateTime<Utc>>,
    pub updates: u64,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub cache: CacheStats,
}
