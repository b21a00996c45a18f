//! Single-blob cache cell shared between the refresher and the HTTP server

use crate::types::{CacheSnapshot, CacheStats};
use bytes::Bytes;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

/// Holds the latest upstream payload.
///
/// Starts empty. Every write replaces the blob wholesale under the write
/// lock, so a reader sees either the previous or the next blob, never a mix.
#[derive(Debug, Default)]
pub struct CacheCell {
    slot: RwLock<Slot>,
}

#[derive(Debug, Default)]
struct Slot {
    snapshot: CacheSnapshot,
    updates: u64,
}

impl CacheCell {
    /// Create an empty cache cell
    pub fn new() -> Self {
        Self::default()
    }

    /// Current blob. Empty until the first write.
    pub async fn read(&self) -> Bytes {
        self.slot.read().await.snapshot.body.clone()
    }

    /// Current blob and its write time, read under a single lock
    pub async fn snapshot(&self) -> CacheSnapshot {
        self.slot.read().await.snapshot.clone()
    }

    /// Replace the blob
    pub async fn write(&self, body: Bytes) {
        let size = body.len();
        let mut slot = self.slot.write().await;
        slot.snapshot = CacheSnapshot {
            body,
            last_updated: Some(Utc::now()),
        };
        slot.updates += 1;
        debug!(size, updates = slot.updates, "Cache cell replaced");
    }

    pub async fn stats(&self) -> CacheStats {
        let slot = self.slot.read().await;
        CacheStats {
            size_bytes: slot.snapshot.body.len(),
            last_updated: slot.snapshot.last_updated,
            updates: slot.updates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_new_cell_is_empty() {
        let cell = CacheCell::new();
        assert!(cell.read().await.is_empty());

        let snapshot = cell.snapshot().await;
        assert!(snapshot.body.is_empty());
        assert!(snapshot.last_updated.is_none());
    }

    #[tokio::test]
    async fn test_write_replaces_blob() {
        let cell = CacheCell::new();
        cell.write(Bytes::from_static(br#"{"a":1}"#)).await;
        cell.write(Bytes::from_static(br#"{"b":2}"#)).await;

        assert_eq!(cell.read().await, Bytes::from_static(br#"{"b":2}"#));
        assert!(cell.snapshot().await.last_updated.is_some());
    }

    #[tokio::test]
    async fn test_reads_without_write_are_identical() {
        let cell = CacheCell::new();
        cell.write(Bytes::from_static(br#"{"a":1}"#)).await;

        let first = cell.read().await;
        let second = cell.read().await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_stats_track_writes() {
        let cell = CacheCell::new();
        let stats = cell.stats().await;
        assert_eq!(stats.updates, 0);
        assert_eq!(stats.size_bytes, 0);

        cell.write(Bytes::from_static(b"12345")).await;
        cell.write(Bytes::from_static(b"123")).await;

        let stats = cell.stats().await;
        assert_eq!(stats.updates, 2);
        assert_eq!(stats.size_bytes, 3);
        assert!(stats.last_updated.is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reads_never_observe_torn_blob() {
        let small = Bytes::from(vec![b'a'; 4096]);
        let large = Bytes::from(vec![b'b'; 16384]);

        let cell = Arc::new(CacheCell::new());
        cell.write(small.clone()).await;

        let writer = {
            let cell = cell.clone();
            let (small, large) = (small.clone(), large.clone());
            tokio::spawn(async move {
                for i in 0..500 {
                    let next = if i % 2 == 0 { large.clone() } else { small.clone() };
                    cell.write(next).await;
                    tokio::task::yield_now().await;
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cell = cell.clone();
                let (small, large) = (small.clone(), large.clone());
                tokio::spawn(async move {
                    for _ in 0..500 {
                        let seen = cell.read().await;
                        assert!(seen == small || seen == large, "torn read");
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        writer.await.unwrap();
        for reader in readers {
            reader.await.unwrap();
        }
        assert_eq!(cell.stats().await.updates, 501);
    }
}
